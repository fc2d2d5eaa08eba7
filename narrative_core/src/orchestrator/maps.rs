//! Map assignment on stage entry.

use game_rules::{MapAssignment, Session};
use std::time::Duration;

use super::bounded;
use crate::collaborators::{MapProvider, MapRequest};

/// Ask the provider for the current stage's map and make it the session's map.
///
/// A duplicate id is retried once; if the provider repeats itself, the
/// duplicate is accepted. Returns `None` when no map could be obtained, in
/// which case the previous map stays current.
pub(super) async fn assign_map(
    provider: &dyn MapProvider,
    limit: Duration,
    session: &mut Session,
) -> Option<MapAssignment> {
    let focus = session.used_elements.select_for_map(&session.profile);
    let request = MapRequest {
        player_id: session.player_id.clone(),
        stage: session.current_stage,
        profile: session.profile.clone(),
        used_elements: session.used_elements.clone(),
        focus,
        excluded_map_ids: session.used_elements.map_ids.clone(),
    };

    let map = match bounded("map recommendation", limit, provider.recommend(&request)).await {
        Ok(map) if session.used_elements.contains_map(&map.id) => {
            tracing::warn!(
                player_id = %session.player_id,
                map_id = %map.id,
                "Provider returned a used map, asking once more"
            );
            match bounded("map recommendation", limit, provider.recommend(&request)).await {
                Ok(retry) => retry,
                Err(e) => {
                    tracing::warn!(player_id = %session.player_id, error = %e, "Map retry failed, keeping duplicate");
                    map
                }
            }
        }
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(
                player_id = %session.player_id,
                stage = session.current_stage.number(),
                error = %e,
                "Map recommendation failed, keeping previous map"
            );
            return None;
        }
    };

    tracing::debug!(player_id = %session.player_id, map_id = %map.id, "Map assigned");
    session.assign_map(map.clone());
    Some(map)
}
