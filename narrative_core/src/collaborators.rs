//! Collaborator ports - the external services the engine depends on.
//!
//! Implementations live outside this crate (LLM clients, image services,
//! databases). Every call is bounded by a timeout in the orchestrator, and a
//! failure is recovered from locally.

use async_trait::async_trait;
use game_rules::{
    ExtractedFacts, MapAssignment, MapElements, MissingField, PlayerId, Profile, Stage,
    UsedElements,
};
use serde::{Deserialize, Serialize};

use crate::context_assembler::{SessionContext, StageContext};
use crate::error::CollaboratorError;
use crate::history::HistoryRecord;

/// Finds profile facts in a player message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InfoExtractor: Send + Sync {
    /// Returns the facts found in `message`; an empty mapping when there are none.
    async fn extract(
        &self,
        message: &str,
        context: &StageContext,
    ) -> Result<ExtractedFacts, CollaboratorError>;
}

/// Writes everything the NPC says.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DialogueGenerator: Send + Sync {
    /// Free dialogue reply to a player message.
    async fn reply(&self, message: &str, context: &SessionContext) -> Result<String, CollaboratorError>;

    /// Narration opening a newly entered stage on its assigned map.
    async fn intro_narration(
        &self,
        context: &StageContext,
        map: &MapAssignment,
    ) -> Result<String, CollaboratorError>;

    /// Narration closing the journey after the boss stage.
    async fn closing_narration(&self, context: &SessionContext) -> Result<String, CollaboratorError>;

    /// A question steering the player towards the first missing items.
    async fn collection_question(
        &self,
        context: &SessionContext,
        missing: &[MissingField],
    ) -> Result<String, CollaboratorError>;
}

/// Recommends personalized maps.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MapProvider: Send + Sync {
    /// Should avoid the ids listed in the request.
    async fn recommend(&self, request: &MapRequest) -> Result<MapAssignment, CollaboratorError>;
}

/// Durable per-player history, used only to enrich context.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, player_id: &PlayerId, record: HistoryRecord) -> Result<(), CollaboratorError>;

    /// The newest `limit` records, oldest first.
    async fn recent(&self, player_id: &PlayerId, limit: usize) -> Result<Vec<HistoryRecord>, CollaboratorError>;

    async fn clear(&self, player_id: &PlayerId) -> Result<(), CollaboratorError>;
}

/// Input for a map recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRequest {
    pub player_id: PlayerId,
    pub stage: Stage,
    pub profile: Profile,
    pub used_elements: UsedElements,

    /// Profile facts the map should feature.
    pub focus: MapElements,

    /// Map ids that have already been assigned.
    pub excluded_map_ids: Vec<String>,
}
