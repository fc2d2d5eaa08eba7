//! Session - one player's complete game state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::{ConversationEntry, PlayerId, Profile, UsedElements};
use crate::mechanics::{SessionPhase, Stage, StageController};

/// A map assigned to a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapAssignment {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Where the map's image is stored.
    pub image_ref: String,
    /// Why this map suits the player.
    pub reasoning: String,
}

/// The complete state of one player's journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub player_id: PlayerId,
    pub current_stage: Stage,
    pub profile: Profile,

    /// Append-only dialogue log.
    pub conversation_history: Vec<ConversationEntry>,

    pub current_map: Option<MapAssignment>,

    /// The goal the final battle is built around, fixed on entering the boss stage.
    pub boss_goal: Option<String>,

    /// Set by the combat system; cleared on every stage advance.
    pub monster_defeated: bool,

    pub game_completed: bool,
    pub used_elements: UsedElements,

    /// Stage → whether it has been completed.
    pub stage_advance_flags: BTreeMap<Stage, bool>,
}

impl Session {
    /// Start a fresh journey at the tutorial.
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            current_stage: Stage::Tutorial,
            profile: Profile::new(),
            conversation_history: Vec::new(),
            current_map: None,
            boss_goal: None,
            monster_defeated: false,
            game_completed: false,
            used_elements: UsedElements::new(),
            stage_advance_flags: Stage::ALL.into_iter().map(|stage| (stage, false)).collect(),
        }
    }

    pub fn add_conversation(&mut self, entry: ConversationEntry) {
        self.conversation_history.push(entry);
    }

    /// The last `limit` log entries, oldest first.
    pub fn recent_conversation(&self, limit: usize) -> &[ConversationEntry] {
        let start = self.conversation_history.len().saturating_sub(limit);
        &self.conversation_history[start..]
    }

    /// Move to the next stage.
    ///
    /// Marks the current stage as completed and clears the monster signal.
    /// Returns the new stage, or `None` at the boss stage, where nothing changes.
    pub fn advance_stage(&mut self) -> Option<Stage> {
        let next = self.current_stage.next()?;
        self.stage_advance_flags.insert(self.current_stage, true);
        self.current_stage = next;
        self.monster_defeated = false;
        if next == Stage::Boss && !self.profile.life_goal.is_empty() {
            self.boss_goal = Some(self.profile.life_goal.clone());
        }
        Some(next)
    }

    /// Finish the journey after the boss stage.
    pub fn complete_game(&mut self) {
        self.stage_advance_flags.insert(self.current_stage, true);
        self.game_completed = true;
    }

    /// Make a map the current one and remember it as used.
    pub fn assign_map(&mut self, map: MapAssignment) {
        self.used_elements.record_map(map.id.clone());
        self.current_map = Some(map);
    }

    pub fn record_monster_defeated(&mut self) {
        self.monster_defeated = true;
    }

    pub fn is_stage_completed(&self, stage: Stage) -> bool {
        self.stage_advance_flags.get(&stage).copied().unwrap_or(false)
    }

    /// Summarize the session for presentation.
    pub fn status(&self) -> StatusSummary {
        StatusSummary {
            player_id: self.player_id.clone(),
            stage: self.current_stage,
            stage_name: self.current_stage.name().to_string(),
            phase: StageController::phase(self),
            profile: self.profile.clone(),
            current_map: self.current_map.as_ref().map(|map| map.name.clone()),
            boss_goal: self.boss_goal.clone(),
            monster_defeated: self.monster_defeated,
            game_completed: self.game_completed,
            conversation_count: self.conversation_history.len(),
            missing_fields: StageController::missing_fields(self)
                .iter()
                .map(|missing| missing.identifier())
                .collect(),
        }
    }
}

/// Read-only view of a session for status queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub player_id: PlayerId,
    pub stage: Stage,
    pub stage_name: String,
    pub phase: SessionPhase,
    pub profile: Profile,
    pub current_map: Option<String>,
    pub boss_goal: Option<String>,
    pub monster_defeated: bool,
    pub game_completed: bool,
    pub conversation_count: usize,
    pub missing_fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(id: &str) -> MapAssignment {
        MapAssignment {
            id: id.into(),
            name: format!("{id} map"),
            description: "somewhere".into(),
            image_ref: format!("maps/{id}.png"),
            reasoning: "it fits".into(),
        }
    }

    #[test]
    fn test_new_session() {
        let session = Session::new(PlayerId::new("p1"));
        assert_eq!(session.current_stage, Stage::Tutorial);
        assert!(!session.monster_defeated);
        assert!(!session.game_completed);
        assert_eq!(session.stage_advance_flags.len(), 8);
        assert!(session.stage_advance_flags.values().all(|done| !done));
        assert!(session.used_elements.is_empty());
    }

    #[test]
    fn test_advance_is_monotonic_and_bounded() {
        let mut session = Session::new(PlayerId::new("p1"));
        let mut expected = 1;
        while let Some(stage) = {
            session.monster_defeated = true;
            session.advance_stage()
        } {
            expected += 1;
            assert_eq!(stage.number(), expected);
            assert!(!session.monster_defeated);
        }
        assert_eq!(session.current_stage, Stage::Boss);
        assert!(session.is_stage_completed(Stage::Stage7));
        assert!(!session.is_stage_completed(Stage::Boss));

        // Boss is terminal: nothing changes.
        assert_eq!(session.advance_stage(), None);
        assert_eq!(session.current_stage, Stage::Boss);
        assert!(session.monster_defeated);
    }

    #[test]
    fn test_entering_boss_sets_goal() {
        let mut session = Session::new(PlayerId::new("p1"));
        session.profile.life_goal = "become a pilot".into();
        session.current_stage = Stage::Stage7;
        session.advance_stage();
        assert_eq!(session.boss_goal.as_deref(), Some("become a pilot"));
    }

    #[test]
    fn test_complete_game() {
        let mut session = Session::new(PlayerId::new("p1"));
        session.current_stage = Stage::Boss;
        session.complete_game();
        assert!(session.game_completed);
        assert!(session.is_stage_completed(Stage::Boss));
        assert_eq!(session.status().phase, SessionPhase::GameCompleted);
    }

    #[test]
    fn test_assign_map_records_usage() {
        let mut session = Session::new(PlayerId::new("p1"));
        session.assign_map(map("tide_caves"));
        assert!(session.used_elements.contains_map("tide_caves"));
        assert_eq!(session.status().current_map.as_deref(), Some("tide_caves map"));
    }

    #[test]
    fn test_recent_conversation() {
        let mut session = Session::new(PlayerId::new("p1"));
        for i in 0..5 {
            session.add_conversation(ConversationEntry::player(format!("line {i}")));
        }
        let recent = session.recent_conversation(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "line 3");
        assert_eq!(session.recent_conversation(50).len(), 5);
    }

    #[test]
    fn test_status_lists_missing_fields() {
        let session = Session::new(PlayerId::new("p1"));
        let status = session.status();
        assert_eq!(status.stage_name, "TUTORIAL");
        assert_eq!(status.phase, SessionPhase::AwaitingInfo);
        assert_eq!(status.missing_fields.first().map(String::as_str), Some("name"));
    }

    #[test]
    fn test_session_snapshot_round_trip() {
        let mut session = Session::new(PlayerId::new("p1"));
        session.profile.name = "Yuna".into();
        session.add_conversation(ConversationEntry::player("hi"));
        session.advance_stage();

        let json = serde_json::to_string(&session).unwrap();
        let restored: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
    }
}
