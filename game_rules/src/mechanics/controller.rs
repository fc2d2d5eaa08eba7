//! Stage controller - decides whether the current stage is complete and what is missing.

use serde::{Deserialize, Serialize};

use super::{Requirement, StageRules};
use crate::entities::{ConversationEntry, Profile, ProfileField};
use crate::session::Session;

/// How many of the most recent log entries are searched for a player message.
pub const RECENT_ENTRY_WINDOW: usize = 3;

/// A profile requirement that is not yet satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissingField {
    /// Nothing is known for the field yet.
    Absent { field: ProfileField },
    /// Some entries exist, but fewer than the stage needs.
    NeedsMore {
        field: ProfileField,
        have: usize,
        need: usize,
    },
}

impl MissingField {
    pub fn field(&self) -> ProfileField {
        match self {
            MissingField::Absent { field } | MissingField::NeedsMore { field, .. } => *field,
        }
    }

    /// Identifier reported to callers, e.g. `"age"` or `"personality (more specific)"`.
    pub fn identifier(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingField::Absent { field } => write!(f, "{}", field.label()),
            MissingField::NeedsMore { field, .. } => write!(f, "{} (more specific)", field.label()),
        }
    }
}

/// A reason the current stage cannot be left yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "blocker", rename_all = "snake_case")]
pub enum AdvanceBlocker {
    Missing { missing: MissingField },
    MonsterNotDefeated,
    NoRecentPlayerMessage,
}

impl std::fmt::Display for AdvanceBlocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdvanceBlocker::Missing { missing } => write!(f, "missing {}", missing),
            AdvanceBlocker::MonsterNotDefeated => write!(f, "the stage monster is not defeated"),
            AdvanceBlocker::NoRecentPlayerMessage => {
                write!(f, "the player has not spoken since the last transition")
            }
        }
    }
}

/// Coarse state of a session, as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// The stage still needs profile information.
    AwaitingInfo,
    /// Profile requirements are met; the stage continues until its signals fire.
    StageActive,
    /// The boss stage has been completed.
    GameCompleted,
}

/// Evaluates a session against the stage rule table.
pub struct StageController;

impl StageController {
    /// Profile requirements of the current stage that are not yet met, in report order.
    pub fn missing_fields(session: &Session) -> Vec<MissingField> {
        let rule = StageRules::for_stage(session.current_stage);
        rule.requirements
            .iter()
            .filter_map(|requirement| Self::check_requirement(&session.profile, requirement))
            .collect()
    }

    /// Everything that currently prevents leaving the stage.
    pub fn blockers(session: &Session) -> Vec<AdvanceBlocker> {
        let rule = StageRules::for_stage(session.current_stage);

        let mut blockers: Vec<AdvanceBlocker> = Self::missing_fields(session)
            .into_iter()
            .map(|missing| AdvanceBlocker::Missing { missing })
            .collect();

        if rule.requires_monster_defeat && !session.monster_defeated {
            blockers.push(AdvanceBlocker::MonsterNotDefeated);
        }

        if !Self::has_recent_player_message(&session.conversation_history) {
            blockers.push(AdvanceBlocker::NoRecentPlayerMessage);
        }

        blockers
    }

    /// Whether the current stage's exit criteria are all satisfied.
    pub fn is_stage_complete(session: &Session) -> bool {
        Self::blockers(session).is_empty()
    }

    /// Whether any of the last [`RECENT_ENTRY_WINDOW`] entries came from the player.
    ///
    /// A transition appends a single intro line, so the message that completed
    /// the previous stage still counts for the next one.
    pub fn has_recent_player_message(history: &[ConversationEntry]) -> bool {
        history
            .iter()
            .rev()
            .take(RECENT_ENTRY_WINDOW)
            .any(ConversationEntry::is_from_player)
    }

    pub fn phase(session: &Session) -> SessionPhase {
        if session.game_completed {
            SessionPhase::GameCompleted
        } else if Self::missing_fields(session).is_empty() {
            SessionPhase::StageActive
        } else {
            SessionPhase::AwaitingInfo
        }
    }

    fn check_requirement(profile: &Profile, requirement: &Requirement) -> Option<MissingField> {
        match *requirement {
            Requirement::Present(field) => {
                (!profile.is_present(field)).then_some(MissingField::Absent { field })
            }
            Requirement::AtLeast { field, min } => {
                let have = profile.count(field);
                if have == 0 {
                    Some(MissingField::Absent { field })
                } else if have < min {
                    Some(MissingField::NeedsMore {
                        field,
                        have,
                        need: min,
                    })
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PlayerId;
    use crate::mechanics::Stage;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn complete_tutorial_profile() -> Profile {
        Profile {
            name: "Jiwoo".into(),
            age: Some(27),
            location: "Seoul".into(),
            occupation: "designer".into(),
            life_goal: "open a studio".into(),
            personality_traits: strings(&["curious", "patient", "honest"]),
            likes: strings(&["drawing", "coffee", "cats", "films"]),
            ..Profile::default()
        }
    }

    fn session_at(stage: Stage) -> Session {
        let mut session = Session::new(PlayerId::new("p1"));
        session.current_stage = stage;
        session
    }

    fn identifiers(missing: &[MissingField]) -> Vec<String> {
        missing.iter().map(MissingField::identifier).collect()
    }

    #[test]
    fn test_tutorial_missing_fields_in_priority_order() {
        let mut session = session_at(Stage::Tutorial);
        session.profile = complete_tutorial_profile();
        session.profile.age = None;
        session.profile.personality_traits = strings(&["curious", "patient"]);

        assert_eq!(
            identifiers(&StageController::missing_fields(&session)),
            vec!["age", "personality (more specific)"]
        );
    }

    #[test]
    fn test_empty_tutorial_profile_lists_everything() {
        let session = session_at(Stage::Tutorial);
        assert_eq!(
            identifiers(&StageController::missing_fields(&session)),
            vec![
                "name",
                "age",
                "location",
                "occupation",
                "life goal",
                "personality",
                "likes/hobbies"
            ]
        );
    }

    #[test]
    fn test_tutorial_likes_below_minimum() {
        let mut session = session_at(Stage::Tutorial);
        session.profile = complete_tutorial_profile();
        session.profile.likes = strings(&["drawing"]);

        let missing = StageController::missing_fields(&session);
        assert_eq!(
            missing,
            vec![MissingField::NeedsMore {
                field: ProfileField::Likes,
                have: 1,
                need: 4
            }]
        );
        assert_eq!(missing[0].identifier(), "likes/hobbies (more specific)");
    }

    #[test]
    fn test_tutorial_completes_without_monster() {
        let mut session = session_at(Stage::Tutorial);
        session.profile = complete_tutorial_profile();
        assert!(!StageController::is_stage_complete(&session));

        session.add_conversation(ConversationEntry::player("that's everything about me"));
        assert!(StageController::is_stage_complete(&session));
        assert!(!session.monster_defeated);
    }

    #[test]
    fn test_player_message_must_be_recent() {
        let mut session = session_at(Stage::Tutorial);
        session.profile = complete_tutorial_profile();
        session.add_conversation(ConversationEntry::player("hello"));
        session.add_conversation(ConversationEntry::npc("one"));
        session.add_conversation(ConversationEntry::npc("two"));
        assert!(StageController::is_stage_complete(&session));

        session.add_conversation(ConversationEntry::npc("three"));
        assert!(!StageController::is_stage_complete(&session));
        assert_eq!(
            StageController::blockers(&session),
            vec![AdvanceBlocker::NoRecentPlayerMessage]
        );
    }

    #[test]
    fn test_triggering_message_carries_into_next_stage() {
        let mut session = session_at(Stage::Tutorial);
        session.profile = complete_tutorial_profile();
        session.profile.fears = strings(&["heights"]);
        session.add_conversation(ConversationEntry::player("and I'm scared of heights"));
        session.advance_stage();
        session.add_conversation(ConversationEntry::npc("Welcome to stage 2"));

        session.monster_defeated = true;
        assert!(StageController::has_recent_player_message(&session.conversation_history));
        assert!(StageController::is_stage_complete(&session));
    }

    #[test]
    fn test_stage_three_needs_background() {
        let mut session = session_at(Stage::Stage3);
        session.monster_defeated = true;
        session.add_conversation(ConversationEntry::player("I'd rather not say"));

        assert!(!StageController::is_stage_complete(&session));
        assert_eq!(identifiers(&StageController::missing_fields(&session)), vec!["background"]);

        session.profile.background = "grew up in a small town".into();
        assert!(StageController::is_stage_complete(&session));
    }

    #[test]
    fn test_stage_two_needs_monster_and_fears() {
        let mut session = session_at(Stage::Stage2);
        session.profile.fears = strings(&["the dark"]);
        session.add_conversation(ConversationEntry::player("I fear the dark"));

        assert_eq!(
            StageController::blockers(&session),
            vec![AdvanceBlocker::MonsterNotDefeated]
        );

        session.monster_defeated = true;
        assert!(StageController::is_stage_complete(&session));
    }

    #[test]
    fn test_story_stages_have_no_missing_fields() {
        for stage in [Stage::Stage4, Stage::Stage5, Stage::Stage6, Stage::Stage7, Stage::Boss] {
            let mut session = session_at(stage);
            assert!(StageController::missing_fields(&session).is_empty());
            assert_eq!(StageController::phase(&session), SessionPhase::StageActive);

            session.add_conversation(ConversationEntry::player("onwards"));
            assert!(!StageController::is_stage_complete(&session));

            session.monster_defeated = true;
            assert!(StageController::is_stage_complete(&session));
        }
    }

    #[test]
    fn test_phase() {
        let mut session = session_at(Stage::Tutorial);
        assert_eq!(StageController::phase(&session), SessionPhase::AwaitingInfo);

        session.profile = complete_tutorial_profile();
        assert_eq!(StageController::phase(&session), SessionPhase::StageActive);

        session.game_completed = true;
        assert_eq!(StageController::phase(&session), SessionPhase::GameCompleted);
    }

    #[test]
    fn test_blocker_display() {
        let blocker = AdvanceBlocker::Missing {
            missing: MissingField::Absent {
                field: ProfileField::Fears,
            },
        };
        assert_eq!(blocker.to_string(), "missing fears");
    }
}
