//! Stage rules - the data table describing what each stage requires.

use super::Stage;
use crate::entities::ProfileField;

/// A profile condition that must hold before a stage can be left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// The field must hold a value.
    Present(ProfileField),
    /// The sequence field must hold at least `min` entries.
    AtLeast { field: ProfileField, min: usize },
}

impl Requirement {
    pub fn field(&self) -> ProfileField {
        match self {
            Requirement::Present(field) | Requirement::AtLeast { field, .. } => *field,
        }
    }
}

/// Exit criteria and narrative guidance for one stage.
#[derive(Debug)]
pub struct StageRule {
    pub stage: Stage,

    /// Profile requirements, in the order missing items are reported.
    pub requirements: &'static [Requirement],

    /// Whether the stage's monster must be defeated before leaving.
    pub requires_monster_defeat: bool,

    /// Guidance for the dialogue collaborator while the stage is active.
    pub instructions: &'static str,

    /// One-line theme used when introducing the stage.
    pub intro_theme: &'static str,

    /// What the NPC should steer the conversation towards in this stage.
    pub conversation_goal: &'static str,
}

impl StageRule {
    /// Whether this stage asks for any profile fields at all.
    pub fn collects_profile(&self) -> bool {
        !self.requirements.is_empty()
    }
}

const TUTORIAL_REQUIREMENTS: &[Requirement] = &[
    Requirement::Present(ProfileField::Name),
    Requirement::Present(ProfileField::Age),
    Requirement::Present(ProfileField::Location),
    Requirement::Present(ProfileField::Occupation),
    Requirement::Present(ProfileField::LifeGoal),
    Requirement::AtLeast {
        field: ProfileField::PersonalityTraits,
        min: 3,
    },
    Requirement::AtLeast {
        field: ProfileField::Likes,
        min: 4,
    },
];

const STAGE_2_REQUIREMENTS: &[Requirement] = &[Requirement::Present(ProfileField::Fears)];

const STAGE_3_REQUIREMENTS: &[Requirement] = &[Requirement::Present(ProfileField::Background)];

const STORY_GOAL: &str = "Build a richer story through conversation: ask about the player's \
    feelings, experiences and thoughts.";

static STAGE_RULES: [StageRule; 8] = [
    StageRule {
        stage: Stage::Tutorial,
        requirements: TUTORIAL_REQUIREMENTS,
        requires_monster_defeat: false,
        instructions: "This is the tutorial. Get to know the player: their name, age, where \
            they live, what they do, at least three personality traits, at least four things \
            they like, and their life goal. Ask one question at a time, follow up warmly, and \
            do not mention later stages or maps until everything is collected.",
        intro_theme: "the journey begins",
        conversation_goal: "Learn the player's basic details, personality, likes and life goal.",
    },
    StageRule {
        stage: Stage::Stage2,
        requirements: STAGE_2_REQUIREMENTS,
        requires_monster_defeat: true,
        instructions: "Second stage. Learn what the player fears or worries about. Ask gently \
            and naturally, and do not move on until at least one fear has been shared.",
        intro_theme: "the first adventure is behind you and the journey truly begins",
        conversation_goal: "Learn what the player is afraid of or worried about.",
    },
    StageRule {
        stage: Stage::Stage3,
        requirements: STAGE_3_REQUIREMENTS,
        requires_monster_defeat: true,
        instructions: "Third stage. Learn the player's background: personal stories, past \
            experiences, education and the events that shaped them. Invite more detail.",
        intro_theme: "the adventure deepens and the player's growth begins to show",
        conversation_goal: "Learn the player's background: past experiences, upbringing and \
            formative events.",
    },
    StageRule {
        stage: Stage::Stage4,
        requirements: &[],
        requires_monster_defeat: true,
        instructions: "Fourth stage. The real adventure begins. Weave the player's interests, \
            personality and background into a personal story tied to their goal.",
        intro_theme: "the adventure begins in earnest and the player's skills are tested",
        conversation_goal: STORY_GOAL,
    },
    StageRule {
        stage: Stage::Stage5,
        requirements: &[],
        requires_monster_defeat: true,
        instructions: "Fifth stage. Connect the story more closely to the player's personal \
            goal and explore their inner world. Reflect new details they share.",
        intro_theme: "the adventure reaches its height and a great challenge awaits",
        conversation_goal: STORY_GOAL,
    },
    StageRule {
        stage: Stage::Stage6,
        requirements: &[],
        requires_monster_defeat: true,
        instructions: "Sixth stage. Prepare for the final battle. Draw on the strengths the \
            player has shown, encourage them, and point out how far they have come.",
        intro_theme: "the final goal draws near and preparations begin",
        conversation_goal: STORY_GOAL,
    },
    StageRule {
        stage: Stage::Stage7,
        requirements: &[],
        requires_monster_defeat: true,
        instructions: "Seventh stage. Final preparations. Help the player understand their \
            strengths and weaknesses, offer strategy, and build their confidence.",
        intro_theme: "the final battle approaches and the tension builds",
        conversation_goal: STORY_GOAL,
    },
    StageRule {
        stage: Stage::Boss,
        requirements: &[],
        requires_monster_defeat: true,
        instructions: "Final stage. The boss battle is tied to the player's life goal. Remind \
            them of the whole journey and their growth, and bring the story to a warm close.",
        intro_theme: "the final battle for the player's life goal is at hand",
        conversation_goal: "Review the journey so far and check the player is ready for the \
            final challenge.",
    },
];

/// Lookup into the stage rule table.
pub struct StageRules;

impl StageRules {
    /// The rule for a stage.
    pub fn for_stage(stage: Stage) -> &'static StageRule {
        &STAGE_RULES[usize::from(stage.number()) - 1]
    }

    /// All rules, in stage order.
    pub fn all() -> &'static [StageRule] {
        &STAGE_RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_keyed_by_stage() {
        for stage in Stage::ALL {
            assert_eq!(StageRules::for_stage(stage).stage, stage);
        }
        assert_eq!(StageRules::all().len(), Stage::ALL.len());
    }

    #[test]
    fn test_tutorial_requirements() {
        let rule = StageRules::for_stage(Stage::Tutorial);
        assert!(!rule.requires_monster_defeat);
        assert_eq!(rule.requirements.len(), 7);
        assert!(rule.requirements.contains(&Requirement::AtLeast {
            field: ProfileField::PersonalityTraits,
            min: 3
        }));
        assert!(rule.requirements.contains(&Requirement::AtLeast {
            field: ProfileField::Likes,
            min: 4
        }));
    }

    #[test]
    fn test_later_stages_collect_single_fields() {
        assert_eq!(
            StageRules::for_stage(Stage::Stage2).requirements,
            &[Requirement::Present(ProfileField::Fears)]
        );
        assert_eq!(
            StageRules::for_stage(Stage::Stage3).requirements[0].field(),
            ProfileField::Background
        );
        for stage in [Stage::Stage4, Stage::Stage5, Stage::Stage6, Stage::Stage7, Stage::Boss] {
            let rule = StageRules::for_stage(stage);
            assert!(!rule.collects_profile());
            assert!(rule.requires_monster_defeat);
        }
    }
}
