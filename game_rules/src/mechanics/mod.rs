//! Progression mechanics: stages, stage rules, completion checks and profile merging.

mod aggregator;
mod controller;
mod facts;
mod rules;

pub use aggregator::*;
pub use controller::*;
pub use facts::*;
pub use rules::*;

use serde::{Deserialize, Serialize};

use crate::error::RulesError;

/// The eight ordered phases of a journey.
///
/// Progression only ever moves to the next stage; `Boss` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Stage {
    Tutorial,
    Stage2,
    Stage3,
    Stage4,
    Stage5,
    Stage6,
    Stage7,
    Boss,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Tutorial,
        Stage::Stage2,
        Stage::Stage3,
        Stage::Stage4,
        Stage::Stage5,
        Stage::Stage6,
        Stage::Stage7,
        Stage::Boss,
    ];

    /// 1-based stage number.
    pub fn number(&self) -> u8 {
        match self {
            Stage::Tutorial => 1,
            Stage::Stage2 => 2,
            Stage::Stage3 => 3,
            Stage::Stage4 => 4,
            Stage::Stage5 => 5,
            Stage::Stage6 => 6,
            Stage::Stage7 => 7,
            Stage::Boss => 8,
        }
    }

    /// Look a stage up by its number.
    pub fn from_number(number: u8) -> Result<Self, RulesError> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.number() == number)
            .ok_or(RulesError::UnknownStage(number))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Tutorial => "TUTORIAL",
            Stage::Stage2 => "STAGE_2",
            Stage::Stage3 => "STAGE_3",
            Stage::Stage4 => "STAGE_4",
            Stage::Stage5 => "STAGE_5",
            Stage::Stage6 => "STAGE_6",
            Stage::Stage7 => "STAGE_7",
            Stage::Boss => "BOSS",
        }
    }

    /// The following stage, or `None` at the boss stage.
    pub fn next(&self) -> Option<Stage> {
        Stage::from_number(self.number() + 1).ok()
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

impl TryFrom<u8> for Stage {
    type Error = RulesError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        Stage::from_number(number)
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> Self {
        stage.number()
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.number(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_numbers_are_ordered() {
        for (index, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.number() as usize, index + 1);
        }
        assert!(Stage::Tutorial < Stage::Boss);
    }

    #[test]
    fn test_stage_next() {
        assert_eq!(Stage::Tutorial.next(), Some(Stage::Stage2));
        assert_eq!(Stage::Stage7.next(), Some(Stage::Boss));
        assert_eq!(Stage::Boss.next(), None);
        assert!(Stage::Boss.is_terminal());
    }

    #[test]
    fn test_unknown_stage() {
        assert_eq!(Stage::from_number(0), Err(RulesError::UnknownStage(0)));
        assert_eq!(Stage::try_from(9), Err(RulesError::UnknownStage(9)));
        assert_eq!(Stage::try_from(3), Ok(Stage::Stage3));
    }

    #[test]
    fn test_stage_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Stage::Boss).unwrap(), "8");
        let stage: Stage = serde_json::from_str("2").unwrap();
        assert_eq!(stage, Stage::Stage2);
        assert!(serde_json::from_str::<Stage>("12").is_err());
    }
}
