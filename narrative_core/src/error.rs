//! Engine error types.
//!
//! [`ProgressionError`] is what callers of the engine see. [`CollaboratorError`]
//! is what the external services report; the engine recovers from it locally and
//! never lets it fail a turn.

use game_rules::{AdvanceBlocker, PlayerId, RulesError, Stage};
use thiserror::Error;

/// Failure of an engine operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgressionError {
    /// No session is registered under the given id.
    #[error("Session not found: {0}")]
    SessionNotFound(PlayerId),

    /// An explicit advance was requested while the stage is incomplete.
    #[error("Cannot leave stage {stage}: {}", describe_blockers(.blockers))]
    StageAdvanceRejected {
        stage: Stage,
        blockers: Vec<AdvanceBlocker>,
    },

    /// A stage number outside 1..=8.
    #[error("Unknown stage: {0}")]
    UnknownStage(u8),

    /// A session snapshot could not be written or read.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Invalid engine configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProgressionError {
    pub fn not_found(player_id: &PlayerId) -> Self {
        Self::SessionNotFound(player_id.clone())
    }

    pub fn snapshot(message: impl ToString) -> Self {
        Self::Snapshot(message.to_string())
    }

    pub fn config(message: impl ToString) -> Self {
        Self::Config(message.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound(_))
    }

    /// The reasons an advance was refused, if this is a rejection.
    pub fn blockers(&self) -> Option<&[AdvanceBlocker]> {
        match self {
            Self::StageAdvanceRejected { blockers, .. } => Some(blockers),
            _ => None,
        }
    }
}

impl From<RulesError> for ProgressionError {
    fn from(error: RulesError) -> Self {
        match error {
            RulesError::UnknownStage(number) => Self::UnknownStage(number),
            RulesError::InvalidFacts(message) => Self::Snapshot(message),
        }
    }
}

fn describe_blockers(blockers: &[AdvanceBlocker]) -> String {
    blockers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure reported by an external collaborator (extraction, dialogue, maps, history).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("{operation} timed out after {after_ms}ms")]
    Timeout {
        operation: &'static str,
        after_ms: u64,
    },

    #[error("Invalid collaborator response: {0}")]
    InvalidResponse(String),
}

impl CollaboratorError {
    pub fn unavailable(message: impl ToString) -> Self {
        Self::Unavailable(message.to_string())
    }

    pub fn invalid_response(message: impl ToString) -> Self {
        Self::InvalidResponse(message.to_string())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<RulesError> for CollaboratorError {
    fn from(error: RulesError) -> Self {
        Self::InvalidResponse(error.to_string())
    }
}
