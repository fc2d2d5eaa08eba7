//! Errors raised by the rules crate.

/// Rule evaluation and parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// A stage number outside `1..=8`.
    #[error("Unknown stage: {0}")]
    UnknownStage(u8),

    /// Extraction output that could not be read as a field mapping.
    #[error("Invalid extracted facts: {0}")]
    InvalidFacts(String),
}

impl RulesError {
    pub fn invalid_facts(message: impl ToString) -> Self {
        Self::InvalidFacts(message.to_string())
    }
}
