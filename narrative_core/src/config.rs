//! Engine configuration.
//!
//! Loaded from TOML; every field has a default, so partial files are valid.
//! Timeouts can be overridden through `JOURNEY_*` environment variables.

use game_rules::MapAssignment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ProgressionError;

const DEFAULT_WELCOME_MESSAGE: &str = "Welcome, traveler! Before our journey begins, I would \
    love to get to know you. What should I call you?";

/// Tunables for the progression engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bound on a single extraction call.
    pub extraction_timeout_ms: u64,
    /// Bound on a single dialogue/narration call.
    pub narration_timeout_ms: u64,
    /// Bound on a single map recommendation call.
    pub map_timeout_ms: u64,
    /// Bound on a single history store call.
    pub history_timeout_ms: u64,

    /// Conversation entries handed to collaborators as context.
    pub context_window: usize,
    /// History records loaded for a dialogue reply.
    pub reply_history_limit: usize,
    /// History records loaded for a stage introduction.
    pub intro_history_limit: usize,

    /// First NPC line of every new session.
    pub welcome_message: String,

    /// The map every session starts on.
    pub tutorial_map: MapAssignment,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extraction_timeout_ms: 10_000,
            narration_timeout_ms: 20_000,
            map_timeout_ms: 20_000,
            history_timeout_ms: 2_000,
            context_window: 15,
            reply_history_limit: 10,
            intro_history_limit: 5,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            tutorial_map: MapAssignment {
                id: "tutorial_meadow".to_string(),
                name: "tutorial meadow".to_string(),
                description: "A quiet meadow at the edge of the world, where every journey \
                    begins with a conversation."
                    .to_string(),
                image_ref: "maps/tutorial_meadow.png".to_string(),
                reasoning: "Every journey starts in the tutorial meadow.".to_string(),
            },
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ProgressionError> {
        let config: Self = toml::from_str(content).map_err(ProgressionError::config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProgressionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProgressionError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Apply `JOURNEY_*_TIMEOUT_MS` and `JOURNEY_CONTEXT_WINDOW` from the environment.
    ///
    /// Unset or unparsable variables leave the current value in place. The
    /// result is validated like a loaded file.
    pub fn with_env_overrides(self) -> Result<Self, ProgressionError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ProgressionError> {
        let read = |key: &str| lookup(key).and_then(|value| value.trim().parse::<u64>().ok());

        if let Some(ms) = read("JOURNEY_EXTRACTION_TIMEOUT_MS") {
            self.extraction_timeout_ms = ms;
        }
        if let Some(ms) = read("JOURNEY_NARRATION_TIMEOUT_MS") {
            self.narration_timeout_ms = ms;
        }
        if let Some(ms) = read("JOURNEY_MAP_TIMEOUT_MS") {
            self.map_timeout_ms = ms;
        }
        if let Some(ms) = read("JOURNEY_HISTORY_TIMEOUT_MS") {
            self.history_timeout_ms = ms;
        }
        if let Some(window) = read("JOURNEY_CONTEXT_WINDOW") {
            self.context_window = usize::try_from(window)
                .map_err(|_| ProgressionError::config("JOURNEY_CONTEXT_WINDOW is out of range"))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ProgressionError> {
        let timeouts = [
            ("extraction_timeout_ms", self.extraction_timeout_ms),
            ("narration_timeout_ms", self.narration_timeout_ms),
            ("map_timeout_ms", self.map_timeout_ms),
            ("history_timeout_ms", self.history_timeout_ms),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, ms)| *ms == 0) {
            return Err(ProgressionError::config(format!("{name} must be positive")));
        }
        if self.tutorial_map.id.trim().is_empty() {
            return Err(ProgressionError::config("tutorial_map.id must not be empty"));
        }
        Ok(())
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_millis(self.extraction_timeout_ms)
    }

    pub fn narration_timeout(&self) -> Duration {
        Duration::from_millis(self.narration_timeout_ms)
    }

    pub fn map_timeout(&self) -> Duration {
        Duration::from_millis(self.map_timeout_ms)
    }

    pub fn history_timeout(&self) -> Duration {
        Duration::from_millis(self.history_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.context_window, 15);
        assert_eq!(config.reply_history_limit, 10);
        assert_eq!(config.intro_history_limit, 5);
        assert_eq!(config.tutorial_map.id, "tutorial_meadow");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            narration_timeout_ms = 500
            welcome_message = "Hello there!"
            "#,
        )
        .unwrap();

        assert_eq!(config.narration_timeout(), Duration::from_millis(500));
        assert_eq!(config.welcome_message, "Hello there!");
        assert_eq!(config.extraction_timeout_ms, 10_000);
    }

    #[test]
    fn test_tutorial_map_table() {
        let config = EngineConfig::from_toml_str(
            r#"
            [tutorial_map]
            id = "harbor"
            name = "quiet harbor"
            description = "Boats and gulls."
            image_ref = "maps/harbor.png"
            reasoning = "Calm start."
            "#,
        )
        .unwrap();
        assert_eq!(config.tutorial_map.name, "quiet harbor");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            EngineConfig::from_toml_str("map_timeout_ms = \"soon\""),
            Err(ProgressionError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("history_timeout_ms = 0"),
            Err(ProgressionError::Config(_))
        ));
        assert!(EngineConfig::from_file("/nonexistent/journey.toml").is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("JOURNEY_MAP_TIMEOUT_MS", "750"),
            ("JOURNEY_CONTEXT_WINDOW", "8"),
            ("JOURNEY_HISTORY_TIMEOUT_MS", "not a number"),
        ]
        .into_iter()
        .collect();

        let config = EngineConfig::default()
            .with_overrides(|key| vars.get(key).map(|value| value.to_string()))
            .unwrap();

        assert_eq!(config.map_timeout_ms, 750);
        assert_eq!(config.context_window, 8);
        assert_eq!(config.history_timeout_ms, 2_000);
    }

    #[test]
    fn test_zero_timeout_override_is_rejected() {
        let result = EngineConfig::default().with_overrides(|key| {
            (key == "JOURNEY_MAP_TIMEOUT_MS").then(|| "0".to_string())
        });
        assert!(matches!(result, Err(ProgressionError::Config(_))));
    }
}
