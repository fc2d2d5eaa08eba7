//! Entity definitions for a player's journey.

mod profile;
mod used_elements;

pub use profile::*;
pub use used_elements::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player and their session.
///
/// Callers may supply their own identifier; otherwise one is generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Create a player ID from a caller-supplied identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random player ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Who said a line of dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Player,
    Npc,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Player => "player",
            Speaker::Npc => "npc",
        }
    }
}

/// A single line in the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub speaker: Speaker,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    /// Create an entry stamped with the current time.
    pub fn new(speaker: Speaker, message: impl Into<String>) -> Self {
        Self {
            speaker,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn player(message: impl Into<String>) -> Self {
        Self::new(Speaker::Player, message)
    }

    pub fn npc(message: impl Into<String>) -> Self {
        Self::new(Speaker::Npc, message)
    }

    pub fn is_from_player(&self) -> bool {
        self.speaker == Speaker::Player
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_player_ids_are_unique() {
        let a = PlayerId::generate();
        let b = PlayerId::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_player_id_serializes_as_plain_string() {
        let id = PlayerId::new("hero-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"hero-42\"");
        assert_eq!(id.to_string(), "hero-42");
    }

    #[test]
    fn test_conversation_entry_speaker() {
        assert!(ConversationEntry::player("hi").is_from_player());
        assert!(!ConversationEntry::npc("welcome").is_from_player());
        assert_eq!(Speaker::Npc.as_str(), "npc");
    }
}
