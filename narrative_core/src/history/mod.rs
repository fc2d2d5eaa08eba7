//! History - durable per-player log used to enrich collaborator context.
//!
//! History never takes part in completion decisions; those read only the
//! session's own conversation log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use game_rules::{ConversationEntry, PlayerId, Speaker, Stage};
use serde::{Deserialize, Serialize};

use crate::collaborators::HistoryStore;
use crate::error::CollaboratorError;

/// What a history record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    /// A line of dialogue.
    Conversation,
    /// Narration introducing a stage.
    StageIntro,
    /// Marker written when a stage is completed.
    StageCompletion,
    /// Background information, such as the session's opening.
    Context,
}

/// One entry in the history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub kind: HistoryKind,
    pub stage: Stage,
    pub speaker: Option<Speaker>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn new(kind: HistoryKind, stage: Stage, content: impl Into<String>) -> Self {
        Self {
            kind,
            stage,
            speaker: None,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Record a conversation entry, keeping its speaker and time.
    pub fn conversation(stage: Stage, entry: &ConversationEntry) -> Self {
        Self {
            kind: HistoryKind::Conversation,
            stage,
            speaker: Some(entry.speaker),
            content: entry.message.clone(),
            timestamp: entry.timestamp,
        }
    }

    pub fn stage_intro(stage: Stage, narration: impl Into<String>) -> Self {
        Self {
            speaker: Some(Speaker::Npc),
            ..Self::new(HistoryKind::StageIntro, stage, narration)
        }
    }

    pub fn stage_completion(stage: Stage) -> Self {
        Self::new(
            HistoryKind::StageCompletion,
            stage,
            format!("Stage {} completed", stage.number()),
        )
    }

    pub fn context(stage: Stage, content: impl Into<String>) -> Self {
        Self::new(HistoryKind::Context, stage, content)
    }

    /// One-line rendering for prompts.
    pub fn to_line(&self) -> String {
        match self.speaker {
            Some(speaker) => format!("[{}] {}: {}", self.stage.name(), speaker.as_str(), self.content),
            None => format!("[{}] {}", self.stage.name(), self.content),
        }
    }
}

/// Process-local [`HistoryStore`].
///
/// Unbounded by default: a player's records accumulate until `clear`. Use
/// [`InMemoryHistoryStore::with_max_records`] to keep only the newest ones.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    records: DashMap<PlayerId, Vec<HistoryRecord>>,
    max_records: Option<usize>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `max_records` per player, dropping the oldest first.
    pub fn with_max_records(max_records: usize) -> Self {
        Self {
            records: DashMap::new(),
            max_records: Some(max_records),
        }
    }

    /// Number of records held for a player.
    pub fn len(&self, player_id: &PlayerId) -> usize {
        self.records.get(player_id).map(|records| records.len()).unwrap_or(0)
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, player_id: &PlayerId, record: HistoryRecord) -> Result<(), CollaboratorError> {
        let mut records = self.records.entry(player_id.clone()).or_default();
        records.push(record);
        if let Some(max) = self.max_records {
            let excess = records.len().saturating_sub(max);
            records.drain(..excess);
        }
        Ok(())
    }

    async fn recent(&self, player_id: &PlayerId, limit: usize) -> Result<Vec<HistoryRecord>, CollaboratorError> {
        Ok(self
            .records
            .get(player_id)
            .map(|records| {
                let start = records.len().saturating_sub(limit);
                records[start..].to_vec()
            })
            .unwrap_or_default())
    }

    async fn clear(&self, player_id: &PlayerId) -> Result<(), CollaboratorError> {
        self.records.remove(player_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recent_returns_newest_in_order() {
        let store = InMemoryHistoryStore::new();
        let player = PlayerId::new("p1");
        for i in 0..4 {
            let entry = ConversationEntry::player(format!("message {i}"));
            store
                .append(&player, HistoryRecord::conversation(Stage::Tutorial, &entry))
                .await
                .unwrap();
        }

        let recent = store.recent(&player, 2).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["message 2", "message 3"]);
        assert_eq!(store.len(&player), 4);
    }

    #[tokio::test]
    async fn test_capped_store_drops_oldest() {
        let store = InMemoryHistoryStore::with_max_records(3);
        let player = PlayerId::new("p1");
        for i in 0..5 {
            store
                .append(&player, HistoryRecord::context(Stage::Tutorial, format!("note {i}")))
                .await
                .unwrap();
        }

        assert_eq!(store.len(&player), 3);
        let recent = store.recent(&player, 10).await.unwrap();
        assert_eq!(recent[0].content, "note 2");
        assert_eq!(recent[2].content, "note 4");
    }

    #[tokio::test]
    async fn test_players_are_isolated() {
        let store = InMemoryHistoryStore::new();
        let a = PlayerId::new("a");
        let b = PlayerId::new("b");
        store
            .append(&a, HistoryRecord::context(Stage::Tutorial, "session started"))
            .await
            .unwrap();

        assert!(store.recent(&b, 10).await.unwrap().is_empty());

        store.clear(&a).await.unwrap();
        assert_eq!(store.len(&a), 0);
    }

    #[test]
    fn test_record_lines() {
        let intro = HistoryRecord::stage_intro(Stage::Stage2, "A new map awaits.");
        assert_eq!(intro.to_line(), "[STAGE_2] npc: A new map awaits.");

        let done = HistoryRecord::stage_completion(Stage::Stage3);
        assert_eq!(done.kind, HistoryKind::StageCompletion);
        assert_eq!(done.to_line(), "[STAGE_3] Stage 3 completed");
    }
}
