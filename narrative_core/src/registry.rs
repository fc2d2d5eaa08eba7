//! Session registry - maps player ids to their live sessions.
//!
//! Each session sits behind its own async mutex, so turns for one player are
//! serialized while different players proceed in parallel.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use game_rules::{PlayerId, Session, Stage, StatusSummary};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::ProgressionError;

/// Shared handle to one player's session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Concurrent store of live sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<PlayerId, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its player id, replacing any previous one.
    pub fn insert(&self, session: Session) -> PlayerId {
        let player_id = session.player_id.clone();
        self.sessions
            .insert(player_id.clone(), Arc::new(Mutex::new(session)));
        tracing::debug!(player_id = %player_id, "Session registered");
        player_id
    }

    /// The handle for `player_id`, registering a blank session when there is none.
    ///
    /// Lookup and insertion happen under one map entry lock. The flag is `true`
    /// when the session was created by this call.
    pub fn handle_or_insert(&self, player_id: &PlayerId) -> (SessionHandle, bool) {
        match self.sessions.entry(player_id.clone()) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(entry) => {
                let handle = Arc::new(Mutex::new(Session::new(player_id.clone())));
                entry.insert(Arc::clone(&handle));
                (handle, true)
            }
        }
    }

    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.sessions.contains_key(player_id)
    }

    /// The lock handle for a session.
    ///
    /// The map entry is released before the handle is returned, so holding the
    /// session lock never blocks other players.
    pub fn handle(&self, player_id: &PlayerId) -> Result<SessionHandle, ProgressionError> {
        self.sessions
            .get(player_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ProgressionError::not_found(player_id))
    }

    /// A copy of the session's current state.
    pub async fn get(&self, player_id: &PlayerId) -> Result<Session, ProgressionError> {
        let handle = self.handle(player_id)?;
        let session = handle.lock().await;
        Ok(session.clone())
    }

    pub async fn status(&self, player_id: &PlayerId) -> Result<StatusSummary, ProgressionError> {
        let handle = self.handle(player_id)?;
        let session = handle.lock().await;
        Ok(session.status())
    }

    pub fn remove(&self, player_id: &PlayerId) -> Result<(), ProgressionError> {
        self.sessions
            .remove(player_id)
            .map(|_| tracing::debug!(player_id = %player_id, "Session removed"))
            .ok_or_else(|| ProgressionError::not_found(player_id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Serialize a session to JSON.
    pub async fn snapshot(&self, player_id: &PlayerId) -> Result<String, ProgressionError> {
        let session = self.get(player_id).await?;
        serde_json::to_string(&session).map_err(ProgressionError::snapshot)
    }

    /// Load a session from a snapshot and register it, replacing any live one.
    pub fn restore(&self, snapshot: &str) -> Result<PlayerId, ProgressionError> {
        let value: Value = serde_json::from_str(snapshot).map_err(ProgressionError::snapshot)?;

        // Report an out-of-range stage precisely rather than as a parse failure.
        if let Some(number) = value.get("current_stage").and_then(Value::as_u64) {
            let number = u8::try_from(number).unwrap_or(u8::MAX);
            Stage::try_from(number)?;
        }

        let session: Session = serde_json::from_value(value).map_err(ProgressionError::snapshot)?;
        tracing::info!(
            player_id = %session.player_id,
            stage = session.current_stage.number(),
            "Session restored from snapshot"
        );
        Ok(self.insert(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let registry = SessionRegistry::new();
        let id = registry.insert(Session::new(PlayerId::new("p1")));

        assert!(registry.contains(&id));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).await.unwrap().current_stage, Stage::Tutorial);
    }

    #[tokio::test]
    async fn test_handle_or_insert() {
        let registry = SessionRegistry::new();
        let id = PlayerId::new("p1");

        let (first, created) = registry.handle_or_insert(&id);
        assert!(created);
        first.lock().await.current_stage = Stage::Stage4;

        let (second, created) = registry.handle_or_insert(&id);
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.lock().await.current_stage, Stage::Stage4);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_player() {
        let registry = SessionRegistry::new();
        let ghost = PlayerId::new("ghost");

        assert!(registry.get(&ghost).await.unwrap_err().is_not_found());
        assert!(registry.status(&ghost).await.is_err());
        assert!(registry.remove(&ghost).is_err());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let registry = SessionRegistry::new();
        let mut session = Session::new(PlayerId::new("p1"));
        session.profile.name = "Sora".into();
        session.advance_stage();
        let id = registry.insert(session.clone());

        let snapshot = registry.snapshot(&id).await.unwrap();
        registry.remove(&id).unwrap();
        assert!(registry.is_empty());

        let restored = registry.restore(&snapshot).unwrap();
        assert_eq!(restored, id);
        assert_eq!(registry.get(&id).await.unwrap(), session);
    }

    #[test]
    fn test_restore_rejects_unknown_stage() {
        let registry = SessionRegistry::new();
        let mut value = serde_json::to_value(Session::new(PlayerId::new("p1"))).unwrap();
        value["current_stage"] = Value::from(9);

        let error = registry.restore(&value.to_string()).unwrap_err();
        assert_eq!(error, ProgressionError::UnknownStage(9));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_restore_rejects_garbage() {
        let registry = SessionRegistry::new();
        assert!(matches!(
            registry.restore("{not json"),
            Err(ProgressionError::Snapshot(_))
        ));
    }
}
