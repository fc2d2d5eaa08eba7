//! Progression orchestrator - runs a player turn end to end.
//!
//! A turn goes through these steps:
//! 1. **Record**: append the player message to the session log.
//! 2. **Extract**: ask the extractor for profile facts and merge them.
//! 3. **Evaluate**: check the current stage's exit criteria.
//! 4. **Respond**: advance the stage (new map, intro narration), finish the
//!    game at the boss stage, ask for missing information, or reply.
//!
//! Collaborator failures never fail a turn: extraction errors skip the merge
//! and narration errors fall back to fixed texts. A transition, once made, is
//! never rolled back.

pub mod fallback;
mod maps;

use game_rules::{
    ConversationEntry, MapAssignment, MissingField, PlayerId, ProfileAggregator, Session, Stage,
    StageController, StatusSummary,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::collaborators::{DialogueGenerator, HistoryStore, InfoExtractor, MapProvider};
use crate::config::EngineConfig;
use crate::context_assembler::{ContextAssembler, ContextConfig};
use crate::error::{CollaboratorError, ProgressionError};
use crate::history::HistoryRecord;
use crate::registry::SessionRegistry;

/// The external services a [`ProgressionOrchestrator`] talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn InfoExtractor>,
    pub dialogue: Arc<dyn DialogueGenerator>,
    pub maps: Arc<dyn MapProvider>,
    pub history: Arc<dyn HistoryStore>,
}

/// What happened during a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Ordinary dialogue; the stage continues.
    Dialogue,
    /// The NPC asked for missing profile information.
    CollectingInfo,
    /// The player moved to the next stage.
    StageAdvanced { from: Stage, to: Stage },
    /// The boss stage was completed this turn.
    GameCompleted,
    /// The game was already over; nothing changed.
    AlreadyCompleted,
}

/// The result of one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    /// What the NPC says.
    pub narration: String,

    /// Whether a stage was completed this turn.
    pub stage_completed: bool,

    /// The player's stage after the turn.
    pub stage: Stage,

    /// The map assigned this turn, if any.
    pub map: Option<MapAssignment>,

    pub game_completed: bool,
    pub outcome: TurnOutcome,

    /// Identifiers of profile requirements still missing.
    pub missing: Vec<String>,
}

impl TurnResult {
    fn new(session: &Session, narration: String, outcome: TurnOutcome) -> Self {
        Self {
            narration,
            stage_completed: matches!(
                outcome,
                TurnOutcome::StageAdvanced { .. } | TurnOutcome::GameCompleted
            ),
            stage: session.current_stage,
            map: None,
            game_completed: session.game_completed,
            outcome,
            missing: StageController::missing_fields(session)
                .iter()
                .map(MissingField::identifier)
                .collect(),
        }
    }

    fn with_map(mut self, map: Option<MapAssignment>) -> Self {
        self.map = map;
        self
    }
}

/// Run a collaborator call with a time limit; running out counts as a failure.
pub(crate) async fn bounded<T>(
    operation: &'static str,
    limit: Duration,
    call: impl Future<Output = Result<T, CollaboratorError>>,
) -> Result<T, CollaboratorError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(CollaboratorError::Timeout {
            operation,
            after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Drives sessions through their stages.
pub struct ProgressionOrchestrator {
    registry: SessionRegistry,
    collaborators: Collaborators,
    assembler: ContextAssembler,
    config: EngineConfig,
}

impl ProgressionOrchestrator {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        Self {
            registry: SessionRegistry::new(),
            assembler: ContextAssembler::new(ContextConfig::from(&config)),
            collaborators,
            config,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a new game, generating an id when none is given.
    ///
    /// A game already running under the same id is replaced, together with its
    /// used elements and history.
    pub async fn create_session(&self, player_id: Option<PlayerId>) -> PlayerId {
        let player_id = player_id.unwrap_or_else(PlayerId::generate);
        let (handle, created) = self.registry.handle_or_insert(&player_id);
        let mut session = handle.lock().await;

        if !created {
            self.clear_history(&player_id).await;
        }
        *session = self.fresh_session(player_id.clone()).await;

        if created {
            tracing::info!(player_id = %player_id, "Session created");
        } else {
            tracing::info!(player_id = %player_id, "Session replaced by a new game");
        }
        player_id
    }

    /// Throw a session away and start it over at the tutorial.
    pub async fn reset(&self, player_id: &PlayerId) -> Result<PlayerId, ProgressionError> {
        let handle = self.registry.handle(player_id)?;
        let mut session = handle.lock().await;

        self.clear_history(player_id).await;
        *session = self.fresh_session(player_id.clone()).await;
        tracing::info!(player_id = %player_id, "Session reset");
        Ok(player_id.clone())
    }

    pub async fn get(&self, player_id: &PlayerId) -> Result<Session, ProgressionError> {
        self.registry.get(player_id).await
    }

    pub async fn status(&self, player_id: &PlayerId) -> Result<StatusSummary, ProgressionError> {
        self.registry.status(player_id).await
    }

    pub async fn snapshot(&self, player_id: &PlayerId) -> Result<String, ProgressionError> {
        self.registry.snapshot(player_id).await
    }

    pub fn restore(&self, snapshot: &str) -> Result<PlayerId, ProgressionError> {
        self.registry.restore(snapshot)
    }

    /// Signal from the combat system that the current stage's monster is down.
    pub async fn record_monster_defeated(
        &self,
        player_id: &PlayerId,
    ) -> Result<StatusSummary, ProgressionError> {
        let handle = self.registry.handle(player_id)?;
        let mut session = handle.lock().await;
        session.record_monster_defeated();
        tracing::info!(
            player_id = %player_id,
            stage = session.current_stage.number(),
            "Monster defeated"
        );
        Ok(session.status())
    }

    /// Process one player message.
    pub async fn advance(
        &self,
        player_id: &PlayerId,
        message: &str,
    ) -> Result<TurnResult, ProgressionError> {
        let handle = self.registry.handle(player_id)?;
        let mut session = handle.lock().await;

        if session.game_completed {
            tracing::debug!(player_id = %player_id, "Turn on a completed game");
            return Ok(self.already_completed(&session));
        }

        tracing::debug!(
            player_id = %player_id,
            stage = session.current_stage.number(),
            "Processing turn"
        );

        let entry = ConversationEntry::player(message);
        session.add_conversation(entry.clone());
        self.append_history(&session, HistoryRecord::conversation(session.current_stage, &entry))
            .await;

        self.extract_and_merge(&mut session, message).await;

        if StageController::is_stage_complete(&session) {
            return Ok(self.transition(&mut session).await);
        }

        let missing = StageController::missing_fields(&session);
        if missing.is_empty() {
            Ok(self.dialogue_turn(&mut session, message).await)
        } else {
            Ok(self.collection_turn(&mut session, &missing).await)
        }
    }

    /// Explicit request to leave the current stage.
    ///
    /// Rejected with the list of blockers when the stage is not complete.
    pub async fn request_advance(&self, player_id: &PlayerId) -> Result<TurnResult, ProgressionError> {
        let handle = self.registry.handle(player_id)?;
        let mut session = handle.lock().await;

        if session.game_completed {
            return Ok(self.already_completed(&session));
        }

        let blockers = StageController::blockers(&session);
        if !blockers.is_empty() {
            tracing::info!(
                player_id = %player_id,
                stage = session.current_stage.number(),
                blockers = blockers.len(),
                "Advance rejected"
            );
            return Err(ProgressionError::StageAdvanceRejected {
                stage: session.current_stage,
                blockers,
            });
        }

        Ok(self.transition(&mut session).await)
    }

    async fn fresh_session(&self, player_id: PlayerId) -> Session {
        let mut session = Session::new(player_id);
        session.add_conversation(ConversationEntry::npc(self.config.welcome_message.clone()));
        session.assign_map(self.config.tutorial_map.clone());

        let opening = format!(
            "Journey started on {}: {}",
            self.config.tutorial_map.name, self.config.welcome_message
        );
        self.append_history(&session, HistoryRecord::context(Stage::Tutorial, opening))
            .await;
        session
    }

    async fn clear_history(&self, player_id: &PlayerId) {
        if let Err(e) = bounded(
            "history clear",
            self.config.history_timeout(),
            self.collaborators.history.clear(player_id),
        )
        .await
        {
            tracing::warn!(player_id = %player_id, error = %e, "Failed to clear history");
        }
    }

    async fn extract_and_merge(&self, session: &mut Session, message: &str) {
        let context = self.assembler.stage_context(session, Vec::new());
        let extracted = bounded(
            "extraction",
            self.config.extraction_timeout(),
            self.collaborators.extractor.extract(message, &context),
        )
        .await;

        match extracted {
            Ok(facts) if facts.is_empty() => {}
            Ok(facts) => {
                let report = ProfileAggregator::merge(&mut session.profile, &facts);
                tracing::debug!(
                    player_id = %session.player_id,
                    updated = ?report.updated,
                    unchanged = report.unchanged.len(),
                    "Profile merged"
                );
            }
            Err(e) => {
                tracing::warn!(
                    player_id = %session.player_id,
                    error = %e,
                    "Extraction failed, profile unchanged"
                );
            }
        }
    }

    /// Leave a complete stage: advance, or finish the game at the boss stage.
    async fn transition(&self, session: &mut Session) -> TurnResult {
        let completed = session.current_stage;
        self.append_history(session, HistoryRecord::stage_completion(completed))
            .await;

        let Some(entered) = session.advance_stage() else {
            return self.complete_game(session).await;
        };

        tracing::info!(
            player_id = %session.player_id,
            from = completed.number(),
            to = entered.number(),
            "Stage advanced"
        );

        let map = maps::assign_map(
            self.collaborators.maps.as_ref(),
            self.config.map_timeout(),
            session,
        )
        .await;

        let history = self.recent_history(session, self.config.intro_history_limit).await;
        let context = self.assembler.stage_context(session, history);
        let map_name = session
            .current_map
            .as_ref()
            .map(|map| map.name.clone())
            .unwrap_or_else(|| "the road ahead".to_string());

        let narration = match &session.current_map {
            Some(current) => {
                bounded(
                    "intro narration",
                    self.config.narration_timeout(),
                    self.collaborators.dialogue.intro_narration(&context, current),
                )
                .await
            }
            None => Err(CollaboratorError::unavailable("no map to introduce")),
        };
        let narration = narration.unwrap_or_else(|e| {
            tracing::warn!(
                player_id = %session.player_id,
                stage = entered.number(),
                error = %e,
                "Intro narration failed, using fallback"
            );
            fallback::stage_intro(completed, entered, &map_name)
        });

        session.add_conversation(ConversationEntry::npc(narration.clone()));
        self.append_history(session, HistoryRecord::stage_intro(entered, narration.clone()))
            .await;

        TurnResult::new(
            session,
            narration,
            TurnOutcome::StageAdvanced {
                from: completed,
                to: entered,
            },
        )
        .with_map(map)
    }

    async fn complete_game(&self, session: &mut Session) -> TurnResult {
        session.complete_game();
        tracing::info!(player_id = %session.player_id, "Game completed");

        let history = self.recent_history(session, self.config.reply_history_limit).await;
        let context = self.assembler.session_context(session, history);
        let narration = bounded(
            "closing narration",
            self.config.narration_timeout(),
            self.collaborators.dialogue.closing_narration(&context),
        )
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(player_id = %session.player_id, error = %e, "Closing narration failed, using fallback");
            fallback::closing(&session.profile, session.boss_goal.as_deref())
        });

        self.record_npc_line(session, &narration).await;
        TurnResult::new(session, narration, TurnOutcome::GameCompleted)
    }

    async fn collection_turn(&self, session: &mut Session, missing: &[MissingField]) -> TurnResult {
        let history = self.recent_history(session, self.config.reply_history_limit).await;
        let context = self.assembler.session_context(session, history);
        let narration = bounded(
            "collection question",
            self.config.narration_timeout(),
            self.collaborators.dialogue.collection_question(&context, missing),
        )
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(player_id = %session.player_id, error = %e, "Collection question failed, using fallback");
            fallback::collection_question(&session.profile, missing)
        });

        self.record_npc_line(session, &narration).await;
        TurnResult::new(session, narration, TurnOutcome::CollectingInfo)
    }

    async fn dialogue_turn(&self, session: &mut Session, message: &str) -> TurnResult {
        let history = self.recent_history(session, self.config.reply_history_limit).await;
        let context = self.assembler.session_context(session, history);
        let narration = bounded(
            "reply",
            self.config.narration_timeout(),
            self.collaborators.dialogue.reply(message, &context),
        )
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(player_id = %session.player_id, error = %e, "Reply failed, using fallback");
            fallback::reply(&session.profile)
        });

        self.record_npc_line(session, &narration).await;
        TurnResult::new(session, narration, TurnOutcome::Dialogue)
    }

    fn already_completed(&self, session: &Session) -> TurnResult {
        let narration = fallback::closing(&session.profile, session.boss_goal.as_deref());
        TurnResult::new(session, narration, TurnOutcome::AlreadyCompleted)
    }

    async fn record_npc_line(&self, session: &mut Session, narration: &str) {
        let entry = ConversationEntry::npc(narration);
        session.add_conversation(entry.clone());
        self.append_history(session, HistoryRecord::conversation(session.current_stage, &entry))
            .await;
    }

    async fn append_history(&self, session: &Session, record: HistoryRecord) {
        let result = bounded(
            "history append",
            self.config.history_timeout(),
            self.collaborators.history.append(&session.player_id, record),
        )
        .await;
        if let Err(e) = result {
            tracing::warn!(player_id = %session.player_id, error = %e, "Failed to append history");
        }
    }

    async fn recent_history(&self, session: &Session, limit: usize) -> Vec<HistoryRecord> {
        bounded(
            "history lookup",
            self.config.history_timeout(),
            self.collaborators.history.recent(&session.player_id, limit),
        )
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(player_id = %session.player_id, error = %e, "History lookup failed");
            Vec::new()
        })
    }
}
