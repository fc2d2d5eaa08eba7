//! Context Assembler - Builds the context handed to collaborators.
//!
//! Two shapes are produced:
//! 1. **StageContext**: what the current stage is about and what is still missing.
//!    Used for extraction and stage introductions.
//! 2. **SessionContext**: the stage context plus the profile, recent dialogue,
//!    current map and boss goal. Used for replies and closing narration.
//!
//! Both can be rendered as prompt text with `to_prompt_string`.

use game_rules::{
    ConversationEntry, MapAssignment, PlayerId, Profile, ProfileField, Session, Stage,
    StageController, StageRules,
};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::history::HistoryRecord;

/// How much of a session is included in assembled context.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Conversation entries copied from the session log.
    pub context_window: usize,

    /// History records requested for dialogue replies.
    pub reply_history_limit: usize,

    /// History records requested for stage introductions.
    pub intro_history_limit: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for ContextConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            context_window: config.context_window,
            reply_history_limit: config.reply_history_limit,
            intro_history_limit: config.intro_history_limit,
        }
    }
}

/// Builds collaborator context from session state.
pub struct ContextAssembler {
    config: ContextConfig,
}

impl ContextAssembler {
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ContextConfig::default())
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Context describing the session's current stage.
    pub fn stage_context(&self, session: &Session, history: Vec<HistoryRecord>) -> StageContext {
        let rule = StageRules::for_stage(session.current_stage);

        StageContext {
            player_id: session.player_id.clone(),
            stage: session.current_stage,
            stage_name: session.current_stage.name().to_string(),
            instructions: rule.instructions.to_string(),
            intro_theme: rule.intro_theme.to_string(),
            conversation_goal: rule.conversation_goal.to_string(),
            player_name: session.profile.display_name().to_string(),
            profile_summary: summarize_profile(&session.profile),
            missing: StageController::missing_fields(session)
                .iter()
                .map(|missing| missing.identifier())
                .collect(),
            history,
        }
    }

    /// Full context for dialogue generation.
    pub fn session_context(&self, session: &Session, history: Vec<HistoryRecord>) -> SessionContext {
        SessionContext {
            stage: self.stage_context(session, history),
            profile: session.profile.clone(),
            recent_conversation: session
                .recent_conversation(self.config.context_window)
                .to_vec(),
            current_map: session.current_map.clone(),
            boss_goal: session.boss_goal.clone(),
        }
    }
}

/// Compact, human-readable rendering of what is known about the player.
///
/// Fields are listed in profile order; empty fields are skipped.
pub fn summarize_profile(profile: &Profile) -> String {
    let parts: Vec<String> = ProfileField::ALL
        .iter()
        .filter(|field| profile.is_present(**field))
        .filter_map(|field| {
            let value = match field {
                ProfileField::Age => profile.age.map(|age| age.to_string()),
                _ => profile
                    .text(*field)
                    .map(str::to_string)
                    .or_else(|| profile.sequence(*field).map(|items| items.join(", "))),
            }?;
            Some(format!("{}: {}", field.label(), value))
        })
        .collect();

    if parts.is_empty() {
        "nothing collected yet".to_string()
    } else {
        parts.join("; ")
    }
}

/// What a collaborator needs to know about the current stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageContext {
    pub player_id: PlayerId,
    pub stage: Stage,
    pub stage_name: String,
    pub instructions: String,
    pub intro_theme: String,
    pub conversation_goal: String,

    /// The player's name, or a generic address when unknown.
    pub player_name: String,
    pub profile_summary: String,

    /// Identifiers of profile requirements not yet met.
    pub missing: Vec<String>,

    /// Recent records from the history store.
    pub history: Vec<HistoryRecord>,
}

impl StageContext {
    pub fn to_prompt_string(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!("## Stage {} ({})\n", self.stage.number(), self.stage_name));
        prompt.push_str(&self.instructions);
        prompt.push_str("\n\n");

        prompt.push_str("## Conversation Goal\n");
        prompt.push_str(&self.conversation_goal);
        prompt.push_str("\n\n");

        prompt.push_str("## Player\n");
        prompt.push_str(&format!("Address the player as {}.\n", self.player_name));
        prompt.push_str(&format!("Known so far: {}\n\n", self.profile_summary));

        if !self.missing.is_empty() {
            prompt.push_str("## Still Needed\n");
            for missing in &self.missing {
                prompt.push_str(&format!("- {}\n", missing));
            }
            prompt.push('\n');
        }

        if !self.history.is_empty() {
            prompt.push_str("## Earlier\n");
            for record in &self.history {
                prompt.push_str(&record.to_line());
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        prompt
    }
}

/// Everything a dialogue collaborator needs for a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub stage: StageContext,
    pub profile: Profile,
    pub recent_conversation: Vec<ConversationEntry>,
    pub current_map: Option<MapAssignment>,
    pub boss_goal: Option<String>,
}

impl SessionContext {
    pub fn to_prompt_string(&self) -> String {
        let mut prompt = self.stage.to_prompt_string();

        if let Some(map) = &self.current_map {
            prompt.push_str("## Current Map\n");
            prompt.push_str(&format!("{}: {}\n\n", map.name, map.description));
        }

        if let Some(goal) = &self.boss_goal {
            prompt.push_str("## Final Goal\n");
            prompt.push_str(goal);
            prompt.push_str("\n\n");
        }

        if !self.recent_conversation.is_empty() {
            prompt.push_str("## Recent Conversation\n");
            for entry in &self.recent_conversation {
                prompt.push_str(&format!("{}: {}\n", entry.speaker.as_str(), entry.message));
            }
            prompt.push('\n');
        }

        prompt
    }
}
