//! # Narrative Core (The Journey)
//!
//! The engine that moves players through the eight stages of their journey.
//! It reads and updates sessions defined in `game_rules` and talks to the
//! external services that extract facts, write dialogue, recommend maps and
//! store history.
//!
//! ## Core Components
//!
//! - **orchestrator**: Runs each player turn and every stage transition
//! - **registry**: Concurrent map of live sessions, one lock per player
//! - **context_assembler**: Builds the context handed to collaborators
//! - **collaborators**: Ports for the external services
//! - **history**: History records and an in-memory store
//!
//! ## Design Philosophy
//!
//! - **Rules Elsewhere**: Completion and merging decisions live in `game_rules`
//! - **Never Stuck**: A failing collaborator degrades the turn, it never fails it
//! - **Forward Only**: Stages only advance, and a transition is never undone

pub mod collaborators;
pub mod config;
pub mod context_assembler;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod registry;

#[cfg(test)]
pub(crate) mod telemetry;

pub use collaborators::*;
pub use config::*;
pub use context_assembler::*;
pub use error::*;
pub use history::*;
pub use orchestrator::*;
pub use registry::*;
