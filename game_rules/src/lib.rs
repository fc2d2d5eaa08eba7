//! # Game Rules
//!
//! The rules crate of the journey engine: stages, their exit criteria, the player
//! profile and how extracted facts are merged into it. Everything here is pure and
//! synchronous; it holds the single source of truth for session state and knows
//! nothing about the services that generate dialogue or maps.

pub mod entities;
pub mod error;
pub mod mechanics;
pub mod session;

pub use entities::*;
pub use error::*;
pub use mechanics::*;
pub use session::*;
