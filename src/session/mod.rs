//! Session lifecycle management for the matchmaking service
//!
//! This module owns the per-actor state machine: matchmaking progress,
//! the single active session, the live message log, and the history of
//! terminated sessions.

pub mod context;
pub mod history;
pub mod instance;

// Re-export commonly used types
pub use context::SessionContext;
pub use history::SessionHistory;
pub use instance::Session;
