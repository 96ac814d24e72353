//! Error types for the session matchmaking service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

use crate::types::{MatchmakingState, UserId};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific session scenarios
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Operation '{operation}' not allowed while matchmaking is {state}")]
    InvalidState {
        operation: &'static str,
        state: MatchmakingState,
    },

    #[error("User '{user_id}' is not authorized to {action}")]
    NotAuthorized {
        user_id: UserId,
        action: &'static str,
    },

    #[error("Message text is empty")]
    EmptyInput,

    #[error("No active session for operation '{operation}'")]
    NoActiveSession { operation: &'static str },

    #[error("No signed-in user")]
    Unauthenticated,

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
