//! Common types used throughout the session matchmaking service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Unique identifier for users (human or automated)
pub type UserId = String;

/// Unique identifier for sessions
pub type SessionId = Uuid;

/// Unique identifier for chat messages
pub type MessageId = Uuid;

/// Profile snapshot of a participant.
///
/// Rosters hold owned copies taken at session-formation time; edits made
/// to the identity store afterwards never reach a formed roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub role: String,
    pub skills: BTreeSet<String>,
    pub avatar: String,
    /// Automated (responder) participants carry this flag explicitly;
    /// there is no id-prefix convention.
    pub is_automated: bool,
}

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    Active,
    Ended,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "Active"),
            SessionStatus::Ended => write!(f, "Ended"),
        }
    }
}

/// Per-actor matchmaking progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchmakingState {
    Idle,
    Searching,
    Matched,
}

impl std::fmt::Display for MatchmakingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchmakingState::Idle => write!(f, "Idle"),
            MatchmakingState::Searching => write!(f, "Searching"),
            MatchmakingState::Matched => write!(f, "Matched"),
        }
    }
}

/// Kind of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    System,
    User,
}

/// One entry in a session's append-only message log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub kind: MessageKind,
    /// Absent for System messages
    pub sender_id: Option<UserId>,
    pub sender_name: Option<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a System message (no sender)
    pub fn system(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: crate::utils::generate_message_id(),
            kind: MessageKind::System,
            sender_id: None,
            sender_name: None,
            text: text.into(),
            timestamp,
        }
    }

    /// Build a User message attributed to `sender`
    pub fn user(sender: &UserProfile, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: crate::utils::generate_message_id(),
            kind: MessageKind::User,
            sender_id: Some(sender.id.clone()),
            sender_name: Some(sender.username.clone()),
            text: text.into(),
            timestamp,
        }
    }
}

/// Event emitted when matchmaking completes and a session forms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFormed {
    pub session_id: SessionId,
    pub leader_id: UserId,
    pub members: Vec<UserProfile>,
    pub timestamp: DateTime<Utc>,
}

/// Event emitted when the leader ends a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEnded {
    pub session: crate::session::Session,
    pub timestamp: DateTime<Utc>,
}

/// Event emitted when a member leaves a session without ending it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberLeft {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
}

/// Event emitted for every message appended to a session log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePosted {
    pub session_id: SessionId,
    pub message: ChatMessage,
}

/// Union type for all published events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomEvent {
    SessionFormed(SessionFormed),
    SessionEnded(SessionEnded),
    MemberLeft(MemberLeft),
    MessagePosted(MessagePosted),
}
