//! Append-only message log scoped to one session's lifetime

use crate::types::ChatMessage;
use chrono::{DateTime, Duration, Utc};

/// Ordered log of chat messages for the active session
///
/// Messages append in the order their producing events complete, and the
/// stored timestamps are strictly increasing: an append whose wall clock
/// did not advance past the previous entry is nudged forward by one
/// microsecond.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
}

impl MessageLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, enforcing timestamp monotonicity
    pub fn append(&mut self, mut message: ChatMessage) -> &ChatMessage {
        if let Some(last) = self.messages.last() {
            if message.timestamp <= last.timestamp {
                message.timestamp = last.timestamp + Duration::microseconds(1);
            }
        }
        self.messages.push(message);
        self.messages.last().expect("log is non-empty after push")
    }

    /// All messages in append order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Timestamp of the newest entry, if any
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.messages.last().map(|m| m.timestamp)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Discard the log. Called on session termination; terminated logs
    /// are not archived.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
