//! Event publisher trait and in-process implementations

use crate::error::Result;
use crate::types::{MemberLeft, MessagePosted, RoomEvent, SessionEnded, SessionFormed};
use async_trait::async_trait;
use tracing::{debug, info};

/// Trait for publishing session events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a SessionFormed event
    async fn publish_session_formed(&self, event: SessionFormed) -> Result<()>;

    /// Publish a SessionEnded event
    async fn publish_session_ended(&self, event: SessionEnded) -> Result<()>;

    /// Publish a MemberLeft event
    async fn publish_member_left(&self, event: MemberLeft) -> Result<()>;

    /// Publish a MessagePosted event
    async fn publish_message_posted(&self, event: MessagePosted) -> Result<()>;
}

/// Publisher that writes events to the structured log
///
/// The default collaborator in a standalone process; deployments with a
/// real distribution layer replace this with their own implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventPublisher;

impl LoggingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish_session_formed(&self, event: SessionFormed) -> Result<()> {
        info!(
            "Session {} formed with {} member(s), leader '{}'",
            event.session_id,
            event.members.len(),
            event.leader_id
        );
        Ok(())
    }

    async fn publish_session_ended(&self, event: SessionEnded) -> Result<()> {
        info!(
            "Session {} ended at {}",
            event.session.id,
            event
                .session
                .ended_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "<unset>".to_string())
        );
        Ok(())
    }

    async fn publish_member_left(&self, event: MemberLeft) -> Result<()> {
        info!("User '{}' left session {}", event.user_id, event.session_id);
        Ok(())
    }

    async fn publish_message_posted(&self, event: MessagePosted) -> Result<()> {
        debug!(
            "Message {} posted to session {}",
            event.message.id, event.session_id
        );
        Ok(())
    }
}

/// Mock event publisher for testing
#[derive(Debug, Default)]
pub struct MockEventPublisher {
    published_events: std::sync::Mutex<Vec<RoomEvent>>,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all published events (for testing)
    pub fn get_published_events(&self) -> Vec<RoomEvent> {
        self.published_events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Count events of specific type
    pub fn count_events_of_type(&self, event_type: &str) -> usize {
        self.get_published_events()
            .iter()
            .filter(|event| match event {
                RoomEvent::SessionFormed(_) => event_type == "SessionFormed",
                RoomEvent::SessionEnded(_) => event_type == "SessionEnded",
                RoomEvent::MemberLeft(_) => event_type == "MemberLeft",
                RoomEvent::MessagePosted(_) => event_type == "MessagePosted",
            })
            .count()
    }

    /// Clear published events (for testing)
    pub fn clear_events(&self) {
        if let Ok(mut events) = self.published_events.lock() {
            events.clear();
        }
    }
}

#[async_trait]
impl EventPublisher for MockEventPublisher {
    async fn publish_session_formed(&self, event: SessionFormed) -> Result<()> {
        if let Ok(mut events) = self.published_events.lock() {
            events.push(RoomEvent::SessionFormed(event));
        }
        Ok(())
    }

    async fn publish_session_ended(&self, event: SessionEnded) -> Result<()> {
        if let Ok(mut events) = self.published_events.lock() {
            events.push(RoomEvent::SessionEnded(event));
        }
        Ok(())
    }

    async fn publish_member_left(&self, event: MemberLeft) -> Result<()> {
        if let Ok(mut events) = self.published_events.lock() {
            events.push(RoomEvent::MemberLeft(event));
        }
        Ok(())
    }

    async fn publish_message_posted(&self, event: MessagePosted) -> Result<()> {
        if let Ok(mut events) = self.published_events.lock() {
            events.push(RoomEvent::MessagePosted(event));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{current_timestamp, generate_session_id};

    #[tokio::test]
    async fn test_mock_publisher_captures_events() {
        let publisher = MockEventPublisher::new();

        publisher
            .publish_member_left(MemberLeft {
                session_id: generate_session_id(),
                user_id: "u1".to_string(),
                timestamp: current_timestamp(),
            })
            .await
            .unwrap();

        assert_eq!(publisher.count_events_of_type("MemberLeft"), 1);
        assert_eq!(publisher.count_events_of_type("SessionFormed"), 0);

        publisher.clear_events();
        assert!(publisher.get_published_events().is_empty());
    }

    #[tokio::test]
    async fn test_logging_publisher_accepts_all_events() {
        let publisher = LoggingEventPublisher::new();

        publisher
            .publish_session_formed(SessionFormed {
                session_id: generate_session_id(),
                leader_id: "u1".to_string(),
                members: vec![],
                timestamp: current_timestamp(),
            })
            .await
            .unwrap();
    }
}
