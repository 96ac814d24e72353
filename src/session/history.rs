//! Append-only store of terminated sessions

use crate::error::{Result, SessionError};
use crate::types::SessionStatus;
use crate::session::Session;
use std::collections::VecDeque;

/// Most-recent-first collection of the actor's ended sessions
///
/// Records are shared read-only once stored; only `endSession` feeds this
/// store (leaving a session records nothing).
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    records: VecDeque<Session>,
}

impl SessionHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a terminated session at the front of the history
    pub fn record(&mut self, session: Session) -> Result<()> {
        if session.status != SessionStatus::Ended || session.ended_at.is_none() {
            return Err(SessionError::InternalError {
                message: format!("Session {} is not terminated", session.id),
            }
            .into());
        }

        self.records.push_front(session);
        Ok(())
    }

    /// All records, most recent first
    pub fn records(&self) -> impl Iterator<Item = &Session> {
        self.records.iter()
    }

    /// Most recently ended session, if any
    pub fn most_recent(&self) -> Option<&Session> {
        self.records.front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserProfile;
    use crate::utils::{current_timestamp, generate_session_id};
    use std::collections::BTreeSet;

    fn ended_session(leader: &str) -> Session {
        let member = UserProfile {
            id: leader.to_string(),
            username: leader.to_string(),
            name: leader.to_string(),
            role: "Engineer".to_string(),
            skills: BTreeSet::new(),
            avatar: String::new(),
            is_automated: false,
        };
        let mut session = Session::form(
            generate_session_id(),
            vec![member],
            leader.to_string(),
            current_timestamp(),
        )
        .unwrap();
        session.mark_ended(current_timestamp()).unwrap();
        session
    }

    #[test]
    fn test_records_are_most_recent_first() {
        let mut history = SessionHistory::new();
        let first = ended_session("u1");
        let second = ended_session("u2");

        history.record(first.clone()).unwrap();
        history.record(second.clone()).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.most_recent().unwrap().id, second.id);
        let ids: Vec<_> = history.records().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_active_session_is_rejected() {
        let mut history = SessionHistory::new();
        let member = UserProfile {
            id: "u1".to_string(),
            username: "u1".to_string(),
            name: "u1".to_string(),
            role: "Engineer".to_string(),
            skills: BTreeSet::new(),
            avatar: String::new(),
            is_automated: false,
        };
        let active = Session::form(
            generate_session_id(),
            vec![member],
            "u1".to_string(),
            current_timestamp(),
        )
        .unwrap();

        assert!(history.record(active).is_err());
        assert!(history.is_empty());
    }
}
