//! Session instance and lifecycle invariants
//!
//! A session is formed once, with a fixed roster and an elected leader,
//! stays Active until terminated, and becomes immutable once Ended.

use crate::error::{Result, SessionError};
use crate::types::{SessionId, SessionStatus, UserId, UserProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One matchmaking-formed group (aka Room)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub status: SessionStatus,
    pub leader_id: UserId,
    /// Fixed at formation time; no mid-session join/leave
    pub members: Vec<UserProfile>,
    pub created_at: DateTime<Utc>,
    /// Set iff `status == Ended`
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Form a new Active session, validating the roster invariants:
    /// non-empty membership, unique member ids, leader among members.
    pub fn form(
        id: SessionId,
        members: Vec<UserProfile>,
        leader_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        if members.is_empty() {
            return Err(SessionError::InternalError {
                message: "Session roster cannot be empty".to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        for member in &members {
            if !seen.insert(member.id.as_str()) {
                return Err(SessionError::InternalError {
                    message: format!("Duplicate member id '{}' in session roster", member.id),
                }
                .into());
            }
        }

        if !seen.contains(leader_id.as_str()) {
            return Err(SessionError::InternalError {
                message: format!("Leader '{}' is not a session member", leader_id),
            }
            .into());
        }

        Ok(Self {
            id,
            status: SessionStatus::Active,
            leader_id,
            members,
            created_at,
            ended_at: None,
        })
    }

    /// Whether `user_id` belongs to the roster
    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.id == user_id)
    }

    /// Whether `user_id` is the elected leader
    pub fn is_leader(&self, user_id: &str) -> bool {
        self.leader_id == user_id
    }

    /// Profile of the elected leader
    pub fn leader(&self) -> Option<&UserProfile> {
        self.members.iter().find(|m| m.id == self.leader_id)
    }

    /// Whether the roster carries an automated participant
    pub fn has_automated_member(&self) -> bool {
        self.members.iter().any(|m| m.is_automated)
    }

    /// Transition to Ended at `ended_at`. An Ended session is immutable,
    /// so ending twice is rejected.
    pub fn mark_ended(&mut self, ended_at: DateTime<Utc>) -> Result<()> {
        if self.status == SessionStatus::Ended {
            return Err(SessionError::InternalError {
                message: format!("Session {} is already ended", self.id),
            }
            .into());
        }

        self.status = SessionStatus::Ended;
        self.ended_at = Some(ended_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{current_timestamp, generate_session_id};
    use std::collections::BTreeSet;

    fn test_profile(id: &str, is_automated: bool) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            username: id.to_string(),
            name: format!("Test {}", id),
            role: "Engineer".to_string(),
            skills: BTreeSet::new(),
            avatar: String::new(),
            is_automated,
        }
    }

    #[test]
    fn test_form_active_session() {
        let members = vec![test_profile("u1", false), test_profile("u2", false)];
        let session = Session::form(
            generate_session_id(),
            members,
            "u2".to_string(),
            current_timestamp(),
        )
        .unwrap();

        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.ended_at.is_none());
        assert!(session.is_leader("u2"));
        assert!(!session.is_leader("u1"));
        assert_eq!(session.leader().unwrap().id, "u2");
    }

    #[test]
    fn test_form_rejects_empty_roster() {
        let result = Session::form(
            generate_session_id(),
            vec![],
            "u1".to_string(),
            current_timestamp(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_form_rejects_duplicate_members() {
        let members = vec![test_profile("u1", false), test_profile("u1", false)];
        let result = Session::form(
            generate_session_id(),
            members,
            "u1".to_string(),
            current_timestamp(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_form_rejects_outside_leader() {
        let members = vec![test_profile("u1", false)];
        let result = Session::form(
            generate_session_id(),
            members,
            "stranger".to_string(),
            current_timestamp(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_mark_ended_is_one_way() {
        let members = vec![test_profile("u1", false)];
        let mut session = Session::form(
            generate_session_id(),
            members,
            "u1".to_string(),
            current_timestamp(),
        )
        .unwrap();

        session.mark_ended(current_timestamp()).unwrap();
        assert_eq!(session.status, SessionStatus::Ended);
        assert!(session.ended_at.is_some());

        // Second termination must be rejected
        assert!(session.mark_ended(current_timestamp()).is_err());
    }

    #[test]
    fn test_automated_member_detection() {
        let with_helper = Session::form(
            generate_session_id(),
            vec![test_profile("u1", false), test_profile("helper-1", true)],
            "u1".to_string(),
            current_timestamp(),
        )
        .unwrap();
        assert!(with_helper.has_automated_member());

        let humans_only = Session::form(
            generate_session_id(),
            vec![test_profile("u1", false), test_profile("u2", false)],
            "u1".to_string(),
            current_timestamp(),
        )
        .unwrap();
        assert!(!humans_only.has_automated_member());
    }
}
