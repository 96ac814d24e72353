//! Identity provider interface and static implementation
//!
//! The core treats identity as read-only: it asks who the current actor
//! is and never mutates the answer. Profiles are returned by value so a
//! formed roster keeps its snapshot even if the signed-in profile is
//! later edited.

use crate::types::UserProfile;
use std::sync::RwLock;

/// Trait for supplying the current actor's profile
pub trait IdentityProvider: Send + Sync {
    /// Profile of the signed-in user, or `None` when signed out
    fn current_user(&self) -> Option<UserProfile>;
}

/// Static in-memory identity provider
///
/// Holds at most one signed-in profile. Real deployments would back this
/// with the credential store; the core only ever calls `current_user`.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    user: RwLock<Option<UserProfile>>,
}

impl StaticIdentityProvider {
    /// Create a provider with nobody signed in
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider with `profile` already signed in
    pub fn signed_in(profile: UserProfile) -> Self {
        Self {
            user: RwLock::new(Some(profile)),
        }
    }

    /// Sign a user in, replacing any previous identity
    pub fn sign_in(&self, profile: UserProfile) {
        if let Ok(mut user) = self.user.write() {
            *user = Some(profile);
        }
    }

    /// Sign the current user out
    pub fn sign_out(&self) {
        if let Ok(mut user) = self.user.write() {
            *user = None;
        }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn current_user(&self) -> Option<UserProfile> {
        self.user.read().map(|user| user.clone()).unwrap_or(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn test_profile(id: &str) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            username: id.to_string(),
            name: format!("Test {}", id),
            role: "Engineer".to_string(),
            skills: BTreeSet::new(),
            avatar: String::new(),
            is_automated: false,
        }
    }

    #[test]
    fn test_sign_in_and_out() {
        let provider = StaticIdentityProvider::new();
        assert!(provider.current_user().is_none());

        provider.sign_in(test_profile("u1"));
        assert_eq!(provider.current_user().unwrap().id, "u1");

        provider.sign_out();
        assert!(provider.current_user().is_none());
    }

    #[test]
    fn test_snapshot_is_detached_from_store() {
        let provider = StaticIdentityProvider::signed_in(test_profile("u1"));
        let snapshot = provider.current_user().unwrap();

        // Replacing the signed-in profile must not reach the snapshot
        let mut edited = test_profile("u1");
        edited.name = "Renamed".to_string();
        provider.sign_in(edited);

        assert_eq!(snapshot.name, "Test u1");
        assert_eq!(provider.current_user().unwrap().name, "Renamed");
    }
}
