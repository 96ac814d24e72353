//! Candidate pool provider interface and static implementation
//!
//! Matchmaking asks the pool for prospective teammates by role. The
//! lookup is pure and synchronous from the core's point of view; matching
//! quality and fairness live entirely behind this trait.

use crate::types::UserProfile;
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

/// Trait for supplying candidate teammates for a role
pub trait CandidateProvider: Send + Sync {
    /// Candidate profiles for `role`, in offer order. Unknown roles
    /// yield an empty list.
    fn select_candidates(&self, role: &str) -> Vec<UserProfile>;
}

/// Static in-memory candidate directory keyed by role
#[derive(Debug, Default)]
pub struct StaticCandidateDirectory {
    pools: RwLock<HashMap<String, Vec<UserProfile>>>,
}

impl StaticCandidateDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory with pre-configured sample pools
    ///
    /// Each role pool ends with one automated helper so formed rosters
    /// have a responder participant.
    pub fn with_sample_users() -> Self {
        let directory = Self::new();

        let engineers = vec![
            sample_user("user-eng-1", "nadia.santos", "Nadia Santos", "Engineer", &["rust", "sql"]),
            sample_user("user-eng-2", "tomas.rivera", "Tomas Rivera", "Engineer", &["go", "kubernetes"]),
            sample_helper("helper-eng-1", "devbot", "Dev Helper", "Engineer"),
        ];
        let designers = vec![
            sample_user("user-des-1", "mei.lin", "Mei Lin", "Designer", &["figma", "typography"]),
            sample_user("user-des-2", "owen.clarke", "Owen Clarke", "Designer", &["illustration"]),
            sample_helper("helper-des-1", "designbot", "Design Helper", "Designer"),
        ];
        let managers = vec![
            sample_user("user-pm-1", "priya.nair", "Priya Nair", "Product Manager", &["roadmaps"]),
            sample_user("user-pm-2", "jonas.meyer", "Jonas Meyer", "Product Manager", &["analytics"]),
            sample_helper("helper-pm-1", "planbot", "Planning Helper", "Product Manager"),
        ];

        {
            let mut pools = directory.pools.write().unwrap();
            pools.insert("Engineer".to_string(), engineers);
            pools.insert("Designer".to_string(), designers);
            pools.insert("Product Manager".to_string(), managers);
        }

        directory
    }

    /// Add a candidate to a role pool, creating the pool if needed
    pub fn add_candidate(&self, role: &str, profile: UserProfile) {
        if let Ok(mut pools) = self.pools.write() {
            pools.entry(role.to_string()).or_default().push(profile);
        }
    }

    /// Replace the whole pool for a role
    pub fn set_pool(&self, role: &str, profiles: Vec<UserProfile>) {
        if let Ok(mut pools) = self.pools.write() {
            pools.insert(role.to_string(), profiles);
        }
    }

    /// Roles with a configured pool
    pub fn available_roles(&self) -> Vec<String> {
        self.pools
            .read()
            .map(|pools| pools.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl CandidateProvider for StaticCandidateDirectory {
    fn select_candidates(&self, role: &str) -> Vec<UserProfile> {
        self.pools
            .read()
            .map(|pools| pools.get(role).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

/// Build a sample human profile
fn sample_user(id: &str, username: &str, name: &str, role: &str, skills: &[&str]) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        username: username.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        avatar: format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", username),
        is_automated: false,
    }
}

/// Build a sample automated helper profile
fn sample_helper(id: &str, username: &str, name: &str, role: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        username: username.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        skills: BTreeSet::new(),
        avatar: format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", username),
        is_automated: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_pools_by_role() {
        let directory = StaticCandidateDirectory::with_sample_users();

        let engineers = directory.select_candidates("Engineer");
        assert_eq!(engineers.len(), 3);
        assert!(engineers.iter().all(|c| c.role == "Engineer"));
        assert!(engineers.iter().any(|c| c.is_automated));

        let designers = directory.select_candidates("Designer");
        assert_eq!(designers.len(), 3);
    }

    #[test]
    fn test_unknown_role_yields_empty_pool() {
        let directory = StaticCandidateDirectory::with_sample_users();
        assert!(directory.select_candidates("Astronaut").is_empty());
    }

    #[test]
    fn test_add_candidate() {
        let directory = StaticCandidateDirectory::new();
        assert!(directory.select_candidates("Engineer").is_empty());

        directory.add_candidate(
            "Engineer",
            sample_user("u9", "new.user", "New User", "Engineer", &[]),
        );
        let pool = directory.select_candidates("Engineer");
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].id, "u9");
    }

    #[test]
    fn test_selection_returns_copies() {
        let directory = StaticCandidateDirectory::with_sample_users();
        let first = directory.select_candidates("Engineer");
        let second = directory.select_candidates("Engineer");
        // Same content, independent values
        assert_eq!(first, second);
    }
}
