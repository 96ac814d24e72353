//! Simulated responder participants
//!
//! When a user posts into a session whose roster contains an automated
//! member, that member replies once after a randomized delay. Reply text
//! comes from a `ResponseSource` so real backends (or tests) can swap the
//! canned lines out.

use crate::scheduler::RandomSource;
use crate::types::{UserId, UserProfile};
use std::sync::Arc;

/// Trait for producing responder message text
pub trait ResponseSource: Send + Sync {
    /// Next reply line
    fn next_response(&self) -> String;
}

/// Canned responder lines picked via the injected random source
pub struct CannedResponses {
    lines: Vec<String>,
    rng: Arc<dyn RandomSource>,
}

impl CannedResponses {
    /// Create a source with the default reply lines
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        let lines = [
            "Sounds good, let's do it!",
            "I can pick that part up.",
            "Agreed. What's our first milestone?",
            "Let me share a quick draft in a bit.",
            "Good point, I hadn't considered that.",
            "Can you expand on that a little?",
            "I'll look into it and report back.",
            "Nice progress so far, team.",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        Self { lines, rng }
    }

    /// Create a source with custom reply lines
    pub fn with_lines(lines: Vec<String>, rng: Arc<dyn RandomSource>) -> Self {
        Self { lines, rng }
    }
}

impl ResponseSource for CannedResponses {
    fn next_response(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        self.lines[self.rng.pick_index(self.lines.len())].clone()
    }
}

/// Pick the roster member that should answer a message from `exclude`
///
/// The first automated member that is not the sender answers; a roster
/// without automated members produces no responder at all.
pub fn pick_responder<'a>(
    members: &'a [UserProfile],
    exclude: &UserId,
) -> Option<&'a UserProfile> {
    members
        .iter()
        .find(|member| member.is_automated && member.id != *exclude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SeededRandomSource;
    use std::collections::BTreeSet;

    fn member(id: &str, is_automated: bool) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            username: id.to_string(),
            name: id.to_string(),
            role: "Engineer".to_string(),
            skills: BTreeSet::new(),
            avatar: String::new(),
            is_automated,
        }
    }

    #[test]
    fn test_pick_responder_prefers_first_automated_member() {
        let members = vec![
            member("u1", false),
            member("helper-1", true),
            member("helper-2", true),
        ];

        let responder = pick_responder(&members, &"u1".to_string()).unwrap();
        assert_eq!(responder.id, "helper-1");
    }

    #[test]
    fn test_pick_responder_skips_the_sender() {
        let members = vec![member("helper-1", true), member("helper-2", true)];

        let responder = pick_responder(&members, &"helper-1".to_string()).unwrap();
        assert_eq!(responder.id, "helper-2");
    }

    #[test]
    fn test_no_automated_member_means_no_responder() {
        let members = vec![member("u1", false), member("u2", false)];
        assert!(pick_responder(&members, &"u1".to_string()).is_none());
    }

    #[test]
    fn test_canned_responses_are_deterministic_with_seed() {
        let a = CannedResponses::new(Arc::new(SeededRandomSource::new(9)));
        let b = CannedResponses::new(Arc::new(SeededRandomSource::new(9)));

        let lines_a: Vec<String> = (0..5).map(|_| a.next_response()).collect();
        let lines_b: Vec<String> = (0..5).map(|_| b.next_response()).collect();
        assert_eq!(lines_a, lines_b);
        assert!(lines_a.iter().all(|line| !line.is_empty()));
    }

    #[test]
    fn test_custom_lines() {
        let source = CannedResponses::with_lines(
            vec!["only line".to_string()],
            Arc::new(SeededRandomSource::new(1)),
        );
        assert_eq!(source.next_response(), "only line");
    }
}
