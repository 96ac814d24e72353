//! Test fixtures and helpers for integration testing

use huddle_room::chat::CannedResponses;
use huddle_room::config::AppConfig;
use huddle_room::directory::{StaticCandidateDirectory, StaticIdentityProvider};
use huddle_room::events::MockEventPublisher;
use huddle_room::metrics::MetricsCollector;
use huddle_room::scheduler::{RandomSource, SeededRandomSource};
use huddle_room::session::SessionContext;
use huddle_room::types::UserProfile;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Random source with a pinned pick so leader election is exact
pub struct FixedRandom {
    pub index: usize,
    pub delay: Duration,
}

impl RandomSource for FixedRandom {
    fn pick_index(&self, len: usize) -> usize {
        self.index.min(len - 1)
    }

    fn delay_within(&self, _min: Duration, _max: Duration) -> Duration {
        self.delay
    }
}

/// Build a human profile for tests
pub fn profile(id: &str, role: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        username: format!("{}.name", id),
        name: format!("User {}", id),
        role: role.to_string(),
        skills: BTreeSet::new(),
        avatar: String::new(),
        is_automated: false,
    }
}

/// Build an automated helper profile for tests
pub fn helper(id: &str, role: &str) -> UserProfile {
    let mut profile = profile(id, role);
    profile.is_automated = true;
    profile
}

/// Configuration with short timers so paused-clock tests are instant
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.matchmaking.search_delay_ms = 10;
    config.chat.responder_min_delay_ms = 50;
    config.chat.responder_max_delay_ms = 100;
    config
}

/// A fully wired context plus the collaborators tests assert against
pub struct TestSystem {
    pub context: SessionContext,
    pub identity: Arc<StaticIdentityProvider>,
    pub directory: Arc<StaticCandidateDirectory>,
    pub publisher: Arc<MockEventPublisher>,
}

/// Build a test system for `actor`, electing `members[leader_index]`
/// once the roster forms
pub fn create_test_system(actor: UserProfile, leader_index: usize) -> TestSystem {
    let identity = Arc::new(StaticIdentityProvider::signed_in(actor));
    let directory = Arc::new(StaticCandidateDirectory::new());
    let publisher = Arc::new(MockEventPublisher::new());
    let rng = Arc::new(FixedRandom {
        index: leader_index,
        delay: Duration::from_millis(50),
    });

    let context = SessionContext::with_components(
        fast_config(),
        identity.clone(),
        directory.clone(),
        publisher.clone(),
        Arc::new(CannedResponses::new(Arc::new(SeededRandomSource::new(7)))),
        rng,
        Arc::new(MetricsCollector::new().expect("metrics collector")),
    );

    TestSystem {
        context,
        identity,
        directory,
        publisher,
    }
}
