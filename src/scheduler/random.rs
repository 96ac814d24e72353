//! Injectable randomness for leader election and responder timing
//!
//! Production uses the thread-local generator; tests inject a seeded
//! generator so leader choice and reply delays are exact.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

/// Source of the randomness the session core needs
pub trait RandomSource: Send + Sync {
    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick_index(&self, len: usize) -> usize;

    /// Uniform duration in `min..=max`
    fn delay_within(&self, min: Duration, max: Duration) -> Duration;
}

/// Thread-local RNG backed source for production use
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandomSource;

impl RandomSource for ThreadRandomSource {
    fn pick_index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }

    fn delay_within(&self, min: Duration, max: Duration) -> Duration {
        if min >= max {
            return min;
        }
        let millis = rand::thread_rng().gen_range(min.as_millis() as u64..=max.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

/// Seeded RNG source for deterministic tests
#[derive(Debug)]
pub struct SeededRandomSource {
    rng: Mutex<StdRng>,
}

impl SeededRandomSource {
    /// Create a source that replays the same sequence for a given seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandomSource {
    fn pick_index(&self, len: usize) -> usize {
        self.rng
            .lock()
            .map(|mut rng| rng.gen_range(0..len))
            .unwrap_or(0)
    }

    fn delay_within(&self, min: Duration, max: Duration) -> Duration {
        if min >= max {
            return min;
        }
        let millis = self
            .rng
            .lock()
            .map(|mut rng| rng.gen_range(min.as_millis() as u64..=max.as_millis() as u64))
            .unwrap_or(min.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_source_is_reproducible() {
        let a = SeededRandomSource::new(42);
        let b = SeededRandomSource::new(42);

        let picks_a: Vec<usize> = (0..10).map(|_| a.pick_index(4)).collect();
        let picks_b: Vec<usize> = (0..10).map(|_| b.pick_index(4)).collect();
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn test_pick_index_in_bounds() {
        let source = ThreadRandomSource;
        for _ in 0..100 {
            assert!(source.pick_index(4) < 4);
        }
        assert_eq!(source.pick_index(1), 0);
    }

    #[test]
    fn test_delay_within_window() {
        let source = SeededRandomSource::new(7);
        let min = Duration::from_millis(1000);
        let max = Duration::from_millis(2000);

        for _ in 0..100 {
            let delay = source.delay_within(min, max);
            assert!(delay >= min && delay <= max);
        }
    }

    #[test]
    fn test_degenerate_window_returns_min() {
        let source = ThreadRandomSource;
        let fixed = Duration::from_millis(500);
        assert_eq!(source.delay_within(fixed, fixed), fixed);
    }
}
