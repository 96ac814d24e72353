//! Deferred task scheduling for the session core
//!
//! All temporal behavior (matchmaking completion, responder replies) runs
//! through this scheduler. Every task is tagged with the generation of
//! the search/session it belongs to; terminating that generation aborts
//! its outstanding handles, and task bodies are expected to re-check the
//! generation before touching state so late firings are discarded rather
//! than applied.

pub mod random;

pub use random::{RandomSource, SeededRandomSource, ThreadRandomSource};

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Tag distinguishing a search/session instance from any prior one
pub type Generation = u64;

struct ScheduledTask {
    generation: Generation,
    handle: JoinHandle<()>,
}

/// Scheduler for generation-tagged deferred tasks
#[derive(Default)]
pub struct TaskScheduler {
    tasks: Mutex<Vec<ScheduledTask>>,
}

impl TaskScheduler {
    /// Create a new scheduler with no pending tasks
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`, tagged with `generation`
    ///
    /// The abort on cancellation is best-effort; the task body must still
    /// compare its generation against current state before mutating.
    pub fn schedule<F>(&self, generation: Generation, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        if let Ok(mut tasks) = self.tasks.lock() {
            // Drop bookkeeping for tasks that already ran
            tasks.retain(|t| !t.handle.is_finished());
            tasks.push(ScheduledTask { generation, handle });
        }
    }

    /// Abort every pending task tagged with `generation`; returns how
    /// many handles were cancelled
    pub fn cancel_generation(&self, generation: Generation) -> usize {
        let mut cancelled = 0;
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.retain(|t| {
                if t.generation == generation {
                    if !t.handle.is_finished() {
                        t.handle.abort();
                        cancelled += 1;
                    }
                    false
                } else {
                    true
                }
            });
        }

        if cancelled > 0 {
            debug!(
                "Cancelled {} pending task(s) for generation {}",
                cancelled, generation
            );
        }
        cancelled
    }

    /// Abort all pending tasks regardless of generation
    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                if !task.handle.is_finished() {
                    task.handle.abort();
                    cancelled += 1;
                }
            }
        }
        cancelled
    }

    /// Number of tasks scheduled but not yet run
    pub fn pending_count(&self) -> usize {
        self.tasks
            .lock()
            .map(|tasks| tasks.iter().filter(|t| !t.handle.is_finished()).count())
            .unwrap_or(0)
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        // Covers logout/teardown: nothing scheduled may outlive its context
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_task_fires_after_delay() {
        let scheduler = TaskScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        scheduler.schedule(1, Duration::from_millis(100), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(scheduler.pending_count(), 1);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_generation_prevents_firing() {
        let scheduler = TaskScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        scheduler.schedule(7, Duration::from_millis(100), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(scheduler.cancel_generation(7), 1);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_only_matching_generation() {
        let scheduler = TaskScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for generation in [1u64, 1, 2] {
            let counter = fired.clone();
            scheduler.schedule(generation, Duration::from_millis(100), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(scheduler.cancel_generation(1), 2);
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Only the generation-2 task survived
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_multiple_pending_tasks_each_fire_once() {
        let scheduler = TaskScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for delay_ms in [50u64, 100, 150] {
            let counter = fired.clone();
            scheduler.schedule(1, Duration::from_millis(delay_ms), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_pending_tasks() {
        let fired = Arc::new(AtomicUsize::new(0));

        {
            let scheduler = TaskScheduler::new();
            let counter = fired.clone();
            scheduler.schedule(1, Duration::from_millis(100), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
