//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the huddle-room session
//! service using Prometheus metrics.

use crate::types::MessageKind;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the session service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Session lifecycle metrics
    session_metrics: SessionMetrics,

    /// Chat pipeline metrics
    chat_metrics: ChatMetrics,

    /// Scheduler metrics
    scheduler_metrics: SchedulerMetrics,
}

/// Session lifecycle metrics
#[derive(Clone)]
pub struct SessionMetrics {
    /// Total matchmaking searches started
    pub searches_started_total: IntCounter,

    /// Total sessions formed by matchmaking completion
    pub sessions_formed_total: IntCounter,

    /// Total sessions ended by their leader
    pub sessions_ended_total: IntCounter,

    /// Total sessions abandoned via leave
    pub sessions_left_total: IntCounter,

    /// Active sessions for this context (0 or 1)
    pub active_sessions: IntGauge,

    /// Time from search start to session formation
    pub search_duration_seconds: Histogram,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,
}

/// Chat pipeline metrics
#[derive(Clone)]
pub struct ChatMetrics {
    /// Total messages appended, by kind
    pub messages_posted_total: IntCounterVec,

    /// Total synthesized responder messages delivered
    pub responder_messages_total: IntCounter,
}

/// Scheduler metrics
#[derive(Clone)]
pub struct SchedulerMetrics {
    /// Total deferred tasks scheduled, by kind
    pub tasks_scheduled_total: IntCounterVec,

    /// Total pending tasks aborted on session termination
    pub tasks_cancelled_total: IntCounter,

    /// Total late firings discarded by the generation guard
    pub stale_firings_discarded_total: IntCounter,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let session_metrics = SessionMetrics::new(&registry)?;
        let chat_metrics = ChatMetrics::new(&registry)?;
        let scheduler_metrics = SchedulerMetrics::new(&registry)?;

        Ok(Self {
            registry,
            session_metrics,
            chat_metrics,
            scheduler_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get session metrics
    pub fn session(&self) -> &SessionMetrics {
        &self.session_metrics
    }

    /// Get chat metrics
    pub fn chat(&self) -> &ChatMetrics {
        &self.chat_metrics
    }

    /// Get scheduler metrics
    pub fn scheduler(&self) -> &SchedulerMetrics {
        &self.scheduler_metrics
    }

    /// Record a matchmaking search starting
    pub fn record_search_started(&self) {
        self.session_metrics.searches_started_total.inc();
    }

    /// Record a session forming
    pub fn record_session_formed(&self) {
        self.session_metrics.sessions_formed_total.inc();
        self.session_metrics.active_sessions.set(1);
    }

    /// Record a session being ended by its leader
    pub fn record_session_ended(&self) {
        self.session_metrics.sessions_ended_total.inc();
        self.session_metrics.active_sessions.set(0);
    }

    /// Record a session being abandoned via leave
    pub fn record_session_left(&self) {
        self.session_metrics.sessions_left_total.inc();
        self.session_metrics.active_sessions.set(0);
    }

    /// Record search time from start to formation
    pub fn observe_search_duration(&self, duration: Duration) {
        self.session_metrics
            .search_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Record a message being appended to the log
    pub fn record_message_posted(&self, kind: MessageKind) {
        let kind_str = match kind {
            MessageKind::System => "system",
            MessageKind::User => "user",
        };

        self.chat_metrics
            .messages_posted_total
            .with_label_values(&[kind_str])
            .inc();
    }

    /// Record a synthesized responder message being delivered
    pub fn record_responder_message(&self) {
        self.chat_metrics.responder_messages_total.inc();
    }

    /// Record a deferred task being scheduled
    pub fn record_task_scheduled(&self, kind: &str) {
        self.scheduler_metrics
            .tasks_scheduled_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Record pending tasks being aborted
    pub fn record_tasks_cancelled(&self, count: usize) {
        self.scheduler_metrics
            .tasks_cancelled_total
            .inc_by(count as u64);
    }

    /// Record a late firing being discarded by the generation guard
    pub fn record_stale_firing_discarded(&self) {
        self.scheduler_metrics.stale_firings_discarded_total.inc();
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.session_metrics.health_status.set(status as i64);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}

impl SessionMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let searches_started_total = IntCounter::new(
            "huddle_room_searches_started_total",
            "Total matchmaking searches started",
        )?;
        registry.register(Box::new(searches_started_total.clone()))?;

        let sessions_formed_total = IntCounter::new(
            "huddle_room_sessions_formed_total",
            "Total sessions formed",
        )?;
        registry.register(Box::new(sessions_formed_total.clone()))?;

        let sessions_ended_total = IntCounter::new(
            "huddle_room_sessions_ended_total",
            "Total sessions ended by their leader",
        )?;
        registry.register(Box::new(sessions_ended_total.clone()))?;

        let sessions_left_total = IntCounter::new(
            "huddle_room_sessions_left_total",
            "Total sessions abandoned via leave",
        )?;
        registry.register(Box::new(sessions_left_total.clone()))?;

        let active_sessions = IntGauge::new(
            "huddle_room_active_sessions",
            "Active sessions for this context",
        )?;
        registry.register(Box::new(active_sessions.clone()))?;

        let search_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "huddle_room_search_duration_seconds",
                "Time from search start to session formation",
            )
            .buckets(vec![0.5, 1.0, 2.0, 3.0, 5.0, 10.0, 30.0]),
        )?;
        registry.register(Box::new(search_duration_seconds.clone()))?;

        let health_status = IntGauge::new(
            "huddle_room_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        Ok(Self {
            searches_started_total,
            sessions_formed_total,
            sessions_ended_total,
            sessions_left_total,
            active_sessions,
            search_duration_seconds,
            health_status,
        })
    }
}

impl ChatMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let messages_posted_total = IntCounterVec::new(
            Opts::new(
                "huddle_room_messages_posted_total",
                "Total messages appended to session logs",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(messages_posted_total.clone()))?;

        let responder_messages_total = IntCounter::new(
            "huddle_room_responder_messages_total",
            "Total synthesized responder messages delivered",
        )?;
        registry.register(Box::new(responder_messages_total.clone()))?;

        Ok(Self {
            messages_posted_total,
            responder_messages_total,
        })
    }
}

impl SchedulerMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let tasks_scheduled_total = IntCounterVec::new(
            Opts::new(
                "huddle_room_tasks_scheduled_total",
                "Total deferred tasks scheduled",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(tasks_scheduled_total.clone()))?;

        let tasks_cancelled_total = IntCounter::new(
            "huddle_room_tasks_cancelled_total",
            "Total pending tasks aborted on session termination",
        )?;
        registry.register(Box::new(tasks_cancelled_total.clone()))?;

        let stale_firings_discarded_total = IntCounter::new(
            "huddle_room_stale_firings_discarded_total",
            "Total late firings discarded by the generation guard",
        )?;
        registry.register(Box::new(stale_firings_discarded_total.clone()))?;

        Ok(Self {
            tasks_scheduled_total,
            tasks_cancelled_total,
            stale_firings_discarded_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_creation() {
        let collector = MetricsCollector::new().unwrap();
        let families = collector.registry().gather();
        assert!(!families.is_empty());
    }

    #[test]
    fn test_session_lifecycle_counters() {
        let collector = MetricsCollector::new().unwrap();

        collector.record_search_started();
        collector.record_session_formed();
        assert_eq!(collector.session().searches_started_total.get(), 1);
        assert_eq!(collector.session().sessions_formed_total.get(), 1);
        assert_eq!(collector.session().active_sessions.get(), 1);

        collector.record_session_ended();
        assert_eq!(collector.session().sessions_ended_total.get(), 1);
        assert_eq!(collector.session().active_sessions.get(), 0);
    }

    #[test]
    fn test_message_counters_by_kind() {
        let collector = MetricsCollector::new().unwrap();

        collector.record_message_posted(MessageKind::System);
        collector.record_message_posted(MessageKind::User);
        collector.record_message_posted(MessageKind::User);

        assert_eq!(
            collector
                .chat()
                .messages_posted_total
                .with_label_values(&["user"])
                .get(),
            2
        );
        assert_eq!(
            collector
                .chat()
                .messages_posted_total
                .with_label_values(&["system"])
                .get(),
            1
        );
    }

    #[test]
    fn test_scheduler_counters() {
        let collector = MetricsCollector::new().unwrap();

        collector.record_task_scheduled("responder");
        collector.record_tasks_cancelled(2);
        collector.record_stale_firing_discarded();

        assert_eq!(collector.scheduler().tasks_cancelled_total.get(), 2);
        assert_eq!(
            collector.scheduler().stale_firings_discarded_total.get(),
            1
        );
    }

    #[test]
    fn test_metric_names_carry_service_prefix() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_search_started();

        let names: Vec<String> = collector
            .registry()
            .gather()
            .iter()
            .map(|mf| mf.get_name().to_string())
            .collect();

        assert!(names.iter().all(|name| name.starts_with("huddle_room_")));
    }
}
