//! Health check endpoints and monitoring
//!
//! This module provides health check functionality for the huddle-room
//! session service, including readiness and liveness probes.

use crate::service::app::AppState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Service version (could be from environment)
    pub version: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional error message if unhealthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Current matchmaking state of the actor context
    pub matchmaking_state: String,
    /// Whether an active session exists
    pub has_active_session: bool,
    /// Messages currently in the live log
    pub messages_in_log: usize,
    /// Terminated sessions recorded in history
    pub sessions_in_history: usize,
    /// Deferred timers scheduled but not yet fired
    pub pending_timers: usize,
    /// Service uptime information
    pub uptime_info: String,
}

impl HealthCheck {
    /// Perform a comprehensive health check of the service
    pub async fn check(app_state: Arc<AppState>) -> Result<Self> {
        let mut checks = Vec::new();
        let mut overall_status = HealthStatus::Healthy;

        // Check if service is running
        let service_check = Self::check_service_running(&app_state).await;
        if service_check.status != HealthStatus::Healthy {
            overall_status = HealthStatus::Unhealthy;
        }
        checks.push(service_check);

        // Check the session context
        let context_check = Self::check_session_context(&app_state);
        if context_check.status == HealthStatus::Unhealthy {
            overall_status = HealthStatus::Unhealthy;
        } else if context_check.status == HealthStatus::Degraded
            && overall_status == HealthStatus::Healthy
        {
            overall_status = HealthStatus::Degraded;
        }
        checks.push(context_check);

        // Gather service statistics
        let stats = Self::gather_service_stats(&app_state);

        Ok(HealthCheck {
            status: overall_status,
            service: app_state.config().service.name.clone(),
            version: std::env::var("SERVICE_VERSION").unwrap_or_else(|_| "unknown".to_string()),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if app_state.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness check - verify service can handle requests
    pub async fn readiness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        // Service must be running
        if !app_state.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }

        // Check if the session context is accessible
        match Self::check_session_context(&app_state).status {
            HealthStatus::Healthy => Ok(HealthStatus::Healthy),
            HealthStatus::Degraded => Ok(HealthStatus::Degraded),
            HealthStatus::Unhealthy => Ok(HealthStatus::Unhealthy),
        }
    }

    /// Check if service is running
    async fn check_service_running(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = if app_state.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Check that the session context state is readable and consistent
    fn check_session_context(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();
        let context = app_state.context();

        let (status, message) = match (context.matchmaking_state(), context.active_session()) {
            (Ok(state), Ok(active)) => {
                debug!(
                    "Session context check - state: {}, active: {}",
                    state,
                    active.is_some()
                );
                // An active session must only exist while Matched
                let consistent = active.is_some()
                    == (state == crate::types::MatchmakingState::Matched);
                if consistent {
                    (HealthStatus::Healthy, None)
                } else {
                    (
                        HealthStatus::Degraded,
                        Some(format!(
                            "Matchmaking state {} inconsistent with active session",
                            state
                        )),
                    )
                }
            }
            _ => (
                HealthStatus::Unhealthy,
                Some("Session context state is not readable".to_string()),
            ),
        };

        ComponentCheck {
            name: "session_context".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Gather service statistics from the session context
    fn gather_service_stats(app_state: &AppState) -> ServiceStats {
        let context = app_state.context();

        ServiceStats {
            matchmaking_state: context
                .matchmaking_state()
                .map(|s| s.to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            has_active_session: context
                .active_session()
                .map(|s| s.is_some())
                .unwrap_or(false),
            messages_in_log: context.messages().map(|m| m.len()).unwrap_or(0),
            sessions_in_history: context.history().map(|h| h.len()).unwrap_or(0),
            pending_timers: context.pending_timer_count(),
            uptime_info: app_state.uptime_info(),
        }
    }
}
