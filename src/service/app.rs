//! Main application state and service coordination
//!
//! This module contains the production AppState that coordinates the
//! session context, monitoring endpoints, and background tasks.

use crate::config::AppConfig;
use crate::directory::{StaticCandidateDirectory, StaticIdentityProvider};
use crate::events::LoggingEventPublisher;
use crate::metrics::health::HealthServerConfig;
use crate::metrics::{HealthServer, MetricsCollector, MetricsService};
use crate::session::SessionContext;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Identity provider backing the session context
    identity: Arc<StaticIdentityProvider>,

    /// The actor's session runtime
    context: Arc<SessionContext>,

    /// Metrics service for monitoring and health checks
    metrics_service: Arc<MetricsService>,

    /// Background task handles
    background_tasks: Vec<JoinHandle<()>>,

    /// Service start time for uptime reporting
    started_at: Instant,

    /// Service status
    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Initialize the application with all dependencies
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing huddle-room session service");
        info!(
            "Configuration: service={}, search_delay={}ms",
            config.service.name, config.matchmaking.search_delay_ms
        );

        // Initialize metrics service
        let metrics_service = Self::initialize_metrics(&config)?;

        // Initialize the session core with its static collaborators
        let identity = Arc::new(StaticIdentityProvider::new());
        let candidates = Arc::new(StaticCandidateDirectory::with_sample_users());
        let publisher = Arc::new(LoggingEventPublisher::new());

        let context = Arc::new(SessionContext::new(
            config.clone(),
            identity.clone(),
            candidates,
            publisher,
        ));

        Ok(Self {
            config,
            identity,
            context,
            metrics_service,
            background_tasks: Vec::new(),
            started_at: Instant::now(),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Start all background services
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        info!("Starting huddle-room session service");

        // Mark as running
        *self.is_running.write().await = true;

        // Start metrics service
        self.start_metrics_service().await?;

        info!("✅ Huddle-room session service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of huddle-room service");

        // Mark as not running
        *self.is_running.write().await = false;

        // Abort any deferred timers still pending
        let cancelled = self.context.cancel_outstanding_tasks();
        if cancelled > 0 {
            info!("Cancelled {} outstanding deferred task(s)", cancelled);
        }

        // Stop background tasks
        self.stop_background_tasks().await;

        // Stop metrics service
        info!("Stopping metrics service...");
        if let Err(e) = self.metrics_service.stop().await {
            warn!("Failed to stop metrics service: {}", e);
        } else {
            info!("✅ Metrics service stopped");
        }

        info!("✅ Huddle-room service shutdown completed");
        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get the session context for operations
    pub fn context(&self) -> Arc<SessionContext> {
        self.context.clone()
    }

    /// Get the identity provider (sign-in surface for collaborators)
    pub fn identity(&self) -> Arc<StaticIdentityProvider> {
        self.identity.clone()
    }

    /// Get metrics service
    pub fn metrics_service(&self) -> Arc<MetricsService> {
        self.metrics_service.clone()
    }

    /// Human-readable uptime for health reporting
    pub fn uptime_info(&self) -> String {
        let uptime = self.started_at.elapsed();
        format!("{}s", uptime.as_secs())
    }

    /// Initialize metrics service
    fn initialize_metrics(config: &AppConfig) -> Result<Arc<MetricsService>, ServiceError> {
        info!(
            "Initializing metrics service on port {}",
            config.service.health_port
        );

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let health_config = HealthServerConfig {
            port: config.service.health_port,
            host: "0.0.0.0".to_string(),
        };

        let health_server = Arc::new(HealthServer::new(health_config, metrics_collector.clone()));
        let metrics_service = Arc::new(MetricsService::new(metrics_collector, health_server));

        Ok(metrics_service)
    }

    /// Start metrics service as a background task
    async fn start_metrics_service(&mut self) -> Result<(), ServiceError> {
        info!("Starting metrics and health endpoints");

        let metrics_service = self.metrics_service.clone();
        let port = self.config.service.health_port;

        let metrics_handle = tokio::spawn(async move {
            if let Err(e) = metrics_service.start().await {
                error!("Metrics service failed: {}", e);
            } else {
                info!("Metrics service task completed");
            }
        });

        self.background_tasks.push(metrics_handle);

        // Give the server a moment to start up
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        info!("✅ Metrics service started on port {}", port);
        Ok(())
    }

    /// Stop all background tasks
    async fn stop_background_tasks(&mut self) {
        info!("Stopping {} background task(s)", self.background_tasks.len());

        for handle in self.background_tasks.drain(..) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        // Port 0 is rejected by config validation, so pick an ephemeral-ish
        // port the tests never actually bind
        config.service.health_port = 18491;
        config
    }

    #[tokio::test]
    async fn test_app_state_initialization() {
        let app_state = AppState::new(test_config()).await.unwrap();

        assert!(!app_state.is_running().await);
        assert_eq!(app_state.config().service.name, "huddle-room");
        assert!(app_state
            .context()
            .active_session()
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_outstanding_timers() {
        let mut app_state = AppState::new(test_config()).await.unwrap();

        // Sign in and start a search so a completion timer is pending
        app_state.identity().sign_in(crate::types::UserProfile {
            id: "u1".to_string(),
            username: "u1".to_string(),
            name: "Test User".to_string(),
            role: "Engineer".to_string(),
            skills: Default::default(),
            avatar: String::new(),
            is_automated: false,
        });
        app_state.context().start_search().await.unwrap();
        assert!(app_state.context().pending_timer_count() > 0);

        app_state.shutdown().await.unwrap();
        assert_eq!(app_state.context().pending_timer_count(), 0);
        assert!(!app_state.is_running().await);
    }
}
