//! Main application configuration
//!
//! This module defines the primary configuration structures for the huddle-room
//! session service, including environment variable loading and validation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub matchmaking: MatchmakingSettings,
    pub chat: ChatSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for health check and metrics endpoints
    pub health_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Matchmaking-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchmakingSettings {
    /// Artificial search delay before matchmaking completes, in milliseconds
    pub search_delay_ms: u64,
    /// Maximum number of candidates taken from the pool per session
    pub max_candidates: usize,
}

/// Chat pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Lower bound of the randomized responder delay window, in milliseconds
    pub responder_min_delay_ms: u64,
    /// Upper bound of the randomized responder delay window, in milliseconds
    pub responder_max_delay_ms: u64,
    /// Whether automated roster members reply to user messages
    pub enable_responder: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            matchmaking: MatchmakingSettings::default(),
            chat: ChatSettings::default(),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "huddle-room".to_string(),
            log_level: "info".to_string(),
            health_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            search_delay_ms: 3000, // 3 seconds of simulated search time
            max_candidates: 3,     // groups of 4 including the actor
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            responder_min_delay_ms: 1000,
            responder_max_delay_ms: 2000,
            enable_responder: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(port) = env::var("HEALTH_PORT") {
            config.service.health_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HEALTH_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Matchmaking settings
        if let Ok(delay) = env::var("SEARCH_DELAY_MS") {
            config.matchmaking.search_delay_ms = delay
                .parse()
                .map_err(|_| anyhow!("Invalid SEARCH_DELAY_MS value: {}", delay))?;
        }
        if let Ok(max) = env::var("MAX_CANDIDATES") {
            config.matchmaking.max_candidates = max
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_CANDIDATES value: {}", max))?;
        }

        // Chat settings
        if let Ok(min_delay) = env::var("RESPONDER_MIN_DELAY_MS") {
            config.chat.responder_min_delay_ms = min_delay
                .parse()
                .map_err(|_| anyhow!("Invalid RESPONDER_MIN_DELAY_MS value: {}", min_delay))?;
        }
        if let Ok(max_delay) = env::var("RESPONDER_MAX_DELAY_MS") {
            config.chat.responder_max_delay_ms = max_delay
                .parse()
                .map_err(|_| anyhow!("Invalid RESPONDER_MAX_DELAY_MS value: {}", max_delay))?;
        }
        if let Ok(enabled) = env::var("ENABLE_RESPONDER") {
            config.chat.enable_responder = enabled
                .parse()
                .map_err(|_| anyhow!("Invalid ENABLE_RESPONDER value: {}", enabled))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get the matchmaking search delay as Duration
    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.matchmaking.search_delay_ms)
    }

    /// Get the responder delay window as a pair of Durations
    pub fn responder_delay_window(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.chat.responder_min_delay_ms),
            Duration::from_millis(self.chat.responder_max_delay_ms),
        )
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports
    if config.service.health_port == 0 {
        return Err(anyhow!("Health port cannot be 0"));
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    // Validate matchmaking settings
    if config.matchmaking.max_candidates == 0 {
        return Err(anyhow!("max_candidates must be at least 1"));
    }

    // Validate chat settings
    if config.chat.responder_max_delay_ms == 0 {
        return Err(anyhow!("responder_max_delay_ms must be greater than 0"));
    }
    if config.chat.responder_min_delay_ms > config.chat.responder_max_delay_ms {
        return Err(anyhow!(
            "responder_min_delay_ms cannot exceed responder_max_delay_ms"
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.matchmaking.search_delay_ms, 3000);
        assert_eq!(config.matchmaking.max_candidates, 3);
        assert_eq!(config.chat.responder_min_delay_ms, 1000);
        assert_eq!(config.chat.responder_max_delay_ms, 2000);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = AppConfig::default();
        config.service.log_level = "verbose".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_inverted_responder_window_rejected() {
        let mut config = AppConfig::default();
        config.chat.responder_min_delay_ms = 5000;
        config.chat.responder_max_delay_ms = 1000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_candidates_rejected() {
        let mut config = AppConfig::default();
        config.matchmaking.max_candidates = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_duration_helpers() {
        let config = AppConfig::default();
        assert_eq!(config.search_delay(), Duration::from_millis(3000));

        let (min, max) = config.responder_delay_window();
        assert_eq!(min, Duration::from_millis(1000));
        assert_eq!(max, Duration::from_millis(2000));
    }

    #[test]
    fn test_from_toml_file() {
        let dir = std::env::temp_dir().join("huddle-room-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
[service]
name = "huddle-room-test"
log_level = "debug"
health_port = 9090
shutdown_timeout_seconds = 10

[matchmaking]
search_delay_ms = 50
max_candidates = 2

[chat]
responder_min_delay_ms = 10
responder_max_delay_ms = 20
enable_responder = true
"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.service.name, "huddle-room-test");
        assert_eq!(config.matchmaking.search_delay_ms, 50);
        assert_eq!(config.matchmaking.max_candidates, 2);
        assert!(config.chat.enable_responder);

        std::fs::remove_file(&path).ok();
    }
}
