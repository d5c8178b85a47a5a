//! Configuration for the Parapet server
//!
//! This module contains the configuration types and loading functionality.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};
use parapet_core::ProcessorConfig;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub bind_address: String,

    /// Maximum queue items claimed per processing pass
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum cascade depth before child spawning is refused
    #[serde(default = "default_max_cascade_depth")]
    pub max_cascade_depth: u32,

    /// Per-item execution deadline in seconds
    #[serde(default = "default_item_timeout_secs")]
    pub item_timeout_secs: u64,

    /// Age in seconds after which a Processing claim is requeued
    #[serde(default = "default_stale_requeue_secs")]
    pub stale_requeue_secs: u64,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_batch_size() -> usize {
    10
}

fn default_max_cascade_depth() -> u32 {
    10
}

fn default_item_timeout_secs() -> u64 {
    60
}

fn default_stale_requeue_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn load() -> ServerResult<Self> {
        let mut config = Self::default();

        if let Ok(port) = env::var("SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.port = port;
            } else {
                warn!("Invalid SERVER_PORT value: {}", port);
            }
        }

        if let Ok(host) = env::var("SERVER_HOST") {
            config.bind_address = host;
        }

        if let Ok(batch_size) = env::var("BATCH_SIZE") {
            if let Ok(size) = batch_size.parse::<usize>() {
                config.batch_size = size;
            } else {
                warn!("Invalid BATCH_SIZE value: {}", batch_size);
            }
        }

        if let Ok(depth) = env::var("MAX_CASCADE_DEPTH") {
            if let Ok(depth) = depth.parse::<u32>() {
                config.max_cascade_depth = depth;
            } else {
                warn!("Invalid MAX_CASCADE_DEPTH value: {}", depth);
            }
        }

        if let Ok(timeout) = env::var("ITEM_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                config.item_timeout_secs = secs;
            } else {
                warn!("Invalid ITEM_TIMEOUT_SECS value: {}", timeout);
            }
        }

        if let Ok(stale) = env::var("STALE_REQUEUE_SECS") {
            if let Ok(secs) = stale.parse::<u64>() {
                config.stale_requeue_secs = secs;
            } else {
                warn!("Invalid STALE_REQUEUE_SECS value: {}", stale);
            }
        }

        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.log_level = log_level;
        }

        config.validate()?;

        info!("Loaded server configuration");
        Ok(config)
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> ServerResult<()> {
        if self.batch_size == 0 {
            return Err(ServerError::ConfigError(
                "Batch size must be at least 1".to_string(),
            ));
        }
        if self.item_timeout_secs == 0 {
            return Err(ServerError::ConfigError(
                "Item timeout must be at least 1 second".to_string(),
            ));
        }
        // A stale window shorter than the deadline would requeue live work.
        if self.stale_requeue_secs < self.item_timeout_secs {
            return Err(ServerError::ConfigError(
                "Stale requeue window must not be shorter than the item timeout".to_string(),
            ));
        }
        Ok(())
    }

    /// Derive the queue processor tuning from this configuration
    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            batch_size: self.batch_size,
            item_timeout: Duration::from_secs(self.item_timeout_secs),
            stale_after: Duration::from_secs(self.stale_requeue_secs),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_host(),
            batch_size: default_batch_size(),
            max_cascade_depth: default_max_cascade_depth(),
            item_timeout_secs: default_item_timeout_secs(),
            stale_requeue_secs: default_stale_requeue_secs(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, 8080);
        assert_eq!(config.batch_size, 10);
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let config = ServerConfig {
            batch_size: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ServerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_stale_window_shorter_than_timeout_is_rejected() {
        let config = ServerConfig {
            item_timeout_secs: 120,
            stale_requeue_secs: 60,
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ServerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_processor_config_mirrors_settings() {
        let config = ServerConfig {
            batch_size: 5,
            item_timeout_secs: 30,
            stale_requeue_secs: 90,
            ..ServerConfig::default()
        };
        let processor = config.processor_config();
        assert_eq!(processor.batch_size, 5);
        assert_eq!(processor.item_timeout, Duration::from_secs(30));
        assert_eq!(processor.stale_after, Duration::from_secs(90));
    }
}
