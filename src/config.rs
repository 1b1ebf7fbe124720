//! Configuration management for Tollgate.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, TollgateError};
use crate::ratelimit::Policy;

/// Main configuration for the Tollgate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TollgateConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
}

impl Default for TollgateConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            rate_limiting: RateLimitingConfig::default(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
        }
    }
}

fn default_http_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Seconds between reaper sweeps of expired windows
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Policy for the contact endpoint
    #[serde(default = "default_contact_policy")]
    pub contact: PolicyConfig,

    /// Policy for the subscribe endpoint
    #[serde(default = "default_subscribe_policy")]
    pub subscribe: PolicyConfig,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            contact: default_contact_policy(),
            subscribe: default_subscribe_policy(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_contact_policy() -> PolicyConfig {
    PolicyConfig {
        window_secs: 60,
        limit: 5,
    }
}

fn default_subscribe_policy() -> PolicyConfig {
    PolicyConfig {
        window_secs: 60,
        limit: 10,
    }
}

/// A rate limit policy as it appears in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Window length in seconds
    pub window_secs: u64,

    /// Maximum requests allowed within one window
    pub limit: u64,
}

impl PolicyConfig {
    /// Validate this configuration into a usable policy.
    pub fn to_policy(&self) -> Result<Policy> {
        Policy::new(Duration::from_secs(self.window_secs), self.limit)
    }
}

impl RateLimitingConfig {
    /// Get the validated sweep interval.
    pub fn sweep_interval(&self) -> Result<Duration> {
        if self.sweep_interval_secs == 0 {
            return Err(TollgateError::Config(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(Duration::from_secs(self.sweep_interval_secs))
    }
}

impl TollgateConfig {
    /// Load configuration from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: TollgateConfig =
            serde_yaml::from_str(&contents).map_err(|e| TollgateError::Config(e.to_string()))?;
        Ok(config)
    }
}
