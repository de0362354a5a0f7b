//! Gateway configuration types.
//!
//! This module defines configuration structures for the HTTP gateway and
//! loads them from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// An environment variable held a value that could not be parsed.
#[derive(Debug, Error)]
#[error("invalid value {value:?} for {var}")]
pub struct ConfigError {
    /// The variable name.
    pub var: &'static str,
    /// The rejected value.
    pub value: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// Configuration for the gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// `RocksDB` data directory.
    #[serde(default = "GatewayConfig::default_data_dir")]
    pub data_dir: PathBuf,

    /// Allowed CORS origins.
    #[serde(default = "GatewayConfig::default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Delete memberships together with their user or segment.
    #[serde(default)]
    pub cascade_on_delete: bool,

    /// Fixed seed for random auto-assignment.
    #[serde(default)]
    pub rng_seed: Option<u64>,

    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    fn default_data_dir() -> PathBuf {
        PathBuf::from("/data/segments")
    }

    fn default_cors_origins() -> Vec<String> {
        vec!["*".to_string()]
    }

    const fn default_max_body() -> usize {
        1024 * 1024 // 1 MB
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`; unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparsable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(dir) = lookup("DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = lookup("MAX_BODY_BYTES") {
            config.max_body_bytes = parse("MAX_BODY_BYTES", value)?;
        }
        if let Some(value) = lookup("REQUEST_TIMEOUT_SECONDS") {
            config.request_timeout_seconds = parse("REQUEST_TIMEOUT_SECONDS", value)?;
        }
        if let Some(value) = lookup("CASCADE_ON_DELETE") {
            config.cascade_on_delete = parse("CASCADE_ON_DELETE", value)?;
        }
        if let Some(value) = lookup("RNG_SEED") {
            config.rng_seed = Some(parse("RNG_SEED", value)?);
        }
        if let Some(value) = lookup("LOG_FORMAT") {
            config.log_format = parse("LOG_FORMAT", value)?;
        }

        Ok(config)
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn parse<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError { var, value })
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            data_dir: Self::default_data_dir(),
            cors_origins: Self::default_cors_origins(),
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
            cascade_on_delete: false,
            rng_seed: None,
            log_format: LogFormat::Text,
        }
    }
}
