//! Configuration management with TOML support
//!
//! Covers the three things a retrieval job needs configured: which server to
//! talk to (with credentials passed through untouched), how aggressively to
//! retry transient failures, and where saved tables go. Every field has a
//! sensible default, so an empty file is a valid configuration.

use crate::error::{Error, Result};
use crate::fetch::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Historian server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Retry behavior for transient fetch failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Output settings for saved tables
    #[serde(default)]
    pub output: OutputConfig,
}

/// Historian server settings
///
/// Credentials are opaque to this crate; they are handed to the
/// `HistorianConnection` implementor as-is.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server name as known to the historian infrastructure
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Optional login user
    #[serde(default)]
    pub username: Option<String>,

    /// Optional login password
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            username: None,
            password: None,
        }
    }
}

/// Retry behavior for transient fetch failures
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Total attempts per fetch, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound on any single delay, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Add random jitter to delays
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            jitter: true,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.multiplier,
            jitter: config.jitter,
        }
    }
}

/// Output settings for saved tables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory for saved tables
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Save retrieved tables to disk after a successful retrieval
    #[serde(default)]
    pub save_to_disk: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            save_to_disk: false,
        }
    }
}

fn default_server_name() -> String {
    "localhost".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    5_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// [`Error::Io`] when the file cannot be read,
    /// [`Error::Configuration`] when it is not valid TOML or fails
    /// validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Configuration(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] with a descriptive message on the first
    /// violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.server.name.is_empty() {
            return Err(Error::Configuration(
                "server name cannot be empty".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Configuration(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.multiplier < 1.0 {
            return Err(Error::Configuration(
                "retry.multiplier must be at least 1.0".to_string(),
            ));
        }
        if self.retry.max_delay_ms < self.retry.initial_delay_ms {
            return Err(Error::Configuration(
                "retry.max_delay_ms must be at least retry.initial_delay_ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Retry policy derived from this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }
}
