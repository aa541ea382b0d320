//! Optional TOML configuration for the poller binary.
//!
//! A missing file yields `Config::default()`; unknown keys are warned about
//! and ignored. Values the scheduler cannot run with (zero concurrency or
//! intervals) are rejected at load time: the poll loop treats every runtime
//! failure as recoverable, so bad settings have to die before it starts.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Service configuration. Every field has a default, so any subset of keys
/// can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum simultaneous in-flight fetches per cycle.
    pub concurrency: usize,

    /// Seconds between cycle starts.
    pub interval_secs: u64,

    /// Whole-request timeout for a single feed fetch, in seconds.
    pub fetch_timeout_secs: u64,

    /// SQLite database path.
    pub db_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: 10,
            interval_secs: 60,
            fetch_timeout_secs: 30,
            db_path: "feedrake.db".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Invalid TOML or wrong value types → `Err(ConfigError::Parse)`
    /// - Unknown keys → accepted, logged as a warning
    /// - Values the scheduler rejects → `Err(ConfigError::Invalid)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        // Surface likely typos before serde silently ignores them
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = ["concurrency", "interval_secs", "fetch_timeout_secs", "db_path"];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "interval_secs must be at least 1".to_string(),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetch_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
