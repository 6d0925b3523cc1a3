//! User settings for escalation timing and exclusions.
//!
//! Read from `~/.freeport/config.json`. The file is optional and never
//! written by the library; every key falls back to its default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::application::{
    TerminationPolicy, DEFAULT_FORCE_TIMEOUT, DEFAULT_GRACE_PERIOD, DEFAULT_POLL_INTERVAL,
};
use crate::domain::ExclusionPolicy;
use crate::error::{Error, Result};

/// Settings stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Wait after the graceful signal, in milliseconds.
    pub grace_period_ms: u64,

    /// Wait after the forceful signal, in milliseconds.
    pub force_timeout_ms: u64,

    /// Liveness poll interval, in milliseconds.
    pub poll_interval_ms: u64,

    /// Extra owner-name patterns that are never terminated.
    pub exclude_patterns: Vec<String>,

    /// Keep the built-in browser exclusions.
    pub use_default_exclusions: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grace_period_ms: DEFAULT_GRACE_PERIOD.as_millis() as u64,
            force_timeout_ms: DEFAULT_FORCE_TIMEOUT.as_millis() as u64,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            exclude_patterns: Vec::new(),
            use_default_exclusions: true,
        }
    }
}

impl Settings {
    pub fn termination_policy(&self) -> Result<TerminationPolicy> {
        TerminationPolicy::new(
            Duration::from_millis(self.grace_period_ms),
            Duration::from_millis(self.force_timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    /// Build the exclusion policy, failing on the first invalid pattern.
    pub fn exclusion_policy(&self) -> Result<ExclusionPolicy> {
        let base = if self.use_default_exclusions {
            ExclusionPolicy::browsers()
        } else {
            ExclusionPolicy::none().with_protected_pid(std::process::id())
        };
        self.exclude_patterns
            .iter()
            .try_fold(base, |policy, pattern| policy.with_pattern(pattern))
    }
}

/// Locates and reads the settings file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a store with the default path, `~/.freeport/config.json`.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(".freeport").join("config.json"),
        })
    }

    /// Create a store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load settings from disk.
    ///
    /// Returns default settings if the file doesn't exist.
    pub async fn load(&self) -> Result<Settings> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            debug!(path = %self.config_path.display(), "No config file, using defaults");
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }
}
