//! Timeout policy parsing, validation, and defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// Reclaim policy read by each session watchdog.
///
/// Immutable for the lifetime of one watchdog instance; the supervisor
/// hands every watchdog a copy at spawn time, so changing the configuration
/// afterwards has no effect on watchdogs already running.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutPolicy {
    /// How often each session's watchdog re-checks, in milliseconds.
    #[serde(default = "default_polling_interval_millis")]
    pub polling_interval_millis: u64,
    /// Whether sub-resource reaping runs even when the session itself
    /// still has time remaining.
    #[serde(default)]
    pub always_check_sub_resource_timeouts: bool,
    /// Whether idle sessions are closed at all.
    #[serde(default = "default_true")]
    pub session_idle_close_enabled: bool,
    /// Heartbeat interval in seconds; non-positive means sub-resources
    /// never time out.
    #[serde(default = "default_heartbeat_interval_seconds")]
    pub heartbeat_interval_seconds: f64,
}

fn default_polling_interval_millis() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_heartbeat_interval_seconds() -> f64 {
    300.0
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            polling_interval_millis: default_polling_interval_millis(),
            always_check_sub_resource_timeouts: false,
            session_idle_close_enabled: default_true(),
            heartbeat_interval_seconds: default_heartbeat_interval_seconds(),
        }
    }
}

impl TimeoutPolicy {
    /// Load and validate a policy from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse a policy from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let policy: Self = toml::from_str(raw)?;
        policy.validate()?;
        Ok(policy)
    }

    /// The polling interval as a [`Duration`].
    #[must_use]
    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_millis)
    }

    fn validate(&self) -> Result<()> {
        if self.polling_interval_millis == 0 {
            return Err(AppError::Config(
                "polling_interval_millis must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
