//! Configuration of the `sigwatchd` daemon.

use serde::{Deserialize, Serialize};

use crate::load::Config;
use crate::shared::{ValidationError, WatcherConfig};

/// Top-level configuration of the daemon.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DaemonConfig {
    /// Shutdown watcher settings.
    #[serde(default)]
    pub watcher: WatcherConfig,
    /// Heartbeat worker settings.
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
}

impl DaemonConfig {
    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.watcher.validate()?;
        self.heartbeat.validate()
    }
}

impl Config for DaemonConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["watcher.signals"];
}

/// Configuration for the daemon's heartbeat worker.
///
/// The worker logs a beat at a fixed interval until the watcher tells it to stop.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HeartbeatConfig {
    /// Interval in milliseconds between beats.
    ///
    /// Default: 5000 (5 seconds)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl HeartbeatConfig {
    /// Default heartbeat interval: 5 seconds.
    pub const DEFAULT_INTERVAL_MS: u64 = 5_000;

    /// Validates the heartbeat configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_ms == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "interval_ms".to_string(),
                constraint: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_ms: Self::DEFAULT_INTERVAL_MS,
        }
    }
}

fn default_interval_ms() -> u64 {
    HeartbeatConfig::DEFAULT_INTERVAL_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DaemonConfig::default();
        assert_eq!(config.heartbeat.interval_ms, 5_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_heartbeat_interval() {
        let config = DaemonConfig {
            heartbeat: HeartbeatConfig { interval_ms: 0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_reports_watcher_errors_first() {
        let config = DaemonConfig {
            watcher: WatcherConfig {
                timeout_ms: 0,
                ..Default::default()
            },
            heartbeat: HeartbeatConfig { interval_ms: 0 },
        };
        assert!(matches!(config.validate(), Err(ValidationError::TimeoutZero)));
    }
}
