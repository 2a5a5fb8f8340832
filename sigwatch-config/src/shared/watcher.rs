//! Configuration of the shutdown watcher.

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Signal names accepted in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalName {
    /// `SIGINT`, or Ctrl+C on Windows.
    Interrupt,
    /// `SIGTERM`, or the console shutdown event on Windows.
    Terminate,
    /// `SIGHUP`, or the console close event on Windows.
    Hangup,
    /// `SIGQUIT`, or Ctrl+Break on Windows.
    Quit,
    /// `SIGUSR1`. Unix only.
    User1,
    /// `SIGUSR2`. Unix only.
    User2,
}

impl SignalName {
    /// Returns the name as written in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalName::Interrupt => "interrupt",
            SignalName::Terminate => "terminate",
            SignalName::Hangup => "hangup",
            SignalName::Quit => "quit",
            SignalName::User1 => "user1",
            SignalName::User2 => "user2",
        }
    }
}

/// Configuration for the shutdown watcher.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct WatcherConfig {
    /// Signals that trigger shutdown.
    ///
    /// Default: `[interrupt, terminate]`
    #[serde(default = "default_signals")]
    pub signals: Vec<SignalName>,

    /// How long closers are given to complete, in milliseconds.
    ///
    /// Default: 10000 (10 seconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl WatcherConfig {
    /// Default notification timeout: 10 seconds.
    pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

    /// Signals watched when none are configured.
    pub const DEFAULT_SIGNALS: [SignalName; 2] = [SignalName::Interrupt, SignalName::Terminate];

    /// Validates the watcher configuration.
    ///
    /// Rejects a zero timeout, an empty signal list and repeated signals.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_ms == 0 {
            return Err(ValidationError::TimeoutZero);
        }

        if self.signals.is_empty() {
            return Err(ValidationError::NoSignals);
        }

        for (i, signal) in self.signals.iter().enumerate() {
            if self.signals[..i].contains(signal) {
                return Err(ValidationError::DuplicateSignal(signal.as_str()));
            }
        }

        Ok(())
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            signals: default_signals(),
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
        }
    }
}

fn default_signals() -> Vec<SignalName> {
    WatcherConfig::DEFAULT_SIGNALS.to_vec()
}

fn default_timeout_ms() -> u64 {
    WatcherConfig::DEFAULT_TIMEOUT_MS
}
