//! Options a [`Watcher`](crate::watcher::Watcher) is constructed from.

use std::fmt;
use std::time::Duration;

use sigwatch_config::shared::WatcherConfig;

use crate::closer::{Closer, SharedCloser};
use crate::concurrency::trigger::TriggerRx;
use crate::error::{WatcherError, WatcherResult};
use crate::signal::Signal;

/// Default deadline for closers to complete once notification starts.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration snapshot consumed when a watcher is armed.
///
/// Each option replaces one field and leaves the others untouched. Unset options keep their
/// defaults: no signals, [`DEFAULT_TIMEOUT`], no closers and no programmatic trigger.
///
/// ```ignore
/// let settings = Settings::new()
///     .watching_signals([Signal::Interrupt, Signal::Terminate])
///     .with_timeout(Duration::from_secs(2))
///     .with_closers([server.into_shared(), fn_closer(flush).into_shared()]);
/// ```
pub struct Settings {
    pub(crate) signals: Vec<Signal>,
    pub(crate) timeout: Duration,
    pub(crate) closers: Vec<Option<SharedCloser>>,
    pub(crate) trigger_rx: Option<TriggerRx>,
}

impl Settings {
    /// Creates settings holding only defaults.
    pub fn new() -> Self {
        Self {
            signals: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            closers: Vec::new(),
            trigger_rx: None,
        }
    }

    /// Creates settings with the signals and timeout of a loaded [`WatcherConfig`].
    ///
    /// Closers cannot be configured from files, so they still have to be added in code.
    pub fn from_config(config: &WatcherConfig) -> Self {
        Self::new()
            .watching_signals(config.signals.iter().copied().map(Signal::from))
            .with_timeout(Duration::from_millis(config.timeout_ms))
    }

    /// Sets the signals that trigger the watcher.
    pub fn watching_signals<I>(mut self, signals: I) -> Self
    where
        I: IntoIterator<Item = Signal>,
    {
        self.signals = signals.into_iter().collect();
        self
    }

    /// Sets how long closers are given to complete once notification starts.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the ordered list of closers to notify.
    ///
    /// Slots may be absent (`None`), in which case arming the watcher fails with
    /// [`WatcherError::MissingCloser`] naming the first absent index.
    pub fn with_closers<I, C>(mut self, closers: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Option<SharedCloser>>,
    {
        self.closers = closers.into_iter().map(Into::into).collect();
        self
    }

    /// Appends one closer to the list.
    pub fn with_closer<C>(mut self, closer: C) -> Self
    where
        C: Closer,
    {
        self.closers.push(Some(closer.into_shared()));
        self
    }

    /// Sets a programmatic trigger source, in addition to the watched signals.
    pub fn with_trigger(mut self, trigger_rx: TriggerRx) -> Self {
        self.trigger_rx = Some(trigger_rx);
        self
    }

    /// Returns the watched signals.
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Returns the notification timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the number of closer slots, including absent ones.
    pub fn closers_len(&self) -> usize {
        self.closers.len()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("signals", &self.signals)
            .field("timeout", &self.timeout)
            .field("closers", &self.closers.len())
            .field("trigger", &self.trigger_rx.is_some())
            .finish()
    }
}

/// Checks that every closer slot is filled.
pub(crate) fn validate_closers(
    closers: Vec<Option<SharedCloser>>,
) -> WatcherResult<Vec<SharedCloser>> {
    closers
        .into_iter()
        .enumerate()
        .map(|(index, closer)| closer.ok_or(WatcherError::MissingCloser { index }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closer::fn_closer;
    use crate::concurrency::trigger::create_trigger_channel;
    use sigwatch_config::shared::SignalName;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert!(settings.signals().is_empty());
        assert_eq!(settings.timeout(), Duration::from_secs(10));
        assert_eq!(settings.closers_len(), 0);
        assert!(settings.trigger_rx.is_none());
    }

    #[test]
    fn test_options_replace_single_fields() {
        let (_tx, rx) = create_trigger_channel();
        let settings = Settings::new()
            .watching_signals([Signal::Interrupt])
            .watching_signals([Signal::Hangup, Signal::Terminate])
            .with_timeout(Duration::from_millis(250))
            .with_closers([fn_closer(|| {}).into_shared()])
            .with_closer(fn_closer(|| {}))
            .with_trigger(rx);

        assert_eq!(settings.signals(), &[Signal::Hangup, Signal::Terminate]);
        assert_eq!(settings.timeout(), Duration::from_millis(250));
        assert_eq!(settings.closers_len(), 2);
        assert!(settings.trigger_rx.is_some());
    }

    #[test]
    fn test_from_config() {
        let config = WatcherConfig {
            signals: vec![SignalName::Terminate, SignalName::User1],
            timeout_ms: 1_500,
        };

        let settings = Settings::from_config(&config);

        assert_eq!(settings.signals(), &[Signal::Terminate, Signal::User1]);
        assert_eq!(settings.timeout(), Duration::from_millis(1_500));
    }

    #[test]
    fn test_validate_closers_names_missing_index() {
        let closer = fn_closer(|| {}).into_shared();
        let closers = vec![Some(closer.clone()), Some(closer), None, None];

        let err = validate_closers(closers).unwrap_err();

        assert!(matches!(err, WatcherError::MissingCloser { index: 2 }));
        assert_eq!(err.to_string(), "closer at index 2 is missing");
    }

    #[test]
    fn test_validate_closers_accepts_full_list() {
        let closers = vec![
            Some(fn_closer(|| {}).into_shared()),
            Some(fn_closer(|| {}).into_shared()),
        ];

        assert_eq!(validate_closers(closers).unwrap().len(), 2);
    }
}
