//! Errors raised while constructing a [`Watcher`](crate::watcher::Watcher).
//!
//! Timeouts while notifying closers are not errors of this kind: they are reported as a
//! [`TimedOut`](crate::outcome::TimedOut) outcome by `wait` and `close`.

use std::io;

use thiserror::Error;

use crate::signal::Signal;

/// Convenient result type for watcher construction.
pub type WatcherResult<T> = Result<T, WatcherError>;

/// Reasons a watcher could not be armed.
///
/// When construction fails no background task is left running on behalf of the watcher.
#[derive(Debug, Error)]
pub enum WatcherError {
    /// A closer slot was empty.
    #[error("closer at index {index} is missing")]
    MissingCloser { index: usize },

    /// The platform has no way of delivering the signal.
    #[error("{signal} cannot be watched on this platform")]
    UnsupportedSignal { signal: Signal },

    /// The operating system refused to install a handler for the signal.
    #[error("failed to register a handler for {signal}: {source}")]
    SignalRegistration {
        signal: Signal,
        #[source]
        source: io::Error,
    },
}
