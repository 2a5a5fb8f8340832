use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

use sigwatch::error::WatcherError;
use sigwatch::outcome::TimedOut;
use sigwatch_telemetry::tracing::TracingError;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;

/// Captured backtrace wrapper to avoid thiserror's unstable feature detection.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for the daemon.
#[derive(Debug)]
pub enum DaemonError {
    /// Configuration could not be loaded or is invalid.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// The tracing subscriber could not be installed.
    Telemetry(TracingError, CapturedBacktrace),
    /// The shutdown watcher could not be armed.
    Watcher(WatcherError, CapturedBacktrace),
    /// Some closers did not complete before the shutdown timeout.
    ShutdownTimedOut(TimedOut),
    /// I/O error.
    Io(std::io::Error, CapturedBacktrace),
}

impl DaemonError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            DaemonError::Config(_, _) => "configuration error",
            DaemonError::Telemetry(_, _) => "telemetry error",
            DaemonError::Watcher(_, _) => "watcher error",
            DaemonError::ShutdownTimedOut(_) => "shutdown timeout",
            DaemonError::Io(_, _) => "i/o error",
        }
    }

    /// Returns the backtrace for this error.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            DaemonError::Config(_, cb)
            | DaemonError::Telemetry(_, cb)
            | DaemonError::Watcher(_, cb)
            | DaemonError::Io(_, cb) => Some(&cb.0),
            DaemonError::ShutdownTimedOut(_) => None,
        }
    }

    /// Creates a configuration error from any error source.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        DaemonError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns a user-oriented report for terminal output.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("sigwatchd failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        if let DaemonError::ShutdownTimedOut(timed_out) = self {
            for name in timed_out.names() {
                out.push_str(&format!("uncompleted closer: {name}\n"));
            }
        }

        let mut source = Error::source(self);
        let mut idx = 1usize;
        while let Some(err) = source {
            out.push_str(&format!("cause {idx}: {err}\n"));
            source = err.source();
            idx += 1;
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for DaemonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaemonError::Config(source, _) => write!(f, "configuration error: {source}"),
            DaemonError::Telemetry(source, _) => write!(f, "telemetry error: {source}"),
            DaemonError::Watcher(source, _) => write!(f, "watcher error: {source}"),
            DaemonError::ShutdownTimedOut(timed_out) => write!(f, "{timed_out}"),
            DaemonError::Io(source, _) => write!(f, "i/o error: {source}"),
        }
    }
}

impl Error for DaemonError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DaemonError::Config(source, _) => Some(source.as_ref()),
            DaemonError::Telemetry(source, _) => Some(source),
            DaemonError::Watcher(source, _) => Some(source),
            DaemonError::ShutdownTimedOut(_) => None,
            DaemonError::Io(source, _) => Some(source),
        }
    }
}

impl From<TracingError> for DaemonError {
    fn from(err: TracingError) -> Self {
        DaemonError::Telemetry(err, CapturedBacktrace::capture())
    }
}

impl From<WatcherError> for DaemonError {
    fn from(err: WatcherError) -> Self {
        DaemonError::Watcher(err, CapturedBacktrace::capture())
    }
}

impl From<TimedOut> for DaemonError {
    fn from(err: TimedOut) -> Self {
        DaemonError::ShutdownTimedOut(err)
    }
}

impl From<std::io::Error> for DaemonError {
    fn from(err: std::io::Error) -> Self {
        DaemonError::Io(err, CapturedBacktrace::capture())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sigwatch::closer::{CloseError, Closer};
    use sigwatch::settings::Settings;
    use sigwatch::watcher::Watcher;
    use sigwatch_telemetry::tracing::init_tracing;
    use std::borrow::Cow;
    use std::time::Duration;

    struct StuckCloser(&'static str);

    #[async_trait]
    impl Closer for StuckCloser {
        async fn close(&self) -> Result<(), CloseError> {
            std::future::pending::<()>().await;
            Ok(())
        }

        fn name(&self) -> Cow<'_, str> {
            Cow::Borrowed(self.0)
        }
    }

    #[tokio::test]
    async fn test_timed_out_report_lists_uncompleted_closers() {
        let watcher = Watcher::new(
            Settings::new()
                .with_timeout(Duration::from_millis(20))
                .with_closer(StuckCloser("queue-drain"))
                .with_closer(StuckCloser("db-pool")),
        )
        .unwrap();
        let timed_out = watcher.close().await.unwrap_err();

        let err = DaemonError::from(timed_out);
        let report = err.render_report();

        assert_eq!(err.category(), "shutdown timeout");
        assert!(err.backtrace().is_none());
        assert!(report.contains("category: shutdown timeout\n"));
        assert!(report.contains("error: closers timed out: 2 did not complete"));
        assert!(report.contains("uncompleted closer: queue-drain\n"));
        assert!(report.contains("uncompleted closer: db-pool\n"));
        assert!(!report.contains("cause 1:"));
    }

    #[test]
    fn test_tracing_failure_is_a_telemetry_error() {
        // Only one global subscriber can be installed per process.
        let _flusher = init_tracing("sigwatchd-error-test");
        let err = DaemonError::from(init_tracing("sigwatchd-error-test").unwrap_err());

        assert_eq!(err.category(), "telemetry error");
        assert!(err.to_string().starts_with("telemetry error: "));
        assert!(err.render_report().contains("cause 1: "));
    }

    #[test]
    fn test_config_report_lists_causes() {
        let err = DaemonError::config(std::io::Error::other("missing file"));

        let report = err.render_report();

        assert!(report.starts_with("sigwatchd failed\n"));
        assert!(report.contains("category: configuration error\n"));
        assert!(report.contains("cause 1: missing file\n"));
    }

    #[test]
    fn test_watcher_error_category() {
        let err = DaemonError::from(WatcherError::MissingCloser { index: 1 });

        assert_eq!(err.category(), "watcher error");
        assert_eq!(
            err.to_string(),
            "watcher error: closer at index 1 is missing"
        );
    }
}
