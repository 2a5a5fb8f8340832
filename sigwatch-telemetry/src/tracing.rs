//! Tracing subscriber initialization.

use std::io;
use std::sync::Once;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable that enables log output in tests.
const ENABLE_TRACING_ENV: &str = "ENABLE_TRACING";

static INIT_TEST_TRACING: Once = Once::new();

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to redirect `log` records to tracing: {0}")]
    LogTracer(#[from] tracing_log::log::SetLoggerError),

    #[error("failed to install the global tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Flushes buffered log lines when dropped.
///
/// Logs are written from a background thread. Keep the flusher alive for as long as the process
/// logs, and drop it (or call [`LogFlusher::flush`]) before exiting so no lines are lost.
#[must_use = "dropping the flusher stops log output"]
pub struct LogFlusher {
    guard: Option<WorkerGuard>,
}

impl LogFlusher {
    /// Flushes pending lines and stops the writer thread. Later log lines are discarded.
    pub fn flush(&mut self) {
        drop(self.guard.take());
    }
}

impl std::fmt::Debug for LogFlusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFlusher")
            .field("active", &self.guard.is_some())
            .finish()
    }
}

/// Installs the global subscriber for `app_name`, writing to stdout through a non-blocking writer.
///
/// The level defaults to `info` for the application and `warn` elsewhere and can be overridden
/// with `RUST_LOG`.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    LogTracer::init()?;

    let (writer, guard) = tracing_appender::non_blocking(io::stdout());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(app_name).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer))
        .try_init()?;

    Ok(LogFlusher { guard: Some(guard) })
}

/// Installs a test subscriber once per process when `ENABLE_TRACING` is set.
///
/// Safe to call from every test.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var_os(ENABLE_TRACING_ENV).is_none() {
            return;
        }

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into());
        // Another harness may already have installed a subscriber.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}

fn default_filter(app_name: &str) -> String {
    let target = app_name.replace('-', "_");
    format!("warn,{target}=info,sigwatch=info")
}
