use sigwatch::closer::{Closer, fn_closer};
use sigwatch::settings::Settings;
use sigwatch::watcher::Watcher;
use sigwatch_config::Environment;
use sigwatch_config::shared::DaemonConfig;
use tracing::{info, warn};

use crate::error::DaemonResult;
use crate::heartbeat::HeartbeatWorker;

/// Starts the daemon and runs until the shutdown watcher settles.
///
/// Returns an error when the watcher cannot be armed or when some closers did not complete in
/// time.
pub async fn start_daemon_with_config(config: DaemonConfig) -> DaemonResult<()> {
    info!("starting sigwatchd");

    log_config(&config);

    let heartbeat = HeartbeatWorker::start(&config.heartbeat);
    let log_flush = fn_closer(|| info!("shutdown finished, flushing logs")).named("log-flush");

    let settings = Settings::from_config(&config.watcher)
        .with_closers([heartbeat.into_shared(), log_flush.into_shared()]);
    let watcher = Watcher::new(settings)?;

    info!("sigwatchd running, waiting for a shutdown signal");

    if let Err(timed_out) = watcher.wait().await {
        warn!(
            uncompleted = ?timed_out.names(),
            "shutdown finished with uncompleted closers"
        );
        return Err(timed_out.into());
    }

    info!("sigwatchd stopped");

    Ok(())
}

fn log_config(config: &DaemonConfig) {
    let environment = Environment::load().ok();
    info!(
        environment = ?environment,
        signals = ?config.watcher.signals,
        timeout_ms = config.watcher.timeout_ms,
        heartbeat_interval_ms = config.heartbeat.interval_ms,
        "daemon configuration"
    );
}
