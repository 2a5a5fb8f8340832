//! `sigwatchd`: a long-running service that shuts down gracefully on signals.
//!
//! Loads configuration, initializes tracing, starts the async runtime and waits on a shutdown
//! watcher whose closers stop the service's workers.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use sigwatch_config::shared::DaemonConfig;
use sigwatch_telemetry::tracing::init_tracing;
use tracing::error;

use crate::config::load_daemon_config;
use crate::core::start_daemon_with_config;
use crate::error::DaemonResult;

mod config;
mod core;
mod error;
mod heartbeat;

/// Grace period for tasks abandoned by the watcher once the daemon returns.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "sigwatchd", version, about)]
struct Args {
    /// Directory containing the `configuration` folder. Defaults to the working directory.
    #[arg(long)]
    configuration_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> DaemonResult<()> {
    let config = load_daemon_config(args.configuration_dir.as_deref())?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(async_main(config));
    // Closers abandoned after a timeout may still be running.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    result
}

async fn async_main(config: DaemonConfig) -> DaemonResult<()> {
    if let Err(err) = start_daemon_with_config(config).await {
        error!("{err}");
        return Err(err);
    }

    Ok(())
}
