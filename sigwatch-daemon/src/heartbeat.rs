//! Periodic liveness log, stopped by the shutdown watcher.
//!
//! The worker stands in for the long-running work a real service performs: it runs until the
//! watcher notifies its [`HeartbeatWorkerHandle`], then returns the number of beats it logged.

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use sigwatch::closer::{CloseError, Closer};
use sigwatch_config::shared::HeartbeatConfig;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

/// Worker that logs a heartbeat at a fixed interval until shutdown.
#[derive(Debug)]
pub struct HeartbeatWorker {
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl HeartbeatWorker {
    /// Creates a worker and the sender used to stop it.
    fn new(config: &HeartbeatConfig) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = Self {
            interval: Duration::from_millis(config.interval_ms),
            shutdown_rx,
        };

        (worker, shutdown_tx)
    }

    /// Starts the heartbeat worker in a background task.
    pub fn start(config: &HeartbeatConfig) -> HeartbeatWorkerHandle {
        let (worker, shutdown_tx) = Self::new(config);
        let join_handle = tokio::spawn(worker.run());

        HeartbeatWorkerHandle {
            shutdown_tx,
            join_handle: Mutex::new(Some(join_handle)),
        }
    }

    async fn run(mut self) -> u64 {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "starting heartbeat worker"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut beats = 0u64;

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.wait_for(|shutdown| *shutdown) => {
                    info!(beats, "heartbeat worker received shutdown signal");
                    return beats;
                }
                _ = ticker.tick() => {
                    beats += 1;
                    debug!(beats, "heartbeat");
                }
            }
        }
    }
}

/// Handle to a running heartbeat worker. Closing it stops the worker and waits for it to exit.
#[derive(Debug)]
pub struct HeartbeatWorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    join_handle: Mutex<Option<JoinHandle<u64>>>,
}

#[async_trait]
impl Closer for HeartbeatWorkerHandle {
    async fn close(&self) -> Result<(), CloseError> {
        self.shutdown_tx.send_replace(true);

        let Some(join_handle) = self.join_handle.lock().await.take() else {
            return Ok(());
        };

        let beats = join_handle.await?;
        info!(beats, "heartbeat worker stopped");

        Ok(())
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("heartbeat-worker")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> HeartbeatConfig {
        HeartbeatConfig { interval_ms: 5 }
    }

    #[tokio::test]
    async fn test_close_stops_worker() {
        let handle = HeartbeatWorker::start(&fast_config());
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(handle.close().await.is_ok());
        assert!(handle.join_handle.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_second_close_is_noop() {
        let handle = HeartbeatWorker::start(&fast_config());

        assert!(handle.close().await.is_ok());
        assert!(handle.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_worker_counts_beats_until_shutdown() {
        let (worker, shutdown_tx) = HeartbeatWorker::new(&fast_config());
        let join_handle = tokio::spawn(worker.run());

        tokio::time::sleep(Duration::from_millis(30)).await;
        shutdown_tx.send_replace(true);

        let beats = join_handle.await.expect("heartbeat task");
        // The first tick completes immediately.
        assert!(beats >= 1);
    }

    #[tokio::test]
    async fn test_handle_name() {
        let handle = HeartbeatWorker::start(&fast_config());

        assert_eq!(handle.name(), "heartbeat-worker");
    }
}
