//! Trigger events delivered to a watcher.
//!
//! A trigger channel is a bounded mpsc channel of capacity one. Senders never wait: when an event
//! is already queued the new one is dropped, since the watcher only ever consumes the first event.
//! This keeps OS signal dispatch and embedding code free of back-pressure from the watcher.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use crate::signal::{Signal, SignalStream};

/// Number of events a trigger channel buffers.
const TRIGGER_CHANNEL_CAPACITY: usize = 1;

/// Receiver side of a trigger channel, handed to a watcher through
/// [`Settings::with_trigger`](crate::settings::Settings::with_trigger).
pub type TriggerRx = mpsc::Receiver<Signal>;

/// Sender side of a trigger channel.
///
/// Each [`TriggerTx::trigger`] call reports that `signal` occurred, exactly like an OS delivery
/// of that signal would.
#[derive(Debug, Clone)]
pub struct TriggerTx(mpsc::Sender<Signal>);

impl TriggerTx {
    /// Delivers a trigger event without blocking.
    ///
    /// Returns `false` when the receiving watcher is gone. A full channel counts as delivered
    /// because an earlier event is already waiting to be consumed.
    pub fn trigger(&self, signal: Signal) -> bool {
        match self.0.try_send(signal) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Waits until the receiving side of the channel is dropped.
    pub async fn closed(&self) {
        self.0.closed().await
    }

    /// Returns `true` if the receiving side of the channel was dropped.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// Creates a new trigger channel.
pub fn create_trigger_channel() -> (TriggerTx, TriggerRx) {
    let (tx, rx) = mpsc::channel(TRIGGER_CHANNEL_CAPACITY);
    (TriggerTx(tx), rx)
}

/// Spawns the task forwarding the first delivery of `signal` into `trigger_tx`.
///
/// The forwarder exits after one delivery, or as soon as the receiving watcher stops listening.
/// The OS handler itself stays installed for the lifetime of the process.
pub(crate) fn spawn_signal_forwarder(
    signal: Signal,
    mut stream: SignalStream,
    trigger_tx: TriggerTx,
) {
    tokio::spawn(async move {
        tokio::select! {
            delivered = stream.recv() => {
                if delivered.is_some() {
                    debug!(%signal, "signal delivered, forwarding trigger");
                    trigger_tx.trigger(signal);
                }
            }
            _ = trigger_tx.closed() => {
                debug!(%signal, "watcher stopped listening, signal forwarder exiting");
            }
        }
    });
}
