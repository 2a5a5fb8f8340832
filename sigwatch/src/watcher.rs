//! The watcher: arms on construction, triggers once, notifies closers once.
//!
//! # Lifecycle
//!
//! ```text
//!            signal / trigger event          notification finished
//!  Armed ──────────────────────────► Triggered ─────────────────────► Settled(outcome)
//!    │                                   ▲
//!    └──────── close() ──────────────────┘
//! ```
//!
//! The state lives in a watch channel, so every observer sees the same sequence of states and
//! [`Watcher::wait`] simply waits for `Settled`. Two one-shot mechanisms keep the transitions
//! exactly-once:
//!
//! - `Armed → Triggered` is a compare-and-set on the channel value. The first trigger event or
//!   close request wins; later ones leave the state untouched.
//! - `Triggered → Settled` is guarded by taking the closer list out of its mutex. Whoever takes it
//!   (the background listener or a [`Watcher::close`] caller) spawns the notification task;
//!   everyone else finds the list gone and only waits.
//!
//! The notification task is detached from its starter, so dropping a `close` future half way does
//! not cancel notification.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::closer::SharedCloser;
use crate::concurrency::future::optional_future;
use crate::concurrency::trigger::{TriggerRx, create_trigger_channel, spawn_signal_forwarder};
use crate::error::WatcherResult;
use crate::notify::notify_closers;
use crate::outcome::Outcome;
use crate::settings::{Settings, validate_closers};
use crate::signal::{Signal, SignalStream};

/// Lifecycle state of a [`Watcher`].
#[derive(Debug, Clone)]
pub enum WatcherState {
    /// Waiting for a trigger event or a close request.
    Armed,
    /// Triggered, closers are being notified.
    Triggered,
    /// Notification finished. The outcome never changes again.
    Settled(Outcome),
}

impl WatcherState {
    /// Returns `true` while no trigger has been observed.
    pub fn is_armed(&self) -> bool {
        matches!(self, WatcherState::Armed)
    }

    /// Returns `true` once the outcome is fixed.
    pub fn is_settled(&self) -> bool {
        matches!(self, WatcherState::Settled(_))
    }

    /// Returns the outcome of a settled watcher.
    pub fn outcome(&self) -> Option<&Outcome> {
        match self {
            WatcherState::Settled(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// What moved the watcher out of [`WatcherState::Armed`].
#[derive(Debug, Clone, Copy)]
enum TriggerCause {
    Signal(Signal),
    CloseRequest,
}

#[derive(Debug)]
struct WatcherInner {
    state_tx: watch::Sender<WatcherState>,
    closers: Mutex<Option<Vec<SharedCloser>>>,
    timeout: Duration,
}

impl WatcherInner {
    /// Moves `Armed` to `Triggered`. Returns `false` if the watcher was already triggered.
    fn trigger(&self, cause: TriggerCause) -> bool {
        let triggered = self.state_tx.send_if_modified(|state| {
            if state.is_armed() {
                *state = WatcherState::Triggered;
                true
            } else {
                false
            }
        });

        match (triggered, cause) {
            (true, TriggerCause::Signal(signal)) => {
                info!(%signal, "signal received, notifying closers")
            }
            (true, TriggerCause::CloseRequest) => info!("close requested, notifying closers"),
            (false, _) => debug!(?cause, "watcher already triggered, ignoring trigger"),
        }

        triggered
    }

    /// Starts notifying closers unless somebody already did.
    fn begin_notification(self: &Arc<Self>) {
        let closers = self
            .closers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(closers) = closers else {
            return;
        };

        if closers.is_empty() {
            self.settle(Ok(()));
            return;
        }

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = notify_closers(closers, inner.timeout).await;
            inner.settle(outcome);
        });
    }

    fn settle(&self, outcome: Outcome) {
        match &outcome {
            Ok(()) => info!("watcher settled, all closers completed"),
            Err(timed_out) => info!(
                uncompleted = timed_out.uncompleted().len(),
                "watcher settled, some closers timed out"
            ),
        }

        self.state_tx.send_replace(WatcherState::Settled(outcome));
    }

    async fn settled(&self) -> Outcome {
        let mut state_rx = self.state_tx.subscribe();
        let Ok(state) = state_rx.wait_for(WatcherState::is_settled).await else {
            unreachable!("the state sender lives as long as the watcher");
        };

        match &*state {
            WatcherState::Settled(outcome) => outcome.clone(),
            _ => unreachable!("wait_for only returns settled states"),
        }
    }
}

/// Coordinates graceful shutdown.
///
/// A watcher notifies its closers once, either when one of the watched signals is delivered, when
/// an event arrives on its programmatic trigger, or when [`Watcher::close`] is called. The handle
/// is cheap to clone; all clones observe the same watcher.
#[derive(Debug, Clone)]
pub struct Watcher {
    inner: Arc<WatcherInner>,
}

impl Watcher {
    /// Validates `settings`, registers the watched signals and arms the watcher.
    ///
    /// Closer slots are validated before anything is registered, so a missing closer leaves no
    /// handler and no task behind. Signal handlers installed by a successful construction stay
    /// installed for the rest of the process.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn new(settings: Settings) -> WatcherResult<Self> {
        let Settings {
            signals,
            timeout,
            closers,
            trigger_rx,
        } = settings;

        let closers = validate_closers(closers)?;

        let streams = signals
            .iter()
            .map(|&signal| SignalStream::register(signal).map(|stream| (signal, stream)))
            .collect::<WatcherResult<Vec<_>>>()?;

        let (signal_tx, signal_rx) = create_trigger_channel();
        for (signal, stream) in streams {
            spawn_signal_forwarder(signal, stream, signal_tx.clone());
        }
        drop(signal_tx);

        let (state_tx, _) = watch::channel(WatcherState::Armed);
        let inner = Arc::new(WatcherInner {
            state_tx,
            closers: Mutex::new(Some(closers)),
            timeout,
        });

        info!(
            ?signals,
            timeout_ms = timeout.as_millis() as u64,
            "watcher armed"
        );

        tokio::spawn(listen(Arc::clone(&inner), signal_rx, trigger_rx));

        Ok(Self { inner })
    }

    /// Waits until closers were notified and returns the outcome.
    ///
    /// Waiting does not trigger the watcher: a watcher that is never triggered makes this wait
    /// forever. Once settled, every call returns the same outcome immediately.
    pub async fn wait(&self) -> Outcome {
        self.inner.settled().await
    }

    /// Triggers the watcher, then waits until closers were notified and returns the outcome.
    ///
    /// Safe to call any number of times, from any number of tasks: closers are notified once and
    /// every caller observes the same outcome. Calling it on a settled watcher returns
    /// immediately.
    pub async fn close(&self) -> Outcome {
        self.inner.trigger(TriggerCause::CloseRequest);
        self.inner.begin_notification();

        self.inner.settled().await
    }

    /// Returns a snapshot of the current lifecycle state.
    pub fn state(&self) -> WatcherState {
        self.inner.state_tx.borrow().clone()
    }

    /// Returns the notification timeout.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }
}

/// Background listener: waits for the first trigger and starts notification.
async fn listen(
    inner: Arc<WatcherInner>,
    mut signal_rx: TriggerRx,
    mut trigger_rx: Option<TriggerRx>,
) {
    let mut state_rx = inner.state_tx.subscribe();

    let cause = tokio::select! {
        Some(signal) = signal_rx.recv() => Some(TriggerCause::Signal(signal)),
        Some(signal) = optional_future(trigger_rx.as_mut().map(|rx| rx.recv())) => {
            Some(TriggerCause::Signal(signal))
        }
        _ = state_rx.wait_for(|state| !state.is_armed()) => None,
    };

    match cause {
        Some(cause) => {
            inner.trigger(cause);
            inner.begin_notification();
        }
        None => debug!("watcher closed before any signal, listener exiting"),
    }
}
