//! Operating-system signals a watcher can be armed with.
//!
//! Unix platforms support every [`Signal`]. On Windows the console control events stand in for
//! the closest signals and the user-defined signals are unsupported.

use std::fmt;

use sigwatch_config::shared::SignalName;

use crate::error::WatcherError;

/// A termination signal that triggers a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `SIGINT`, or Ctrl+C on Windows.
    Interrupt,
    /// `SIGTERM`, or the console shutdown event on Windows.
    Terminate,
    /// `SIGHUP`, or the console close event on Windows.
    Hangup,
    /// `SIGQUIT`, or Ctrl+Break on Windows.
    Quit,
    /// `SIGUSR1`, unix only.
    User1,
    /// `SIGUSR2`, unix only.
    User2,
}

impl Signal {
    /// Returns the conventional name of the signal.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Hangup => "SIGHUP",
            Signal::Quit => "SIGQUIT",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SignalName> for Signal {
    fn from(name: SignalName) -> Self {
        match name {
            SignalName::Interrupt => Signal::Interrupt,
            SignalName::Terminate => Signal::Terminate,
            SignalName::Hangup => Signal::Hangup,
            SignalName::Quit => Signal::Quit,
            SignalName::User1 => Signal::User1,
            SignalName::User2 => Signal::User2,
        }
    }
}

/// Deliveries of one registered signal.
///
/// Registration installs the process-wide handler immediately, so a signal raised after
/// [`SignalStream::register`] returns is never lost.
#[derive(Debug)]
pub(crate) struct SignalStream {
    #[cfg(unix)]
    inner: tokio::signal::unix::Signal,
    #[cfg(windows)]
    inner: windows::ConsoleEvent,
}

#[cfg(unix)]
impl SignalStream {
    pub(crate) fn register(signal: Signal) -> Result<Self, WatcherError> {
        use tokio::signal::unix::{SignalKind, signal as unix_signal};

        let kind = match signal {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::Quit => SignalKind::quit(),
            Signal::User1 => SignalKind::user_defined1(),
            Signal::User2 => SignalKind::user_defined2(),
        };

        let inner = unix_signal(kind)
            .map_err(|source| WatcherError::SignalRegistration { signal, source })?;

        Ok(Self { inner })
    }

    /// Waits for the next delivery. Returns `None` once no more deliveries can arrive.
    pub(crate) async fn recv(&mut self) -> Option<()> {
        self.inner.recv().await
    }
}

#[cfg(windows)]
impl SignalStream {
    pub(crate) fn register(signal: Signal) -> Result<Self, WatcherError> {
        let inner = windows::ConsoleEvent::register(signal)?;

        Ok(Self { inner })
    }

    /// Waits for the next delivery. Returns `None` once no more deliveries can arrive.
    pub(crate) async fn recv(&mut self) -> Option<()> {
        self.inner.recv().await
    }
}

#[cfg(windows)]
mod windows {
    use tokio::signal::windows::{
        CtrlBreak, CtrlC, CtrlClose, CtrlShutdown, ctrl_break, ctrl_c, ctrl_close, ctrl_shutdown,
    };

    use super::Signal;
    use crate::error::WatcherError;

    #[derive(Debug)]
    pub(super) enum ConsoleEvent {
        CtrlC(CtrlC),
        CtrlBreak(CtrlBreak),
        CtrlClose(CtrlClose),
        CtrlShutdown(CtrlShutdown),
    }

    impl ConsoleEvent {
        pub(super) fn register(signal: Signal) -> Result<Self, WatcherError> {
            let registered = match signal {
                Signal::Interrupt => ctrl_c().map(ConsoleEvent::CtrlC),
                Signal::Quit => ctrl_break().map(ConsoleEvent::CtrlBreak),
                Signal::Hangup => ctrl_close().map(ConsoleEvent::CtrlClose),
                Signal::Terminate => ctrl_shutdown().map(ConsoleEvent::CtrlShutdown),
                Signal::User1 | Signal::User2 => {
                    return Err(WatcherError::UnsupportedSignal { signal });
                }
            };

            registered.map_err(|source| WatcherError::SignalRegistration { signal, source })
        }

        pub(super) async fn recv(&mut self) -> Option<()> {
            match self {
                ConsoleEvent::CtrlC(event) => event.recv().await,
                ConsoleEvent::CtrlBreak(event) => event.recv().await,
                ConsoleEvent::CtrlClose(event) => event.recv().await,
                ConsoleEvent::CtrlShutdown(event) => event.recv().await,
            }
        }
    }
}
