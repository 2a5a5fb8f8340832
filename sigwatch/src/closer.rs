//! Shutdown callbacks notified by a [`Watcher`](crate::watcher::Watcher).
//!
//! A [`Closer`] is an opaque capability with a single `close` operation. The watcher only cares
//! whether a closer finished before the notification deadline, so the result of `close` is
//! observed for logging and otherwise discarded.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

/// Error returned by a failing [`Closer`].
pub type CloseError = Box<dyn error::Error + Send + Sync + 'static>;

/// Reference-counted closer, as stored by [`Settings`](crate::settings::Settings) and reported
/// back by [`TimedOut`](crate::outcome::TimedOut).
pub type SharedCloser = Arc<dyn Closer>;

/// A component that must be told when the process is shutting down.
///
/// [`Closer::close`] is called at most once by a watcher, from a freshly spawned task. A closer
/// that never returns is abandoned once the notification deadline elapses; it is not canceled.
#[async_trait]
pub trait Closer: Send + Sync + 'static {
    /// Releases whatever the closer guards.
    async fn close(&self) -> Result<(), CloseError>;

    /// Human readable name used in logs and timeout reports.
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }

    /// Moves the closer behind an [`Arc`] so it can be registered with a watcher.
    fn into_shared(self) -> SharedCloser
    where
        Self: Sized,
    {
        Arc::new(self)
    }
}

impl fmt::Debug for dyn Closer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Closer").field(&self.name()).finish()
    }
}

/// Closer wrapping an infallible procedure.
///
/// The procedure runs on tokio's blocking pool, so it may perform blocking work such as flushing
/// files. A procedure that never returns keeps its blocking thread until it does.
pub struct FnCloser<F> {
    name: Cow<'static, str>,
    procedure: Arc<F>,
}

impl<F> FnCloser<F> {
    /// Sets the name reported for this closer.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F> fmt::Debug for FnCloser<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCloser")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> Closer for FnCloser<F>
where
    F: Fn() + Send + Sync + 'static,
{
    async fn close(&self) -> Result<(), CloseError> {
        let procedure = Arc::clone(&self.procedure);
        tokio::task::spawn_blocking(move || procedure()).await?;

        Ok(())
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.name.as_ref())
    }
}

/// Closer wrapping a fallible procedure whose error is forwarded from [`Closer::close`].
pub struct TryFnCloser<F> {
    name: Cow<'static, str>,
    procedure: Arc<F>,
}

impl<F> TryFnCloser<F> {
    /// Sets the name reported for this closer.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F> fmt::Debug for TryFnCloser<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TryFnCloser")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, E> Closer for TryFnCloser<F>
where
    F: Fn() -> Result<(), E> + Send + Sync + 'static,
    E: Into<CloseError> + 'static,
{
    async fn close(&self) -> Result<(), CloseError> {
        let procedure = Arc::clone(&self.procedure);
        tokio::task::spawn_blocking(move || procedure().map_err(Into::into)).await?
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.name.as_ref())
    }
}

/// Adapts a procedure without a result into a [`Closer`].
pub fn fn_closer<F>(procedure: F) -> FnCloser<F>
where
    F: Fn() + Send + Sync + 'static,
{
    FnCloser {
        name: Cow::Borrowed("fn_closer"),
        procedure: Arc::new(procedure),
    }
}

/// Adapts a fallible procedure into a [`Closer`].
pub fn try_fn_closer<F, E>(procedure: F) -> TryFnCloser<F>
where
    F: Fn() -> Result<(), E> + Send + Sync + 'static,
    E: Into<CloseError> + 'static,
{
    TryFnCloser {
        name: Cow::Borrowed("try_fn_closer"),
        procedure: Arc::new(procedure),
    }
}

/// Returns `true` if both handles point at the same closer.
pub fn same_closer(a: &SharedCloser, b: &SharedCloser) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fn_closer_invokes_procedure_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let closer = fn_closer(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(closer.close().await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_try_fn_closer_invokes_procedure_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let closer = try_fn_closer(move || -> Result<(), io::Error> {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(closer.close().await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_try_fn_closer_forwards_error() {
        let closer = try_fn_closer(|| Err(io::Error::other("disk full")));

        let err = closer.close().await.unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_named_closers() {
        let closer = fn_closer(|| {}).named("flush-logs");
        assert_eq!(closer.name(), "flush-logs");

        let closer = try_fn_closer(|| Ok::<(), io::Error>(()));
        assert_eq!(closer.name(), "try_fn_closer");
    }

    #[test]
    fn test_same_closer_compares_identity() {
        let a = fn_closer(|| {}).into_shared();
        let b = fn_closer(|| {}).into_shared();

        assert!(same_closer(&a, &a.clone()));
        assert!(!same_closer(&a, &b));
    }
}
