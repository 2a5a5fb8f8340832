#![allow(dead_code)]

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sigwatch::closer::{CloseError, Closer, SharedCloser};
use tokio::sync::Notify;

/// Counts how many times it was closed.
#[derive(Debug, Default)]
pub struct CountingCloser {
    calls: AtomicUsize,
}

impl CountingCloser {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Closer for CountingCloser {
    async fn close(&self) -> Result<(), CloseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Never completes. Notifies `started` when `close` begins.
#[derive(Debug, Default)]
pub struct StallingCloser {
    pub started: Notify,
    calls: AtomicUsize,
}

impl StallingCloser {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Closer for StallingCloser {
    async fn close(&self) -> Result<(), CloseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Completes after a delay.
#[derive(Debug)]
pub struct DelayedCloser {
    delay: Duration,
    calls: AtomicUsize,
}

impl DelayedCloser {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Closer for DelayedCloser {
    async fn close(&self) -> Result<(), CloseError> {
        tokio::time::sleep(self.delay).await;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Always fails.
#[derive(Debug, Default)]
pub struct FailingCloser {
    calls: AtomicUsize,
}

impl FailingCloser {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Closer for FailingCloser {
    async fn close(&self) -> Result<(), CloseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(io::Error::other("resource already gone").into())
    }
}

/// Returns the closer both as its concrete type, for assertions, and as a shared closer.
pub fn shared<C: Closer>(closer: C) -> (Arc<C>, SharedCloser) {
    let closer = Arc::new(closer);
    let shared: SharedCloser = closer.clone();
    (closer, shared)
}
