//! Shared configuration types for sigwatch services.

mod base;
mod daemon;
mod watcher;

pub use base::ValidationError;
pub use daemon::{DaemonConfig, HeartbeatConfig};
pub use watcher::{SignalName, WatcherConfig};
