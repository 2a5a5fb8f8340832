//! Graceful shutdown coordination.
//!
//! A [`watcher::Watcher`] waits for a termination trigger, either a watched OS signal, an event on
//! a programmatic trigger channel or an explicit close, and then notifies a fixed set of
//! [`closer::Closer`]s concurrently. Closers are notified at most once per watcher, the total wait
//! is bounded by a timeout, and closers that did not finish in time are reported back in a
//! [`outcome::TimedOut`].

pub mod closer;
pub mod concurrency;
pub mod error;
mod notify;
pub mod outcome;
pub mod settings;
pub mod signal;
pub mod watcher;
