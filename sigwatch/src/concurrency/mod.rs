//! Concurrency primitives the watcher is built from.
//!
//! - [`trigger`] carries "a watched signal occurred" events from OS signal handlers or from
//!   embedding code to a watcher's listener, without ever blocking the sender.
//! - [`future`] lets an optional event source take part in a `tokio::select!`.

pub mod future;
pub mod trigger;
