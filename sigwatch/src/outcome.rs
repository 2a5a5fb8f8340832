//! Result of a watcher's notification round.

use std::fmt;

use thiserror::Error;

use crate::closer::{SharedCloser, same_closer};

/// Result of notifying closers.
///
/// `Ok(())` means every closer completed, or that there was nothing to notify.
pub type Outcome = Result<(), TimedOut>;

/// Closers that did not complete before the notification deadline.
///
/// The order of [`TimedOut::uncompleted`] is unspecified. The tasks running those closers were
/// abandoned, and their eventual results are never reported.
#[derive(Clone, Error)]
#[error(
    "closers timed out: {} did not complete ({})",
    .uncompleted.len(),
    join_names(.uncompleted)
)]
pub struct TimedOut {
    uncompleted: Vec<SharedCloser>,
}

impl TimedOut {
    pub(crate) fn new(uncompleted: Vec<SharedCloser>) -> Self {
        Self { uncompleted }
    }

    /// Returns the closers still running when the deadline elapsed.
    pub fn uncompleted(&self) -> &[SharedCloser] {
        &self.uncompleted
    }

    /// Returns `true` if `closer` was still running when the deadline elapsed.
    pub fn contains(&self, closer: &SharedCloser) -> bool {
        self.uncompleted
            .iter()
            .any(|uncompleted| same_closer(uncompleted, closer))
    }

    /// Returns the names of the uncompleted closers.
    pub fn names(&self) -> Vec<String> {
        self.uncompleted
            .iter()
            .map(|closer| closer.name().into_owned())
            .collect()
    }
}

fn join_names(closers: &[SharedCloser]) -> String {
    closers
        .iter()
        .map(|closer| closer.name())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Debug for TimedOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedOut")
            .field("uncompleted", &self.names())
            .finish()
    }
}
