//! Fan-out/fan-in notification of closers under a deadline.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::closer::SharedCloser;
use crate::outcome::{Outcome, TimedOut};

/// Calls every closer concurrently and waits for them until `timeout` elapses.
///
/// Each closer runs in its own task. A closer that fails or panics still counts as completed;
/// only whether it finished matters. When the deadline elapses first, the still-pending tasks are
/// detached and keep running in the background, and the pending closers are returned in a
/// [`TimedOut`].
pub(crate) async fn notify_closers(closers: Vec<SharedCloser>, timeout: Duration) -> Outcome {
    if closers.is_empty() {
        return Ok(());
    }

    let mut pending = HashMap::with_capacity(closers.len());
    let mut join_set = JoinSet::new();

    for (index, closer) in closers.into_iter().enumerate() {
        pending.insert(index, Arc::clone(&closer));
        join_set.spawn(async move {
            let result = AssertUnwindSafe(closer.close()).catch_unwind().await;
            (index, result)
        });
    }

    debug!(
        closers = pending.len(),
        timeout_ms = timeout.as_millis() as u64,
        "notifying closers"
    );

    let deadline = sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            biased;

            joined = join_set.join_next(), if !join_set.is_empty() => {
                match joined {
                    Some(Ok((index, result))) => {
                        if let Some(closer) = pending.remove(&index) {
                            match result {
                                Ok(Ok(())) => debug!(closer = %closer.name(), "closer completed"),
                                Ok(Err(err)) => warn!(
                                    closer = %closer.name(),
                                    error = %err,
                                    "closer failed, counting it as completed"
                                ),
                                Err(_) => warn!(
                                    closer = %closer.name(),
                                    "closer panicked, counting it as completed"
                                ),
                            }
                        }
                    }
                    Some(Err(err)) => {
                        // Tasks are never aborted and panics are caught inside them.
                        debug!(error = %err, "closer task could not be joined");
                    }
                    None => {}
                }

                if pending.is_empty() {
                    debug!("all closers completed");
                    return Ok(());
                }
            }
            _ = &mut deadline => {
                join_set.detach_all();

                let uncompleted: Vec<SharedCloser> = pending.into_values().collect();
                let timed_out = TimedOut::new(uncompleted);
                warn!(
                    uncompleted = ?timed_out.names(),
                    timeout_ms = timeout.as_millis() as u64,
                    "closers did not complete before the timeout, abandoning them"
                );

                return Err(timed_out);
            }
        }
    }
}
