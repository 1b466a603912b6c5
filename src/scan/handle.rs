//! Handle returned by parallel scan dispatch. Waiting merges the per-worker
//! parts in worker-index order; the first worker error (again in index
//! order) wins over any partial results.

use super::cancel::CancelToken;
use super::pool::Job;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;

enum HandleState<T> {
    /// The scan already ran inline (pool disabled or empty range).
    Ready(Result<T>),
    /// The scan is running on the pool.
    Pending {
        job: Arc<Job>,
        parts: Arc<Mutex<Vec<Option<Result<T>>>>>,
        merge: fn(Vec<T>) -> T,
    },
}

/// In-flight parallel scan.
pub struct TaskHandle<T> {
    state: HandleState<T>,
    token: CancelToken,
}

impl<T> TaskHandle<T> {
    pub(crate) fn ready(result: Result<T>, token: CancelToken) -> Self {
        Self {
            state: HandleState::Ready(result),
            token,
        }
    }

    pub(crate) fn pending(
        job: Arc<Job>,
        parts: Arc<Mutex<Vec<Option<Result<T>>>>>,
        merge: fn(Vec<T>) -> T,
        token: CancelToken,
    ) -> Self {
        Self {
            state: HandleState::Pending { job, parts, merge },
            token,
        }
    }

    /// Asks the running scan to stop early. Results gathered so far are
    /// still returned by [`Self::wait_for_result`].
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Blocks until every worker has finished and returns the merged result.
    pub fn wait_for_result(self) -> Result<T> {
        match self.state {
            HandleState::Ready(result) => result,
            HandleState::Pending { job, parts, merge } => {
                job.wait();
                let mut parts = parts.lock();
                let mut collected = Vec::with_capacity(parts.len());
                for part in parts.drain(..) {
                    match part {
                        Some(Ok(value)) => collected.push(value),
                        Some(Err(e)) => return Err(e),
                        None => {
                            return Err(Error::Io(std::io::Error::other(
                                "scan worker terminated without reporting a result",
                            )))
                        }
                    }
                }
                Ok(merge(collected))
            }
        }
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            HandleState::Ready(_) => "ready",
            HandleState::Pending { .. } => "pending",
        };
        f.debug_struct("TaskHandle").field("state", &state).finish()
    }
}
