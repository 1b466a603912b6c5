//! Cooperative cancellation flag shared by a scan's workers and its
//! predicate. Purely advisory: nothing is interrupted, the flag is read
//! between slots.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared scan-cancellation flag. Cloning yields another handle on the same
/// flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the scan to stop after the slot currently being processed.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
