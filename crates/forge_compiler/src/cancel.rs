//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag for one compile invocation.
///
/// The pipeline checks the token between phases and between work items
/// within a phase; nothing is interrupted mid-operation. A cancelled
/// compile returns [`FatalError::Cancelled`](crate::FatalError::Cancelled)
/// and leaves no partial output file (the output is written to a temporary
/// path and only renamed on full completion).
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
