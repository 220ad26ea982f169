use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Caller-side interest in the outcome of a detached operation.
///
/// Cancelling only suppresses the completion callback; the store still
/// reconciles the mutation when the remote call resolves.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
