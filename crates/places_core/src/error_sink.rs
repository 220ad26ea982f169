//! User-facing error reporting channel.
//!
//! # Responsibility
//! - Receive human-readable error messages from store reconciliation.
//! - Expose the current message to presentation as observable state.
//!
//! # Invariants
//! - Reporting is fire-and-forget; it never fails and never blocks on readers.
//! - `clear_error` resets the visible message but not the report counter.

use crate::observable::{Observable, SubscriptionId};
use log::info;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Destination for user-facing error messages.
pub trait ErrorSink: Send + Sync {
    fn report_error(&self, message: &str);
}

/// Observable error channel consumed by presentation (error modal etc).
#[derive(Default)]
pub struct ErrorChannel {
    current: Observable<Option<String>>,
    reported: AtomicU64,
}

static PROCESS_ERROR_CHANNEL: Lazy<Arc<ErrorChannel>> =
    Lazy::new(|| Arc::new(ErrorChannel::new()));

/// Returns the process-wide error channel.
pub fn process_error_channel() -> Arc<ErrorChannel> {
    Arc::clone(&PROCESS_ERROR_CHANNEL)
}

impl ErrorChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `message` as the current error.
    pub fn show_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.reported.fetch_add(1, Ordering::SeqCst);
        info!(
            "event=error_reported module=error_sink status=ok chars={}",
            message.chars().count()
        );
        self.current.set(Some(message));
    }

    /// Dismisses the current error.
    pub fn clear_error(&self) {
        self.current.set(None);
    }

    pub fn current_error(&self) -> Option<String> {
        self.current.get().as_ref().clone()
    }

    /// Total messages reported since construction.
    pub fn reported_count(&self) -> u64 {
        self.reported.load(Ordering::SeqCst)
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&Option<String>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.current.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.current.unsubscribe(id)
    }
}

impl ErrorSink for ErrorChannel {
    fn report_error(&self, message: &str) {
        self.show_error(message);
    }
}
