//! # Submission Orchestration
//!
//! Top-level control flow for the submission lifecycle.
//!
//! ## Core Components
//!
//! - **SubmissionOrchestrator**: public entry points (`submit`,
//!   `get_status`, `retry_submission`, `process_retry_queue`) and the
//!   attempt-driving loop shared between first submits and retries
//! - **StatusPoller**: background polling of the remote system until a
//!   terminal outcome or budget exhaustion
//! - **EscalationHandler**: operator escalation for unrecoverable failures
//!
//! Each submission progresses as an independent tokio task; within one
//! submission, every store write completes before the next attempt begins.

pub mod escalation;
pub mod orchestrator;
pub mod status_poller;

pub use escalation::EscalationHandler;
pub use orchestrator::SubmissionOrchestrator;
pub use status_poller::{PollOutcome, StatusPoller};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cooperative shutdown signal shared with background pollers.
///
/// Carries a level flag next to the notifier so a task that was mid-await
/// on something else when the signal fired still observes it on its next
/// check.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    notify: Notify,
    triggered: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Trigger shutdown and wake every waiting task
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Wait until the signal fires. Returns immediately if already fired.
    pub async fn wait(&self) {
        if self.is_triggered() {
            return;
        }
        self.notify.notified().await;
    }
}
