//! Lifecycle event system: in-process broadcast of submission transitions
//! for observers (metrics shippers, filer-facing notifications, tests).

pub mod publisher;

pub use publisher::{EventPublisher, LifecycleEvent};

/// Canonical lifecycle event names
pub mod names {
    pub const CREATED: &str = "submission.created";
    pub const SUBMITTED: &str = "submission.submitted";
    pub const RETRY_SCHEDULED: &str = "submission.retry_scheduled";
    pub const STATUS_CHECKED: &str = "submission.status_checked";
    pub const ACCEPTED: &str = "submission.accepted";
    pub const REJECTED: &str = "submission.rejected";
    pub const FAILED: &str = "submission.failed";
    pub const ESCALATED: &str = "submission.escalated";
}
