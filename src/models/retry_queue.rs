//! Retry-queue entry model.
//!
//! An entry schedules one future submission attempt after the in-call retry
//! budget is exhausted. The store guarantees at most one `Pending` entry per
//! submission, and claiming an entry (marking it `Processed`) is atomic so
//! concurrent queue sweeps never retry the same entry twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryEntryStatus {
    /// Waiting for its scheduled time
    Pending,
    /// Claimed by a queue sweep; the outcome lives on the submission record
    Processed,
}

impl fmt::Display for RetryEntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processed => write!(f, "processed"),
        }
    }
}

/// Schedules a future retry of a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryQueueEntry {
    pub id: Uuid,
    pub submission_id: Uuid,
    /// The attempt number about to be made when this entry is processed
    pub attempt: u32,
    pub scheduled_for: DateTime<Utc>,
    pub status: RetryEntryStatus,
    pub created_at: DateTime<Utc>,
}

impl RetryQueueEntry {
    /// Whether this entry is due for processing at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == RetryEntryStatus::Pending && self.scheduled_for <= now
    }
}

/// New retry entry for creation (without store-assigned fields)
#[derive(Debug, Clone)]
pub struct NewRetryEntry {
    pub submission_id: Uuid,
    pub attempt: u32,
    pub scheduled_for: DateTime<Utc>,
}
