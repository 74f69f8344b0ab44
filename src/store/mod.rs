//! # Submission Store
//!
//! Persistence abstraction for submission records, retry-queue entries, and
//! the append-only audit log.
//!
//! ## Overview
//!
//! The orchestration core depends only on the per-record atomic operations
//! declared here, never on a concrete storage engine. Implementations must
//! guarantee:
//!
//! - create/update/transition are atomic per record id, and updates within
//!   one record are strictly ordered
//! - `transition_submission` is a compare-and-set: it fails without writing
//!   when the record is not in one of the expected states
//! - at most one `Pending` retry entry exists per submission
//! - claiming due retry entries marks them `Processed` atomically, so
//!   concurrent sweeps never hand out the same entry twice
//! - audit rows are append-only
//!
//! The bundled [`memory::InMemoryStore`] satisfies the contract for tests
//! and single-process deployments.

pub mod memory;

use crate::models::{
    AuditLogEntry, NewAuditEntry, NewRetryEntry, NewSubmission, RetryQueueEntry, SubmissionError,
    SubmissionRecord,
};
use crate::state_machine::states::SubmissionState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub use memory::InMemoryStore;

/// Errors surfaced by store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Submission not found: {0}")]
    NotFound(Uuid),

    #[error("A submission already exists for correlation id {0}")]
    DuplicateCorrelationId(Uuid),

    #[error("Submission {id} is in state {actual}, expected one of [{expected}]")]
    UnexpectedState {
        id: Uuid,
        expected: String,
        actual: SubmissionState,
    },

    #[error("Submission {id} is terminal ({status}) and immutable")]
    TerminalRecord { id: Uuid, status: SubmissionState },

    #[error("A pending retry entry already exists for submission {0}")]
    RetryAlreadyPending(Uuid),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Partial update applied atomically to a submission record.
///
/// Unset fields are left untouched; `updated_at` is always bumped by the
/// store. `attempts` can only grow.
#[derive(Debug, Clone, Default)]
pub struct SubmissionUpdate {
    pub status: Option<SubmissionState>,
    pub attempts: Option<u32>,
    pub remote_submission_id: Option<String>,
    pub last_error: Option<SubmissionError>,
    pub clear_last_error: bool,
}

impl SubmissionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: SubmissionState) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn with_remote_submission_id(mut self, remote_submission_id: impl Into<String>) -> Self {
        self.remote_submission_id = Some(remote_submission_id.into());
        self
    }

    pub fn with_last_error(mut self, error: SubmissionError) -> Self {
        self.last_error = Some(error);
        self
    }

    pub fn clearing_last_error(mut self) -> Self {
        self.clear_last_error = true;
        self
    }

    /// Apply this update to a record in place. `attempts` never decreases.
    pub(crate) fn apply_to(&self, record: &mut SubmissionRecord, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(attempts) = self.attempts {
            record.attempts = record.attempts.max(attempts);
        }
        if let Some(remote_submission_id) = &self.remote_submission_id {
            record.remote_submission_id = Some(remote_submission_id.clone());
        }
        if self.clear_last_error {
            record.last_error = None;
        }
        if let Some(error) = &self.last_error {
            record.last_error = Some(error.clone());
        }
        record.updated_at = now;
    }
}

/// Persistence contract for the submission orchestration core.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Create a new submission record in `Pending` with `attempts = 1`.
    /// Fails with [`StoreError::DuplicateCorrelationId`] if a record already
    /// exists for the correlation id.
    async fn create_submission(
        &self,
        new: NewSubmission,
        correlation_id: Uuid,
    ) -> StoreResult<SubmissionRecord>;

    async fn get_submission(&self, id: Uuid) -> StoreResult<SubmissionRecord>;

    async fn find_by_correlation_id(
        &self,
        correlation_id: Uuid,
    ) -> StoreResult<Option<SubmissionRecord>>;

    /// Apply an update to a non-terminal record. Terminal records refuse
    /// plain updates; state-dependent writes go through
    /// [`transition_submission`](Self::transition_submission).
    async fn update_submission(
        &self,
        id: Uuid,
        update: SubmissionUpdate,
    ) -> StoreResult<SubmissionRecord>;

    /// Compare-and-set update: applies only when the record's current status
    /// is one of `expected`, otherwise fails without writing.
    async fn transition_submission(
        &self,
        id: Uuid,
        expected: &[SubmissionState],
        update: SubmissionUpdate,
    ) -> StoreResult<SubmissionRecord>;

    /// Schedule a future retry. At most one `Pending` entry may exist per
    /// submission.
    async fn enqueue_retry(&self, entry: NewRetryEntry) -> StoreResult<RetryQueueEntry>;

    /// Atomically claim every `Pending` entry due at `now`, marking each
    /// `Processed` before returning it.
    async fn claim_due_retries(&self, now: DateTime<Utc>) -> StoreResult<Vec<RetryQueueEntry>>;

    /// Total number of retry entries ever created for a submission
    /// (pending and processed).
    async fn count_retry_entries(&self, submission_id: Uuid) -> StoreResult<u32>;

    async fn append_audit(&self, entry: NewAuditEntry) -> StoreResult<AuditLogEntry>;

    /// Audit rows for a submission, oldest first.
    async fn audit_trail(&self, submission_id: Uuid) -> StoreResult<Vec<AuditLogEntry>>;
}
