//! In-memory submission store.
//!
//! Backs the store contract with `DashMap` keyed by record id plus
//! mutex-guarded retry-queue and audit vectors. Per-record atomicity comes
//! from the map's entry locks; queue claiming and the single-pending
//! invariant are serialized by the queue mutex.

use super::{StoreError, StoreResult, SubmissionStore, SubmissionUpdate};
use crate::models::{
    AuditLogEntry, NewAuditEntry, NewRetryEntry, NewSubmission, RetryEntryStatus, RetryQueueEntry,
    SubmissionRecord,
};
use crate::state_machine::states::SubmissionState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

/// Process-local store satisfying the [`SubmissionStore`] contract.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    submissions: DashMap<Uuid, SubmissionRecord>,
    correlation_index: DashMap<Uuid, Uuid>,
    retry_queue: Mutex<Vec<RetryQueueEntry>>,
    audit_log: Mutex<Vec<AuditLogEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All retry entries for a submission, test and diagnostics helper.
    pub fn retry_entries(&self, submission_id: Uuid) -> Vec<RetryQueueEntry> {
        self.retry_queue
            .lock()
            .iter()
            .filter(|e| e.submission_id == submission_id)
            .cloned()
            .collect()
    }

    /// Number of submission records held.
    pub fn submission_count(&self) -> usize {
        self.submissions.len()
    }
}

#[async_trait]
impl SubmissionStore for InMemoryStore {
    async fn create_submission(
        &self,
        new: NewSubmission,
        correlation_id: Uuid,
    ) -> StoreResult<SubmissionRecord> {
        // The correlation index entry lock makes the uniqueness check and
        // the insert a single atomic step.
        match self.correlation_index.entry(correlation_id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateCorrelationId(correlation_id)),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let record = SubmissionRecord {
                    id: Uuid::new_v4(),
                    correlation_id,
                    subject_id: new.subject_id,
                    payload_ref: new.payload_ref,
                    status: SubmissionState::Pending,
                    attempts: 1,
                    remote_submission_id: None,
                    last_error: None,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(record.id);
                self.submissions.insert(record.id, record.clone());
                Ok(record)
            }
        }
    }

    async fn get_submission(&self, id: Uuid) -> StoreResult<SubmissionRecord> {
        self.submissions
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn find_by_correlation_id(
        &self,
        correlation_id: Uuid,
    ) -> StoreResult<Option<SubmissionRecord>> {
        let Some(id) = self.correlation_index.get(&correlation_id).map(|r| *r.value()) else {
            return Ok(None);
        };
        self.submissions
            .get(&id)
            .map(|r| Some(r.value().clone()))
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_submission(
        &self,
        id: Uuid,
        update: SubmissionUpdate,
    ) -> StoreResult<SubmissionRecord> {
        let mut record = self.submissions.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.status.is_terminal() {
            return Err(StoreError::TerminalRecord {
                id,
                status: record.status,
            });
        }
        update.apply_to(&mut record, Utc::now());
        Ok(record.clone())
    }

    async fn transition_submission(
        &self,
        id: Uuid,
        expected: &[SubmissionState],
        update: SubmissionUpdate,
    ) -> StoreResult<SubmissionRecord> {
        let mut record = self.submissions.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if !expected.contains(&record.status) {
            return Err(StoreError::UnexpectedState {
                id,
                expected: expected
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                actual: record.status,
            });
        }
        update.apply_to(&mut record, Utc::now());
        Ok(record.clone())
    }

    async fn enqueue_retry(&self, entry: NewRetryEntry) -> StoreResult<RetryQueueEntry> {
        let mut queue = self.retry_queue.lock();
        let has_pending = queue
            .iter()
            .any(|e| e.submission_id == entry.submission_id && e.status == RetryEntryStatus::Pending);
        if has_pending {
            return Err(StoreError::RetryAlreadyPending(entry.submission_id));
        }
        let queued = RetryQueueEntry {
            id: Uuid::new_v4(),
            submission_id: entry.submission_id,
            attempt: entry.attempt,
            scheduled_for: entry.scheduled_for,
            status: RetryEntryStatus::Pending,
            created_at: Utc::now(),
        };
        queue.push(queued.clone());
        Ok(queued)
    }

    async fn claim_due_retries(&self, now: DateTime<Utc>) -> StoreResult<Vec<RetryQueueEntry>> {
        let mut queue = self.retry_queue.lock();
        let mut claimed = Vec::new();
        for entry in queue.iter_mut() {
            if entry.is_due(now) {
                entry.status = RetryEntryStatus::Processed;
                claimed.push(entry.clone());
            }
        }
        Ok(claimed)
    }

    async fn count_retry_entries(&self, submission_id: Uuid) -> StoreResult<u32> {
        let count = self
            .retry_queue
            .lock()
            .iter()
            .filter(|e| e.submission_id == submission_id)
            .count();
        Ok(count as u32)
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> StoreResult<AuditLogEntry> {
        let row = AuditLogEntry {
            id: Uuid::new_v4(),
            submission_id: entry.submission_id,
            action: entry.action,
            details: entry.details,
            actor: entry.actor,
            recorded_at: Utc::now(),
        };
        self.audit_log.lock().push(row.clone());
        Ok(row)
    }

    async fn audit_trail(&self, submission_id: Uuid) -> StoreResult<Vec<AuditLogEntry>> {
        Ok(self
            .audit_log
            .lock()
            .iter()
            .filter(|e| e.submission_id == submission_id)
            .cloned()
            .collect())
    }
}
