//! Pure transition table for the submission lifecycle.
//!
//! `PENDING → SUBMITTED → {ACCEPTED, REJECTED, FAILED}` with
//! `RETRY_SCHEDULED` and `RETRYING` as transient excursions. The function is
//! pure over the record so callers can validate a transition before touching
//! the store; the store's compare-and-set then enforces it atomically.

use super::errors::{StateMachineError, StateMachineResult};
use super::events::SubmissionEvent;
use super::states::SubmissionState;
use crate::models::SubmissionRecord;

/// Determine the target state for an event against the record's current
/// state, enforcing guard conditions.
///
/// The only guarded transition is the operator retry out of `Failed`, which
/// requires the stored `last_error` to be retryable: a fatal outcome stays
/// fatal unless an operator explicitly re-drives a transient failure.
pub fn target_state(
    record: &SubmissionRecord,
    event: &SubmissionEvent,
) -> StateMachineResult<SubmissionState> {
    use SubmissionEvent as E;
    use SubmissionState as S;

    let target = match (record.status, event) {
        // Submit acknowledgement
        (S::Pending, E::SubmitSucceeded) => S::Submitted,
        (S::Retrying, E::SubmitSucceeded) => S::Submitted,

        // Slow-profile retry queued
        (S::Pending, E::ScheduleRetry) => S::RetryScheduled,
        (S::Retrying, E::ScheduleRetry) => S::RetryScheduled,

        // Retry attempt starting
        (S::Pending, E::BeginRetry) => S::Retrying,
        (S::Retrying, E::BeginRetry) => S::Retrying,
        (S::RetryScheduled, E::BeginRetry) => S::Retrying,
        (S::Failed, E::BeginRetry) => {
            let retryable = record
                .last_error
                .as_ref()
                .map(|e| e.retryable)
                .unwrap_or(false);
            if !retryable {
                return Err(StateMachineError::GuardFailed {
                    reason: format!(
                        "submission {} failed with a non-retryable error",
                        record.id
                    ),
                });
            }
            S::Retrying
        }

        // Terminal failures on the submit path
        (S::Pending, E::Fail(_)) => S::Failed,
        (S::Retrying, E::Fail(_)) => S::Failed,

        // Remote resolution observed by the poller
        (S::Submitted, E::RemoteAccepted) => S::Accepted,
        (S::Submitted, E::RemoteRejected) => S::Rejected,
        (S::Submitted, E::RemoteFailed) => S::Failed,

        (from, event) => {
            return Err(StateMachineError::InvalidTransition {
                from: from.to_string(),
                event: event.event_type().to_string(),
            })
        }
    };

    Ok(target)
}
