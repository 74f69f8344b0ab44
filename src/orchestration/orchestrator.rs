//! # Submission Orchestrator
//!
//! Top-level controller for the filing lifecycle.
//!
//! ## Overview
//!
//! The orchestrator owns record creation and terminal transitions. A
//! submit drives the fast-profile attempt loop through the retry executor;
//! a success hands off to a background status poller, fast-budget
//! exhaustion converts into a slow-profile retry-queue entry, and fatal
//! errors terminate the record and escalate. Queued retries re-enter the
//! same drive path through `process_retry_queue`, which an external
//! scheduler invokes on a fixed interval.
//!
//! All collaborators are injected at construction: the store, the remote
//! gateway, and the operator notifier. Nothing here holds record state
//! across a suspension point; every step re-reads the record and applies a
//! compare-and-set transition.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use filing_core::config::FilingConfig;
//! use filing_core::models::NewSubmission;
//! use filing_core::notifier::LogNotifier;
//! use filing_core::orchestration::SubmissionOrchestrator;
//! use filing_core::store::InMemoryStore;
//! # use filing_core::gateway::RemoteGateway;
//!
//! # async fn example(gateway: Arc<dyn RemoteGateway>) -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = SubmissionOrchestrator::new(
//!     FilingConfig::default(),
//!     Arc::new(InMemoryStore::new()),
//!     gateway,
//!     Arc::new(LogNotifier),
//! );
//!
//! let record = orchestrator
//!     .submit(NewSubmission::new("tax-ref-42", "payload/2026/q1"))
//!     .await?;
//! println!("submission {} is {}", record.id, record.status);
//! # Ok(())
//! # }
//! ```

use super::escalation::EscalationHandler;
use super::status_poller::StatusPoller;
use super::ShutdownSignal;
use crate::config::{FilingConfig, PollerSettings};
use crate::error::Result;
use crate::events::{names, EventPublisher};
use crate::gateway::{GatewayError, RemoteGateway};
use crate::models::{
    AuditAction, NewAuditEntry, NewRetryEntry, NewSubmission, SubmissionRecord,
};
use crate::notifier::Notifier;
use crate::retry::backoff::BackoffProfile;
use crate::retry::executor::{RetryExecutor, RetryOutcome};
use crate::state_machine::{machine, StateMachineError, SubmissionEvent, SubmissionState};
use crate::store::{StoreError, SubmissionStore, SubmissionUpdate};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const ACTOR: &str = "orchestrator";

/// Coordinates submission attempts, polling, queued retries, and escalation
pub struct SubmissionOrchestrator {
    store: Arc<dyn SubmissionStore>,
    gateway: Arc<dyn RemoteGateway>,
    events: EventPublisher,
    executor: RetryExecutor,
    escalation: EscalationHandler,
    slow_profile: BackoffProfile,
    poller_settings: PollerSettings,
    shutdown: Arc<ShutdownSignal>,
}

impl SubmissionOrchestrator {
    pub fn new(
        config: FilingConfig,
        store: Arc<dyn SubmissionStore>,
        gateway: Arc<dyn RemoteGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let events = EventPublisher::new(config.events.channel_capacity);
        let escalation = EscalationHandler::new(store.clone(), notifier, events.clone());

        Self {
            store,
            gateway,
            events,
            executor: RetryExecutor::new(config.backoff.fast),
            escalation,
            slow_profile: config.backoff.slow,
            poller_settings: config.poller,
            shutdown: ShutdownSignal::new(),
        }
    }

    /// Lifecycle event publisher, for subscribing observers
    pub fn events(&self) -> &EventPublisher {
        &self.events
    }

    /// Submit a payload for filing.
    ///
    /// Idempotent on the correlation id: a duplicate request returns the
    /// existing record without contacting the remote system again.
    pub async fn submit(&self, new: NewSubmission) -> Result<SubmissionRecord> {
        let correlation_id = new.correlation_id.unwrap_or_else(Uuid::new_v4);

        if let Some(existing) = self.store.find_by_correlation_id(correlation_id).await? {
            debug!(
                submission_id = %existing.id,
                correlation_id = %correlation_id,
                "Duplicate submit; returning existing record"
            );
            return Ok(existing);
        }

        let record = match self.store.create_submission(new, correlation_id).await {
            Ok(record) => record,
            // Lost a creation race; the winner's record is authoritative
            Err(StoreError::DuplicateCorrelationId(_)) => {
                return self
                    .store
                    .find_by_correlation_id(correlation_id)
                    .await?
                    .ok_or_else(|| {
                        StoreError::Backend(format!(
                            "correlation id {correlation_id} indexed but record missing"
                        ))
                        .into()
                    });
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            submission_id = %record.id,
            subject_id = %record.subject_id,
            correlation_id = %correlation_id,
            "📨 Submission created"
        );
        self.events.publish(
            names::CREATED,
            record.id,
            serde_json::json!({
                "subject_id": &record.subject_id,
                "correlation_id": correlation_id,
            }),
        );

        self.drive(record).await
    }

    /// Current record for a submission, including the human-readable
    /// last-error summary.
    pub async fn get_status(&self, submission_id: Uuid) -> Result<SubmissionRecord> {
        Ok(self.store.get_submission(submission_id).await?)
    }

    /// Manually re-drive a submission.
    ///
    /// Valid from `RetryScheduled`, or from `Failed` when the stored error
    /// is retryable (operator override). Any other state is refused before
    /// a single write happens.
    pub async fn retry_submission(&self, submission_id: Uuid) -> Result<SubmissionRecord> {
        let record = self.store.get_submission(submission_id).await?;

        if !matches!(
            record.status,
            SubmissionState::RetryScheduled | SubmissionState::Failed
        ) {
            return Err(StateMachineError::InvalidTransition {
                from: record.status.to_string(),
                event: SubmissionEvent::BeginRetry.event_type().to_string(),
            }
            .into());
        }
        let target = machine::target_state(&record, &SubmissionEvent::BeginRetry)?;

        let updated = self
            .store
            .transition_submission(
                submission_id,
                &[record.status],
                SubmissionUpdate::new()
                    .with_status(target)
                    .with_attempts(record.attempts + 1),
            )
            .await?;

        info!(
            submission_id = %submission_id,
            attempt = updated.attempts,
            "🔁 Re-driving submission"
        );
        self.drive(updated).await
    }

    /// Process every due retry-queue entry.
    ///
    /// Claiming marks entries `Processed` atomically, so concurrent sweeps
    /// (e.g. two scheduler workers) never retry the same entry twice. A
    /// failed retry is captured on its submission record, never by leaving
    /// the entry pending.
    ///
    /// Returns the number of entries claimed.
    pub async fn process_retry_queue(&self) -> Result<u32> {
        let due = self.store.claim_due_retries(Utc::now()).await?;
        if due.is_empty() {
            return Ok(0);
        }

        info!(count = due.len(), "⏰ Processing due retry entries");
        let retries = due.iter().map(|entry| {
            let submission_id = entry.submission_id;
            async move {
                if let Err(e) = self.retry_submission(submission_id).await {
                    warn!(
                        submission_id = %submission_id,
                        error = %e,
                        "Queued retry failed; outcome is captured on the record"
                    );
                }
            }
        });
        futures::future::join_all(retries).await;

        Ok(due.len() as u32)
    }

    /// Request cooperative shutdown of background pollers. Records being
    /// polled stay in their current resumable state.
    pub fn shutdown(&self) {
        info!("🛑 Shutdown requested; stopping background pollers");
        self.shutdown.trigger();
    }

    /// Drive one submission round: the fast-profile attempt loop plus the
    /// conversion of its outcome into record state.
    ///
    /// `record.attempts` must already count the attempt about to be made.
    async fn drive(&self, record: SubmissionRecord) -> Result<SubmissionRecord> {
        let submission_id = record.id;
        let base_attempts = record.attempts;
        let correlation_id = record.correlation_id;
        let payload_ref = record.payload_ref.clone();

        let gateway = self.gateway.clone();
        let store = self.store.clone();

        let outcome = self
            .executor
            .execute(
                move |_attempt| {
                    let gateway = gateway.clone();
                    let payload_ref = payload_ref.clone();
                    async move { gateway.submit(&payload_ref, correlation_id).await }
                },
                move |next_attempt, gateway_error| {
                    let store = store.clone();
                    async move {
                        let cumulative = base_attempts + next_attempt - 1;
                        record_fast_retry(&*store, submission_id, cumulative, gateway_error)
                            .await;
                    }
                },
            )
            .await;

        match outcome {
            RetryOutcome::Completed { value: ack, attempts } => {
                let cumulative = base_attempts + attempts - 1;
                let remote_submission_id = ack.remote_submission_id;
                let current = self.store.get_submission(submission_id).await?;
                let target =
                    machine::target_state(&current, &SubmissionEvent::SubmitSucceeded)?;
                let updated = self
                    .store
                    .transition_submission(
                        submission_id,
                        &[current.status],
                        SubmissionUpdate::new()
                            .with_status(target)
                            .with_attempts(cumulative)
                            .with_remote_submission_id(&remote_submission_id)
                            .clearing_last_error(),
                    )
                    .await?;

                let details = serde_json::json!({
                    "remote_submission_id": &remote_submission_id,
                    "attempts": cumulative,
                });
                self.store
                    .append_audit(
                        NewAuditEntry::new(submission_id, AuditAction::Submitted, ACTOR)
                            .with_details(details.clone()),
                    )
                    .await?;
                info!(
                    submission_id = %submission_id,
                    remote_submission_id = %remote_submission_id,
                    attempts = cumulative,
                    "📤 Remote acknowledged submission"
                );
                self.events.publish(names::SUBMITTED, submission_id, details);

                self.spawn_poller(submission_id, remote_submission_id);
                Ok(updated)
            }

            RetryOutcome::RetryScheduled { error, attempts } => {
                let cumulative = base_attempts + attempts - 1;
                let rounds = self.store.count_retry_entries(submission_id).await?;
                if rounds >= self.slow_profile.max_attempts {
                    return self
                        .fail_terminally(submission_id, cumulative, error, true)
                        .await;
                }
                self.schedule_retry(submission_id, cumulative, rounds + 1, error)
                    .await
            }

            RetryOutcome::Fatal { error, attempts } => {
                let cumulative = base_attempts + attempts - 1;
                self.fail_terminally(submission_id, cumulative, error, false)
                    .await
            }
        }
    }

    /// Convert fast-budget exhaustion into a queued slow-profile retry.
    async fn schedule_retry(
        &self,
        submission_id: Uuid,
        attempts: u32,
        round: u32,
        error: GatewayError,
    ) -> Result<SubmissionRecord> {
        let scheduled_for = self.slow_profile.next_retry_at(round, Utc::now());

        let current = self.store.get_submission(submission_id).await?;
        let target = machine::target_state(&current, &SubmissionEvent::ScheduleRetry)?;
        let updated = self
            .store
            .transition_submission(
                submission_id,
                &[current.status],
                SubmissionUpdate::new()
                    .with_status(target)
                    .with_attempts(attempts)
                    .with_last_error(error.clone().into()),
            )
            .await?;

        if let Err(e) = self
            .store
            .enqueue_retry(NewRetryEntry {
                submission_id,
                attempt: attempts + 1,
                scheduled_for,
            })
            .await
        {
            // A pending entry already covers this submission
            warn!(submission_id = %submission_id, error = %e, "Retry entry not enqueued");
        }

        let details = serde_json::json!({
            "attempt": attempts + 1,
            "profile": "slow",
            "scheduled_for": scheduled_for,
            "error_code": error.code.to_string(),
        });
        self.store
            .append_audit(
                NewAuditEntry::new(submission_id, AuditAction::RetryScheduled, ACTOR)
                    .with_details(details.clone()),
            )
            .await?;
        info!(
            submission_id = %submission_id,
            scheduled_for = %scheduled_for,
            round,
            "Submission retry queued"
        );
        self.events
            .publish(names::RETRY_SCHEDULED, submission_id, details);

        Ok(updated)
    }

    /// Terminally fail a submission and escalate.
    async fn fail_terminally(
        &self,
        submission_id: Uuid,
        attempts: u32,
        error: GatewayError,
        retries_exhausted: bool,
    ) -> Result<SubmissionRecord> {
        let submission_error: crate::models::SubmissionError = error.into();

        let current = self.store.get_submission(submission_id).await?;
        let target = machine::target_state(
            &current,
            &SubmissionEvent::Fail(submission_error.message.clone()),
        )?;
        let updated = self
            .store
            .transition_submission(
                submission_id,
                &[current.status],
                SubmissionUpdate::new()
                    .with_status(target)
                    .with_attempts(attempts)
                    .with_last_error(submission_error.clone()),
            )
            .await?;

        let details = serde_json::json!({
            "outcome": target.to_string(),
            "reason": if retries_exhausted { "retries_exhausted" } else { "fatal_error" },
            "error_code": submission_error.code.to_string(),
            "attempts": attempts,
        });
        self.store
            .append_audit(
                NewAuditEntry::new(submission_id, AuditAction::TerminalReached, ACTOR)
                    .with_details(details.clone()),
            )
            .await?;
        error!(
            submission_id = %submission_id,
            error = %submission_error.summary(),
            retries_exhausted,
            "Submission failed terminally"
        );
        self.events.publish(names::FAILED, submission_id, details);

        self.escalation
            .handle(submission_id, &submission_error, retries_exhausted)
            .await;

        Ok(updated)
    }

    /// Start the background status poller for an acknowledged submission.
    ///
    /// Fire-and-forget with respect to the caller; completion is observable
    /// through status reads and lifecycle events.
    fn spawn_poller(&self, submission_id: Uuid, remote_submission_id: String) {
        let poller = StatusPoller::new(
            self.store.clone(),
            self.gateway.clone(),
            self.escalation.clone(),
            self.events.clone(),
            self.poller_settings.clone(),
            self.shutdown.clone(),
        );
        tokio::spawn(async move {
            let outcome = poller.poll(submission_id, &remote_submission_id).await;
            debug!(
                submission_id = %submission_id,
                outcome = ?outcome,
                "Status poller finished"
            );
        });
    }
}

/// Persist one in-call retry: bump the attempt counter, move to `Retrying`,
/// store the triggering error, and append the audit row.
///
/// Free function so the executor hook can own its captures without
/// borrowing the orchestrator across the backoff sleep.
async fn record_fast_retry(
    store: &dyn SubmissionStore,
    submission_id: Uuid,
    attempt: u32,
    error: GatewayError,
) {
    let record = match store.get_submission(submission_id).await {
        Ok(record) => record,
        Err(e) => {
            warn!(submission_id = %submission_id, error = %e, "Failed to load record for retry");
            return;
        }
    };

    let target = match machine::target_state(&record, &SubmissionEvent::BeginRetry) {
        Ok(target) => target,
        Err(e) => {
            warn!(submission_id = %submission_id, error = %e, "Record left the retryable state");
            return;
        }
    };

    if let Err(e) = store
        .transition_submission(
            submission_id,
            &[record.status],
            SubmissionUpdate::new()
                .with_status(target)
                .with_attempts(attempt)
                .with_last_error(error.clone().into()),
        )
        .await
    {
        warn!(submission_id = %submission_id, error = %e, "Failed to persist in-call retry");
        return;
    }

    let details = serde_json::json!({
        "attempt": attempt,
        "profile": "fast",
        "error_code": error.code.to_string(),
    });
    if let Err(e) = store
        .append_audit(
            NewAuditEntry::new(submission_id, AuditAction::RetryScheduled, ACTOR)
                .with_details(details),
        )
        .await
    {
        warn!(submission_id = %submission_id, error = %e, "Failed to record in-call retry");
    }
}
