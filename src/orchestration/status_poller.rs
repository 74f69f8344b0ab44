//! # Status Poller
//!
//! Background polling of the remote system for a submitted filing until a
//! terminal outcome is observed or the poll budget runs out.
//!
//! ## Overview
//!
//! Government processing is asynchronous: a successful submit only means
//! the payload was received. The poller checks the remote status on a
//! fixed interval, persisting every observation as an audit row, and
//! applies the terminal transition when one appears.
//!
//! Budget exhaustion is an ambiguous remote state, not a failure: the
//! record keeps its last non-terminal status and is flagged for manual
//! re-check through a retryable `POLL_TIMEOUT` last-error. Cancellation
//! through the shared shutdown signal stops the loop without writing
//! anything, so a fresh poller can resume from stored state later.

use super::escalation::EscalationHandler;
use super::ShutdownSignal;
use crate::config::PollerSettings;
use crate::events::{names, EventPublisher};
use crate::gateway::{RemoteGateway, RemoteState};
use crate::models::{AuditAction, ErrorCode, NewAuditEntry, SubmissionError};
use crate::retry::classifier;
use crate::state_machine::{machine, SubmissionEvent, SubmissionState};
use crate::store::{StoreError, SubmissionStore, SubmissionUpdate};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const ACTOR: &str = "status_poller";

/// How a polling run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A terminal remote state was observed and persisted
    Terminal(SubmissionState),
    /// Poll budget exhausted without a terminal state
    TimedOut,
    /// Shutdown was requested; the record was left untouched
    Cancelled,
    /// The record left the polled state (e.g. operator intervention)
    Superseded,
}

/// Polls the remote gateway for one submission's resolution
pub struct StatusPoller {
    store: Arc<dyn SubmissionStore>,
    gateway: Arc<dyn RemoteGateway>,
    escalation: EscalationHandler,
    events: EventPublisher,
    settings: PollerSettings,
    shutdown: Arc<ShutdownSignal>,
}

impl StatusPoller {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        gateway: Arc<dyn RemoteGateway>,
        escalation: EscalationHandler,
        events: EventPublisher,
        settings: PollerSettings,
        shutdown: Arc<ShutdownSignal>,
    ) -> Self {
        Self {
            store,
            gateway,
            escalation,
            events,
            settings,
            shutdown,
        }
    }

    /// Poll until a terminal state, budget exhaustion, or cancellation.
    pub async fn poll(&self, submission_id: Uuid, remote_submission_id: &str) -> PollOutcome {
        let max_attempts = self.settings.max_poll_attempts;
        let interval = self.settings.poll_interval();

        for attempt in 1..=max_attempts {
            if self.shutdown.is_triggered() {
                return PollOutcome::Cancelled;
            }

            let status = tokio::select! {
                _ = self.shutdown.wait() => return PollOutcome::Cancelled,
                status = self.gateway.get_status(remote_submission_id) => status,
            };

            match status {
                Ok(remote) => {
                    self.record_observation(submission_id, remote.state, attempt).await;

                    if remote.state.is_terminal() {
                        return self
                            .apply_terminal(submission_id, remote.state, remote.details)
                            .await;
                    }
                }
                Err(error) => {
                    // A failed status check consumes budget but never
                    // touches the record; the next tick may succeed.
                    warn!(
                        submission_id = %submission_id,
                        poll_attempt = attempt,
                        error = %error,
                        "Status check failed"
                    );
                }
            }

            if attempt < max_attempts {
                tokio::select! {
                    _ = self.shutdown.wait() => return PollOutcome::Cancelled,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        }

        self.flag_poll_timeout(submission_id).await;
        PollOutcome::TimedOut
    }

    /// Persist a status observation: bump the record and append the audit row.
    async fn record_observation(&self, submission_id: Uuid, state: RemoteState, attempt: u32) {
        debug!(
            submission_id = %submission_id,
            remote_state = %state,
            poll_attempt = attempt,
            "📡 Remote status observed"
        );

        if !state.is_terminal() {
            // Touch updated_at so staleness monitors see polling progress
            if let Err(e) = self
                .store
                .update_submission(submission_id, SubmissionUpdate::new())
                .await
            {
                warn!(submission_id = %submission_id, error = %e, "Failed to touch record");
            }
        }

        let details = serde_json::json!({
            "remote_state": state.to_string(),
            "poll_attempt": attempt,
        });
        if let Err(e) = self
            .store
            .append_audit(
                NewAuditEntry::new(submission_id, AuditAction::StatusChecked, ACTOR)
                    .with_details(details.clone()),
            )
            .await
        {
            warn!(submission_id = %submission_id, error = %e, "Failed to record status check");
        }
        self.events
            .publish(names::STATUS_CHECKED, submission_id, details);
    }

    /// Apply an observed terminal remote state to the record.
    async fn apply_terminal(
        &self,
        submission_id: Uuid,
        state: RemoteState,
        details: Option<serde_json::Value>,
    ) -> PollOutcome {
        let (event, error) = match state {
            RemoteState::Accepted => (SubmissionEvent::RemoteAccepted, None),
            RemoteState::Rejected => (
                SubmissionEvent::RemoteRejected,
                Some(self.remote_error(ErrorCode::RemoteRejected, &details)),
            ),
            RemoteState::Failed => (
                SubmissionEvent::RemoteFailed,
                Some(self.remote_error(ErrorCode::RemoteFailed, &details)),
            ),
            _ => unreachable!("apply_terminal called with non-terminal state"),
        };

        let current = match self.store.get_submission(submission_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(submission_id = %submission_id, error = %e, "Record vanished during poll");
                return PollOutcome::Superseded;
            }
        };

        let target = match machine::target_state(&current, &event) {
            Ok(target) => target,
            Err(e) => {
                warn!(
                    submission_id = %submission_id,
                    status = %current.status,
                    error = %e,
                    "Record no longer in a pollable state"
                );
                return PollOutcome::Superseded;
            }
        };

        let mut update = SubmissionUpdate::new().with_status(target);
        if let Some(error) = &error {
            update = update.with_last_error(error.clone());
        }

        match self
            .store
            .transition_submission(submission_id, &[current.status], update)
            .await
        {
            Ok(_) => {}
            Err(StoreError::UnexpectedState { .. }) => return PollOutcome::Superseded,
            Err(e) => {
                warn!(submission_id = %submission_id, error = %e, "Failed to persist terminal state");
                return PollOutcome::Superseded;
            }
        }

        let audit_details = serde_json::json!({
            "outcome": target.to_string(),
            "remote_state": state.to_string(),
            "details": details,
        });
        if let Err(e) = self
            .store
            .append_audit(
                NewAuditEntry::new(submission_id, AuditAction::TerminalReached, ACTOR)
                    .with_details(audit_details.clone()),
            )
            .await
        {
            warn!(submission_id = %submission_id, error = %e, "Failed to record terminal audit entry");
        }

        match target {
            SubmissionState::Accepted => {
                info!(submission_id = %submission_id, "✅ Filing accepted by remote system");
                self.events
                    .publish(names::ACCEPTED, submission_id, audit_details);
            }
            SubmissionState::Rejected => {
                info!(submission_id = %submission_id, "Filing rejected by remote system");
                self.events
                    .publish(names::REJECTED, submission_id, audit_details);
                if let Some(error) = &error {
                    self.escalation.handle(submission_id, error, false).await;
                }
            }
            SubmissionState::Failed => {
                warn!(submission_id = %submission_id, "Filing failed on the remote side");
                self.events
                    .publish(names::FAILED, submission_id, audit_details);
                if let Some(error) = &error {
                    self.escalation.handle(submission_id, error, false).await;
                }
            }
            _ => {}
        }

        PollOutcome::Terminal(target)
    }

    fn remote_error(
        &self,
        code: ErrorCode,
        details: &Option<serde_json::Value>,
    ) -> SubmissionError {
        let message = details
            .as_ref()
            .and_then(|d| d.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("remote system reported {code}"));
        SubmissionError::new(code, message, classifier::is_retryable(&code))
    }

    /// Flag the record for manual re-check after budget exhaustion.
    /// The last observed non-terminal status is preserved.
    async fn flag_poll_timeout(&self, submission_id: Uuid) {
        warn!(
            submission_id = %submission_id,
            max_poll_attempts = self.settings.max_poll_attempts,
            "Poll budget exhausted without a terminal state; flagging for manual re-check"
        );

        let error = SubmissionError::new(
            ErrorCode::PollTimeout,
            "remote status still unresolved after poll budget",
            classifier::is_retryable(&ErrorCode::PollTimeout),
        );
        if let Err(e) = self
            .store
            .update_submission(
                submission_id,
                SubmissionUpdate::new().with_last_error(error),
            )
            .await
        {
            warn!(submission_id = %submission_id, error = %e, "Failed to flag poll timeout");
        }
    }
}
