//! # Escalation Handler
//!
//! Surfaces unrecoverable submission failures to human operators.
//!
//! Escalation is strictly side-effecting: it records an audit row,
//! publishes a lifecycle event, and alerts the notifier at HIGH severity.
//! Any failure inside escalation is logged and swallowed so the submission
//! state machine is never corrupted by a broken alerting path.

use crate::events::{names, EventPublisher};
use crate::models::{AuditAction, NewAuditEntry, SubmissionError};
use crate::notifier::Notifier;
use crate::retry::Severity;
use crate::store::SubmissionStore;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

const ACTOR: &str = "escalation_handler";

/// Classifies failure severity and notifies operators
#[derive(Clone)]
pub struct EscalationHandler {
    store: Arc<dyn SubmissionStore>,
    notifier: Arc<dyn Notifier>,
    events: EventPublisher,
}

impl EscalationHandler {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        notifier: Arc<dyn Notifier>,
        events: EventPublisher,
    ) -> Self {
        Self {
            store,
            notifier,
            events,
        }
    }

    /// Escalate a failed submission.
    ///
    /// `retries_exhausted` distinguishes an exhausted retry budget from a
    /// single fatal error; both escalate, but exhaustion is always HIGH.
    pub async fn handle(
        &self,
        submission_id: Uuid,
        error: &SubmissionError,
        retries_exhausted: bool,
    ) {
        let severity = Severity::classify(&error.code, retries_exhausted);
        let details = serde_json::json!({
            "severity": severity,
            "error_code": error.code.to_string(),
            "error_message": &error.message,
            "retries_exhausted": retries_exhausted,
        });

        if let Err(e) = self
            .store
            .append_audit(
                NewAuditEntry::new(submission_id, AuditAction::Escalated, ACTOR)
                    .with_details(details.clone()),
            )
            .await
        {
            warn!(
                submission_id = %submission_id,
                error = %e,
                "Failed to record escalation audit entry"
            );
        }

        self.events
            .publish(names::ESCALATED, submission_id, details.clone());

        if severity == Severity::High {
            if let Err(e) = self
                .notifier
                .alert("submission_failure", submission_id, details)
                .await
            {
                warn!(
                    submission_id = %submission_id,
                    error = %e,
                    "Notifier alert failed; continuing"
                );
            }
        }
    }
}
