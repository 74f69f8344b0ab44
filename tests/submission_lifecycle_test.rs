//! End-to-end lifecycle scenarios: submit, in-call retries, background
//! polling, terminal outcomes, and escalation.

mod common;

use common::{harness, wait_for_event};
use filing_core::error::FilingError;
use filing_core::events::names;
use filing_core::gateway::{GatewayError, RemoteState};
use filing_core::models::{AuditAction, ErrorCode, NewSubmission};
use filing_core::state_machine::SubmissionState;
use filing_core::SubmissionStore;
use std::time::Duration;
use uuid::Uuid;

#[tokio::test]
async fn test_end_to_end_transient_failure_then_accepted() {
    let h = harness();
    h.gateway
        .push_submit_failure(GatewayError::from_status(503, "service unavailable"));
    h.gateway.push_submit_ack("R1");
    h.gateway.push_status(RemoteState::Accepted);

    let mut events = h.orchestrator.events().subscribe();

    let record = h
        .orchestrator
        .submit(NewSubmission::new("subject-S1", "payload/P1"))
        .await
        .unwrap();

    // Submit returned after the remote acknowledgement
    assert_eq!(record.status, SubmissionState::Submitted);
    assert_eq!(record.attempts, 2);
    assert_eq!(record.remote_submission_id.as_deref(), Some("R1"));

    wait_for_event(&mut events, names::ACCEPTED).await;

    let resolved = h.orchestrator.get_status(record.id).await.unwrap();
    assert_eq!(resolved.status, SubmissionState::Accepted);
    assert_eq!(resolved.attempts, 2);
    assert_eq!(resolved.remote_submission_id.as_deref(), Some("R1"));
    assert!(resolved.last_error.is_none());

    let trail = h.store.audit_trail(record.id).await.unwrap();
    assert!(trail
        .iter()
        .any(|e| e.action == AuditAction::TerminalReached));
    // Acceptance never escalates
    assert_eq!(h.notifier.alert_count(), 0);
}

#[tokio::test]
async fn test_two_transient_failures_then_success_audit_trail() {
    let h = harness();
    h.gateway
        .push_submit_failure(GatewayError::from_status(503, "service unavailable"));
    h.gateway
        .push_submit_failure(GatewayError::rate_limited("slow down"));
    h.gateway.push_submit_ack("R2");

    let record = h
        .orchestrator
        .submit(NewSubmission::new("subject-S1", "payload/P1"))
        .await
        .unwrap();

    assert_eq!(record.status, SubmissionState::Submitted);
    assert_eq!(record.attempts, 3);

    let trail = h.store.audit_trail(record.id).await.unwrap();
    let retries: Vec<_> = trail
        .iter()
        .filter(|e| e.action == AuditAction::RetryScheduled)
        .collect();
    let submits: Vec<_> = trail
        .iter()
        .filter(|e| e.action == AuditAction::Submitted)
        .collect();

    assert_eq!(retries.len(), 2);
    assert!(retries.iter().all(|e| e.details["profile"] == "fast"));
    assert_eq!(submits.len(), 1);
    assert_eq!(submits[0].details["attempts"], 3);
}

#[tokio::test]
async fn test_duplicate_correlation_id_is_idempotent() {
    let h = harness();
    let correlation_id = Uuid::new_v4();

    let first = h
        .orchestrator
        .submit(
            NewSubmission::new("subject-S1", "payload/P1").with_correlation_id(correlation_id),
        )
        .await
        .unwrap();
    let second = h
        .orchestrator
        .submit(
            NewSubmission::new("subject-S1", "payload/P1").with_correlation_id(correlation_id),
        )
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(h.store.submission_count(), 1);
    // The duplicate request never reached the remote system
    assert_eq!(h.gateway.submit_call_count(), 1);
}

#[tokio::test]
async fn test_client_error_fails_without_retries() {
    let h = harness();
    h.gateway
        .push_submit_failure(GatewayError::from_status(422, "schema validation failed"));

    let record = h
        .orchestrator
        .submit(NewSubmission::new("subject-S1", "payload/P1"))
        .await
        .unwrap();

    assert_eq!(record.status, SubmissionState::Failed);
    assert_eq!(record.attempts, 1);
    let error = record.last_error.unwrap();
    assert_eq!(error.code, ErrorCode::Http(422));
    assert!(!error.retryable);
    assert_eq!(h.gateway.submit_call_count(), 1);

    let trail = h.store.audit_trail(record.id).await.unwrap();
    assert!(trail
        .iter()
        .any(|e| e.action == AuditAction::TerminalReached
            && e.details["reason"] == "fatal_error"));
    assert!(trail.iter().any(|e| e.action == AuditAction::Escalated));
    // 4xx escalates at medium severity: no operator page
    assert_eq!(h.notifier.alert_count(), 0);
}

#[tokio::test]
async fn test_server_error_fatal_escalates_high() {
    let h = harness();
    // 501 is a server-side failure outside the retryable set
    h.gateway
        .push_submit_failure(GatewayError::from_status(501, "not implemented"));

    let record = h
        .orchestrator
        .submit(NewSubmission::new("subject-S1", "payload/P1"))
        .await
        .unwrap();

    assert_eq!(record.status, SubmissionState::Failed);
    assert_eq!(h.notifier.alert_count(), 1);
    let alerts = h.notifier.alerts.lock();
    assert_eq!(alerts[0].0, "submission_failure");
    assert_eq!(alerts[0].1, record.id);
    assert_eq!(alerts[0].2["severity"], "high");
}

#[tokio::test]
async fn test_fast_budget_exhaustion_schedules_slow_retry() {
    let h = harness();
    for _ in 0..3 {
        h.gateway
            .push_submit_failure(GatewayError::timeout("no response"));
    }

    let record = h
        .orchestrator
        .submit(NewSubmission::new("subject-S1", "payload/P1"))
        .await
        .unwrap();

    assert_eq!(record.status, SubmissionState::RetryScheduled);
    assert_eq!(record.attempts, 3);
    assert_eq!(record.last_error.as_ref().unwrap().code, ErrorCode::Timeout);

    let entries = h.store.retry_entries(record.id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].attempt, 4);

    let trail = h.store.audit_trail(record.id).await.unwrap();
    let retries: Vec<_> = trail
        .iter()
        .filter(|e| e.action == AuditAction::RetryScheduled)
        .collect();
    // Two in-call retries plus the queued slow-profile entry
    assert_eq!(retries.len(), 3);
    assert_eq!(retries[2].details["profile"], "slow");
    assert_eq!(retries[2].details["attempt"], 4);
}

#[tokio::test]
async fn test_retry_refused_on_terminal_record() {
    let h = harness();
    h.gateway.push_submit_ack("R1");
    h.gateway.push_status(RemoteState::Accepted);

    let mut events = h.orchestrator.events().subscribe();
    let record = h
        .orchestrator
        .submit(NewSubmission::new("subject-S1", "payload/P1"))
        .await
        .unwrap();
    wait_for_event(&mut events, names::ACCEPTED).await;

    let before = h.orchestrator.get_status(record.id).await.unwrap();
    let trail_before = h.store.audit_trail(record.id).await.unwrap().len();

    let result = h.orchestrator.retry_submission(record.id).await;
    assert!(matches!(result, Err(FilingError::InvalidState(_))));

    // No writes happened: record and audit trail are untouched
    let after = h.orchestrator.get_status(record.id).await.unwrap();
    assert_eq!(after, before);
    assert_eq!(
        h.store.audit_trail(record.id).await.unwrap().len(),
        trail_before
    );
}

#[tokio::test]
async fn test_poll_timeout_leaves_record_unresolved() {
    let h = harness();
    h.gateway.push_submit_ack("R1");
    // Status script left empty: every poll observes Processing

    let record = h
        .orchestrator
        .submit(NewSubmission::new("subject-S1", "payload/P1"))
        .await
        .unwrap();
    assert_eq!(record.status, SubmissionState::Submitted);

    // 3 polls at 10ms intervals; wait out the budget
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let current = h.orchestrator.get_status(record.id).await.unwrap();
        if current.last_error.is_some() {
            assert_eq!(current.status, SubmissionState::Submitted);
            let error = current.last_error.unwrap();
            assert_eq!(error.code, ErrorCode::PollTimeout);
            assert!(error.retryable);
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "poller never flagged the timeout"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Ambiguous remote state is never forced to Failed
    let current = h.orchestrator.get_status(record.id).await.unwrap();
    assert_ne!(current.status, SubmissionState::Failed);

    let trail = h.store.audit_trail(record.id).await.unwrap();
    let checks = trail
        .iter()
        .filter(|e| e.action == AuditAction::StatusChecked)
        .count();
    assert_eq!(checks, 3);
}

#[tokio::test]
async fn test_rejected_outcome_records_error_and_escalates() {
    let h = harness();
    h.gateway.push_submit_ack("R1");
    h.gateway.push_status_with_details(
        RemoteState::Rejected,
        serde_json::json!("duplicate filing period"),
    );

    let mut events = h.orchestrator.events().subscribe();
    let record = h
        .orchestrator
        .submit(NewSubmission::new("subject-S1", "payload/P1"))
        .await
        .unwrap();
    wait_for_event(&mut events, names::REJECTED).await;

    let resolved = h.orchestrator.get_status(record.id).await.unwrap();
    assert_eq!(resolved.status, SubmissionState::Rejected);
    let error = resolved.last_error.unwrap();
    assert_eq!(error.code, ErrorCode::RemoteRejected);
    assert_eq!(error.message, "duplicate filing period");

    let trail = h.store.audit_trail(record.id).await.unwrap();
    assert!(trail.iter().any(|e| e.action == AuditAction::Escalated));
}

#[tokio::test]
async fn test_shutdown_cancels_polling_without_writes() {
    let mut config = common::test_config();
    config.poller.poll_interval_ms = 500;
    config.poller.max_poll_attempts = 5;
    let h = common::harness_with(config);
    h.gateway.push_submit_ack("R1");

    let record = h
        .orchestrator
        .submit(NewSubmission::new("subject-S1", "payload/P1"))
        .await
        .unwrap();
    assert_eq!(record.status, SubmissionState::Submitted);

    h.orchestrator.shutdown();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Cancellation leaves the record resumable: no timeout flag, no
    // terminal status
    let current = h.orchestrator.get_status(record.id).await.unwrap();
    assert_eq!(current.status, SubmissionState::Submitted);
    assert!(current.last_error.is_none());
}
