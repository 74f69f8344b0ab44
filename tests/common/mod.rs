#![allow(dead_code)]

//! Shared test harness: a scripted remote gateway, a recording notifier,
//! and orchestrator construction with test-scale timing.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use filing_core::config::{BackoffSettings, EventSettings, FilingConfig, PollerSettings};
use filing_core::events::publisher::LifecycleEvent;
use filing_core::gateway::{
    AccessToken, GatewayError, RemoteGateway, RemoteState, RemoteStatus, SubmissionAck,
};
use filing_core::notifier::Notifier;
use filing_core::orchestration::SubmissionOrchestrator;
use filing_core::retry::backoff::BackoffProfile;
use filing_core::store::InMemoryStore;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Remote gateway double driven by scripted responses.
///
/// Responses are consumed in order; once a script runs dry the gateway
/// falls back to acknowledging submits and reporting `Processing`.
#[derive(Default)]
pub struct ScriptedGateway {
    submit_script: Mutex<VecDeque<Result<SubmissionAck, GatewayError>>>,
    status_script: Mutex<VecDeque<Result<RemoteStatus, GatewayError>>>,
    pub submit_calls: AtomicU32,
    pub status_calls: AtomicU32,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_submit_ack(&self, remote_submission_id: &str) {
        self.submit_script.lock().push_back(Ok(SubmissionAck {
            remote_submission_id: remote_submission_id.to_string(),
        }));
    }

    pub fn push_submit_failure(&self, error: GatewayError) {
        self.submit_script.lock().push_back(Err(error));
    }

    pub fn push_status(&self, state: RemoteState) {
        self.status_script.lock().push_back(Ok(RemoteStatus {
            state,
            details: None,
        }));
    }

    pub fn push_status_with_details(&self, state: RemoteState, details: Value) {
        self.status_script.lock().push_back(Ok(RemoteStatus {
            state,
            details: Some(details),
        }));
    }

    pub fn push_status_failure(&self, error: GatewayError) {
        self.status_script.lock().push_back(Err(error));
    }

    pub fn submit_call_count(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteGateway for ScriptedGateway {
    async fn authenticate(&self) -> Result<AccessToken, GatewayError> {
        Ok(AccessToken::new(
            "test-token",
            Utc::now() + ChronoDuration::hours(1),
        ))
    }

    async fn submit(
        &self,
        _payload_ref: &str,
        _correlation_id: Uuid,
    ) -> Result<SubmissionAck, GatewayError> {
        let call = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.submit_script.lock().pop_front().unwrap_or_else(|| {
            Ok(SubmissionAck {
                remote_submission_id: format!("R-default-{call}"),
            })
        })
    }

    async fn get_status(
        &self,
        _remote_submission_id: &str,
    ) -> Result<RemoteStatus, GatewayError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status_script
            .lock()
            .pop_front()
            .unwrap_or(Ok(RemoteStatus {
                state: RemoteState::Processing,
                details: None,
            }))
    }
}

/// Notifier double that records every alert it receives
#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: Mutex<Vec<(String, Uuid, Value)>>,
}

impl RecordingNotifier {
    pub fn alert_count(&self) -> usize {
        self.alerts.lock().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn alert(
        &self,
        alert_type: &str,
        submission_id: Uuid,
        details: Value,
    ) -> anyhow::Result<()> {
        self.alerts
            .lock()
            .push((alert_type.to_string(), submission_id, details));
        Ok(())
    }
}

pub struct TestHarness {
    pub orchestrator: SubmissionOrchestrator,
    pub store: Arc<InMemoryStore>,
    pub gateway: Arc<ScriptedGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

/// Millisecond-scale config so retry and poll loops finish within a test
pub fn test_config() -> FilingConfig {
    FilingConfig {
        backoff: BackoffSettings {
            fast: BackoffProfile {
                base_delay_ms: 1,
                max_delay_ms: 5,
                multiplier: 2.0,
                jitter_enabled: false,
                max_jitter: 0.0,
                max_attempts: 3,
            },
            // Queue entries become due immediately
            slow: BackoffProfile {
                base_delay_ms: 0,
                max_delay_ms: 0,
                multiplier: 2.0,
                jitter_enabled: false,
                max_jitter: 0.0,
                max_attempts: 4,
            },
        },
        poller: PollerSettings {
            poll_interval_ms: 10,
            max_poll_attempts: 3,
        },
        events: EventSettings {
            channel_capacity: 64,
        },
    }
}

pub fn harness() -> TestHarness {
    harness_with(test_config())
}

pub fn harness_with(config: FilingConfig) -> TestHarness {
    let store = Arc::new(InMemoryStore::new());
    let gateway = Arc::new(ScriptedGateway::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator =
        SubmissionOrchestrator::new(config, store.clone(), gateway.clone(), notifier.clone());

    TestHarness {
        orchestrator,
        store,
        gateway,
        notifier,
    }
}

/// Block until a lifecycle event with the given name arrives
pub async fn wait_for_event(
    receiver: &mut broadcast::Receiver<LifecycleEvent>,
    name: &str,
) -> LifecycleEvent {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let event = receiver.recv().await.expect("event channel closed");
            if event.name == name {
                return event;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for event {name}"))
}
