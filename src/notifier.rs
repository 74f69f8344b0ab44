//! Operator alerting collaborator.
//!
//! Escalations at HIGH severity are handed to a [`Notifier`]; delivery is
//! fire-and-forget and failures never propagate into the orchestration
//! path. Deployments plug in pagers or ticketing systems; the bundled
//! [`LogNotifier`] writes alerts to the structured log.

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;
use uuid::Uuid;

/// External alerting collaborator contract
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Raise an alert for a submission. Implementations may fail; callers
    /// log and swallow the error.
    async fn alert(&self, alert_type: &str, submission_id: Uuid, details: Value)
        -> anyhow::Result<()>;
}

/// Default notifier that writes alerts to the structured log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn alert(
        &self,
        alert_type: &str,
        submission_id: Uuid,
        details: Value,
    ) -> anyhow::Result<()> {
        error!(
            alert_type = %alert_type,
            submission_id = %submission_id,
            details = %details,
            "🚨 OPERATOR ALERT"
        );
        Ok(())
    }
}
