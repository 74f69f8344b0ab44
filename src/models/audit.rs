//! Append-only audit log model.
//!
//! Every lifecycle transition of a submission leaves an audit row behind:
//! submission acknowledgements, scheduled retries, status checks, terminal
//! outcomes, and escalations. Rows are never mutated or deleted; they are
//! retained for compliance review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Action recorded by an audit row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Remote acknowledged receipt of the payload
    Submitted,
    /// A retry was scheduled (in-call backoff or queued slow-profile retry)
    RetryScheduled,
    /// Remote status was observed during polling
    StatusChecked,
    /// The submission reached a terminal state
    TerminalReached,
    /// A failure was escalated to an operator
    Escalated,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::RetryScheduled => write!(f, "retry_scheduled"),
            Self::StatusChecked => write!(f, "status_checked"),
            Self::TerminalReached => write!(f, "terminal_reached"),
            Self::Escalated => write!(f, "escalated"),
        }
    }
}

/// One append-only audit row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub action: AuditAction,
    pub details: Value,
    /// Component that recorded the entry
    pub actor: String,
    pub recorded_at: DateTime<Utc>,
}

/// New audit entry for creation (without store-assigned fields)
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub submission_id: Uuid,
    pub action: AuditAction,
    pub details: Value,
    pub actor: String,
}

impl NewAuditEntry {
    pub fn new(submission_id: Uuid, action: AuditAction, actor: impl Into<String>) -> Self {
        Self {
            submission_id,
            action,
            details: Value::Null,
            actor: actor.into(),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}
