//! # Submission Model
//!
//! Core record tracking one logical filing attempt against the remote
//! government gateway.
//!
//! ## Overview
//!
//! A `SubmissionRecord` is created when a filer's payload is handed to the
//! orchestrator and lives until a terminal outcome (`Accepted`, `Rejected`,
//! `Failed`) is observed. The `correlation_id` is client-generated and acts
//! as the idempotency key with the remote system: only one active record
//! exists per correlation id, and the same key is reused across every retry
//! of the same logical filing.
//!
//! ## Invariants
//!
//! - `status` only changes through the transitions in
//!   [`crate::state_machine::machine`]
//! - `attempts` counts submission attempts (not status polls) and never
//!   decreases
//! - terminal records are immutable, except the explicit operator retry
//!   path out of `Failed`

use crate::state_machine::states::SubmissionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Represents one logical filing attempt and its lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Store-assigned identifier
    pub id: Uuid,
    /// Client-generated idempotency key, reused with the remote API across retries
    pub correlation_id: Uuid,
    /// The filer's external reference (e.g. a taxpayer reference)
    pub subject_id: String,
    /// Opaque reference to the structured form data owned by the ingestion layer
    pub payload_ref: String,
    /// Current lifecycle state
    pub status: SubmissionState,
    /// Number of submission attempts made so far (>= 1)
    pub attempts: u32,
    /// Identifier assigned by the remote system once it acknowledges receipt
    pub remote_submission_id: Option<String>,
    /// Most recent error observed for this submission, if any
    pub last_error: Option<SubmissionError>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionRecord {
    /// Human-readable summary of the last error, suitable for filer-facing
    /// status queries. Never exposes a transport-level error shape.
    pub fn error_summary(&self) -> Option<String> {
        self.last_error.as_ref().map(SubmissionError::summary)
    }
}

/// New submission for creation (without store-assigned fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubmission {
    pub subject_id: String,
    pub payload_ref: String,
    /// Caller-supplied idempotency key; generated by the orchestrator if absent
    pub correlation_id: Option<Uuid>,
}

impl NewSubmission {
    pub fn new(subject_id: impl Into<String>, payload_ref: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            payload_ref: payload_ref.into(),
            correlation_id: None,
        }
    }

    /// Pin the idempotency key (duplicate requests with the same key resolve
    /// to the same record)
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// Normalized error code produced at the remote gateway boundary.
///
/// Transport-specific shapes (HTTP statuses, timeouts, connection failures)
/// are folded into this single representation so every downstream component
/// classifies errors the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Remote responded with an HTTP status outside the success range
    Http(u16),
    /// Request timed out before the remote responded
    Timeout,
    /// Remote signalled rate limiting
    RateLimit,
    /// Remote signalled an internal server failure
    ServerError,
    /// Authentication failed after a token refresh
    AuthFailed,
    /// Remote rejected the payload shape outright
    MalformedPayload,
    /// Remote processed the filing and rejected it as a business outcome
    RemoteRejected,
    /// Remote reported the filing failed on its side
    RemoteFailed,
    /// Status polling budget exhausted without a terminal outcome
    PollTimeout,
    /// Unclassified failure
    Unknown,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(status) => write!(f, "HTTP_{status}"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::ServerError => write!(f, "SERVER_ERROR"),
            Self::AuthFailed => write!(f, "AUTH_FAILED"),
            Self::MalformedPayload => write!(f, "MALFORMED_PAYLOAD"),
            Self::RemoteRejected => write!(f, "REMOTE_REJECTED"),
            Self::RemoteFailed => write!(f, "REMOTE_FAILED"),
            Self::PollTimeout => write!(f, "POLL_TIMEOUT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Structured error snapshot stored on a submission record (`last_error`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionError {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
    pub occurred_at: DateTime<Utc>,
}

impl SubmissionError {
    pub fn new(code: ErrorCode, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            code,
            message: message.into(),
            retryable,
            occurred_at: Utc::now(),
        }
    }

    /// Filer-facing one-line summary
    pub fn summary(&self) -> String {
        format!("{}: {}", self.code, self.message)
    }
}
