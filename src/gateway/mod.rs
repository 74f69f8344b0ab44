//! # Remote Gateway Client
//!
//! Contract for the external government submission API.
//!
//! ## Overview
//!
//! The orchestration core talks to the remote system exclusively through
//! the [`RemoteGateway`] trait: authenticate, submit a payload under an
//! idempotency key, and fetch the status of an acknowledged submission.
//! Implementations own the wire format; this crate only depends on the
//! typed outcomes declared here.
//!
//! All failures cross the boundary as [`GatewayError`], carrying a
//! normalized [`ErrorCode`] and a `retryable` flag computed once by the
//! classifier. No other component inspects transport error shapes.
//!
//! The remote contract is assumed to deduplicate submits by idempotency
//! key; even if it does not, the core issues exactly one submit per
//! recorded attempt, bounding duplicate risk to the explicit retry count.

pub mod token;

use crate::models::{ErrorCode, SubmissionError};
use crate::retry::classifier;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

pub use token::{AccessToken, TokenCache};

/// Acknowledgement returned by a successful submit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionAck {
    /// Identifier the remote system assigned to the filing
    pub remote_submission_id: String,
}

/// Processing state reported by the remote system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteState {
    /// Payload received, not yet picked up for processing
    Received,
    /// Processing in progress
    Processing,
    /// Filing accepted
    Accepted,
    /// Filing rejected as a business outcome
    Rejected,
    /// Filing failed on the remote side
    Failed,
}

impl RemoteState {
    /// Check if no further remote transitions will occur
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Failed)
    }
}

impl fmt::Display for RemoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => write!(f, "received"),
            Self::Processing => write!(f, "processing"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Status snapshot for an acknowledged submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteStatus {
    pub state: RemoteState,
    /// Remote-supplied detail, e.g. rejection reasons
    pub details: Option<Value>,
}

/// Structured error produced at the gateway boundary.
///
/// The `retryable` flag is computed from the normalized code when the error
/// is constructed, so classification happens exactly once.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct GatewayError {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
    pub occurred_at: DateTime<Utc>,
}

impl GatewayError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            retryable: classifier::is_retryable(&code),
            code,
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }

    /// Normalize an HTTP status into a gateway error
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Http(status), message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimit, message)
    }

    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthFailed, message)
    }
}

impl From<GatewayError> for SubmissionError {
    fn from(error: GatewayError) -> Self {
        SubmissionError {
            code: error.code,
            message: error.message,
            retryable: error.retryable,
            occurred_at: error.occurred_at,
        }
    }
}

/// Abstract client for the external submission API.
///
/// Every operation must be safe to retry given the same idempotency key.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Obtain an access token. Implementations are expected to cache and
    /// refresh via [`TokenCache`] rather than re-authenticating per call.
    async fn authenticate(&self) -> Result<AccessToken, GatewayError>;

    /// Submit a payload under the given idempotency key.
    async fn submit(
        &self,
        payload_ref: &str,
        correlation_id: Uuid,
    ) -> Result<SubmissionAck, GatewayError>;

    /// Fetch the current processing status of an acknowledged submission.
    async fn get_status(&self, remote_submission_id: &str) -> Result<RemoteStatus, GatewayError>;
}
