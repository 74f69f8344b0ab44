//! # Error Classification
//!
//! Retryable-versus-fatal classification for normalized gateway errors, and
//! the severity ladder used when escalating failures to an operator.
//!
//! Classification happens once, against the normalized [`ErrorCode`]
//! produced at the gateway boundary; every downstream component consumes
//! the resulting flag instead of re-inspecting transport shapes.

use crate::models::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an error is worth retrying automatically.
///
/// Retryable: HTTP 408, 429, 500, 502, 503, 504, plus symbolic timeouts,
/// rate limits, and server errors. Everything else is fatal and requires an
/// operator decision.
pub fn is_retryable(code: &ErrorCode) -> bool {
    match code {
        ErrorCode::Http(status) => matches!(status, 408 | 429 | 500 | 502 | 503 | 504),
        ErrorCode::Timeout | ErrorCode::RateLimit | ErrorCode::ServerError => true,
        // An exhausted poll budget is an ambiguous remote state, not a
        // permanent failure; a later manual re-check may still resolve it.
        ErrorCode::PollTimeout => true,
        // A remote-side processing failure may be re-filed by an operator.
        ErrorCode::RemoteFailed => true,
        ErrorCode::AuthFailed
        | ErrorCode::MalformedPayload
        | ErrorCode::RemoteRejected
        | ErrorCode::Unknown => false,
    }
}

/// Escalation severity for a failed submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Classify escalation severity for an error.
    ///
    /// HIGH when the remote responded with a server-side failure or the
    /// retry budget is exhausted, MEDIUM for client-side (4xx-class)
    /// failures, LOW otherwise.
    pub fn classify(code: &ErrorCode, retries_exhausted: bool) -> Self {
        if retries_exhausted {
            return Self::High;
        }
        match code {
            ErrorCode::Http(status) if *status >= 500 => Self::High,
            ErrorCode::ServerError | ErrorCode::RemoteFailed => Self::High,
            ErrorCode::Http(status) if *status >= 400 => Self::Medium,
            ErrorCode::RateLimit
            | ErrorCode::AuthFailed
            | ErrorCode::MalformedPayload
            | ErrorCode::RemoteRejected => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}
