use serde::{Deserialize, Serialize};
use std::fmt;

/// Submission lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    /// Initial state when the record is created
    Pending,
    /// Remote acknowledged receipt; awaiting asynchronous resolution
    Submitted,
    /// A queued retry is waiting for its scheduled time
    RetryScheduled,
    /// A retry attempt is currently in flight
    Retrying,
    /// Remote accepted the filing
    Accepted,
    /// Remote rejected the filing as a business outcome
    Rejected,
    /// The submission failed and no automatic retry remains
    Failed,
}

impl SubmissionState {
    /// Check if this is a terminal state (no further automatic transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Failed)
    }

    /// Check if this is an active state (an attempt is in flight)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Retrying)
    }

    /// Check if the submission is awaiting asynchronous remote resolution
    pub fn awaits_remote(&self) -> bool {
        matches!(self, Self::Submitted)
    }
}

impl Default for SubmissionState {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Submitted => write!(f, "submitted"),
            Self::RetryScheduled => write!(f, "retry_scheduled"),
            Self::Retrying => write!(f, "retrying"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for SubmissionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "submitted" => Ok(Self::Submitted),
            "retry_scheduled" => Ok(Self::RetryScheduled),
            "retrying" => Ok(Self::Retrying),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid submission state: {s}")),
        }
    }
}
