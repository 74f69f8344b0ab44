use serde::{Deserialize, Serialize};

/// Events that can trigger submission state transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SubmissionEvent {
    /// Remote acknowledged receipt of the payload
    SubmitSucceeded,
    /// A slow-profile retry was queued for later
    ScheduleRetry,
    /// A retry attempt is starting (in-call backoff or queue sweep)
    BeginRetry,
    /// The submission failed terminally with an error message
    Fail(String),
    /// Poller observed the remote accept the filing
    RemoteAccepted,
    /// Poller observed the remote reject the filing
    RemoteRejected,
    /// Poller observed the remote fail the filing
    RemoteFailed,
}

impl SubmissionEvent {
    /// String representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SubmitSucceeded => "submit_succeeded",
            Self::ScheduleRetry => "schedule_retry",
            Self::BeginRetry => "begin_retry",
            Self::Fail(_) => "fail",
            Self::RemoteAccepted => "remote_accepted",
            Self::RemoteRejected => "remote_rejected",
            Self::RemoteFailed => "remote_failed",
        }
    }

    /// Extract the error message if this is a failure event
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) => Some(msg),
            _ => None,
        }
    }

    /// Check if this event leads to a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Fail(_) | Self::RemoteAccepted | Self::RemoteRejected | Self::RemoteFailed
        )
    }
}
