//! Top-level error type for the public orchestration API.
//!
//! Callers never see raw transport errors: gateway failures are captured
//! into submission records and audit rows before any outcome is surfaced.

use crate::state_machine::StateMachineError;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilingError {
    /// The requested operation is not legal for the record's current state
    #[error("Invalid submission state: {0}")]
    InvalidState(#[from] StateMachineError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, FilingError>;
