//! # Submission State Machine
//!
//! Lifecycle state management for submission records. The transition table
//! lives in [`machine`] as a pure function; persistence happens through the
//! store's compare-and-set operations so concurrent components can never
//! apply conflicting transitions.

pub mod errors;
pub mod events;
pub mod machine;
pub mod states;

pub use errors::StateMachineError;
pub use events::SubmissionEvent;
pub use states::SubmissionState;
