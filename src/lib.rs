#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Filing Core
//!
//! Submission orchestration and status-tracking core for digital tax
//! filing.
//!
//! ## Overview
//!
//! This crate files structured tax documents with an external government
//! submission API and tracks their multi-stage, asynchronously resolved
//! lifecycle to a final accepted or rejected outcome. It owns the hard
//! parts of that workflow:
//!
//! - **exactly-once submits** per logical attempt, idempotent on a
//!   client-generated correlation id
//! - **bounded exponential backoff** across two profiles: in-call retries
//!   during the initial submit and queued retries processed by a sweep
//! - **asynchronous status polling** until a terminal remote outcome
//! - **an auditable, append-only record** of every lifecycle transition
//! - **operator escalation** when retries are exhausted or a fatal error
//!   occurs
//!
//! Document ingestion, tax arithmetic, payment collection, storage engine
//! internals, and the remote wire format are external collaborators,
//! reached through the traits in [`store`], [`gateway`], and [`notifier`].
//!
//! ## Module Organization
//!
//! - [`models`] - Submission records, retry-queue entries, audit log
//! - [`state_machine`] - Lifecycle states and the transition table
//! - [`store`] - Persistence contract and the in-memory implementation
//! - [`gateway`] - Remote submission API contract
//! - [`retry`] - Backoff profiles, error classification, retry executor
//! - [`orchestration`] - Orchestrator, status poller, escalation
//! - [`events`] - Lifecycle event broadcasting
//! - [`config`] - Configuration loading
//! - [`error`] - Public error type
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use filing_core::config::FilingConfig;
//! use filing_core::models::NewSubmission;
//! use filing_core::notifier::LogNotifier;
//! use filing_core::orchestration::SubmissionOrchestrator;
//! use filing_core::store::InMemoryStore;
//! # use filing_core::gateway::RemoteGateway;
//!
//! # async fn example(gateway: Arc<dyn RemoteGateway>) -> Result<(), Box<dyn std::error::Error>> {
//! filing_core::logging::init_structured_logging();
//!
//! let orchestrator = SubmissionOrchestrator::new(
//!     FilingConfig::load()?,
//!     Arc::new(InMemoryStore::new()),
//!     gateway,
//!     Arc::new(LogNotifier),
//! );
//!
//! let record = orchestrator
//!     .submit(NewSubmission::new("tax-ref-42", "payload/2026/q1"))
//!     .await?;
//! let status = orchestrator.get_status(record.id).await?;
//! println!("filing is {}", status.status);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod notifier;
pub mod orchestration;
pub mod retry;
pub mod state_machine;
pub mod store;

pub use config::FilingConfig;
pub use error::{FilingError, Result};
pub use gateway::{GatewayError, RemoteGateway, RemoteState, RemoteStatus, SubmissionAck};
pub use models::{
    AuditAction, AuditLogEntry, ErrorCode, NewSubmission, RetryQueueEntry, SubmissionError,
    SubmissionRecord,
};
pub use notifier::{LogNotifier, Notifier};
pub use orchestration::{EscalationHandler, StatusPoller, SubmissionOrchestrator};
pub use state_machine::SubmissionState;
pub use store::{InMemoryStore, SubmissionStore};
