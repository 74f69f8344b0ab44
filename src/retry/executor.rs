//! # Retry Executor
//!
//! Drives an operation through the fast backoff profile, separating
//! retryable from fatal errors and bounding the in-call attempt budget.
//!
//! ## Overview
//!
//! The executor owns only timing and classification. State persistence
//! belongs to the caller, which supplies an `on_retry` hook invoked before
//! each in-call retry; the orchestrator uses it to write the incremented
//! attempt count and audit row through the store, so no record state is
//! held across the backoff sleeps.
//!
//! When the fast budget is exhausted on a retryable error the executor
//! reports [`RetryOutcome::RetryScheduled`] instead of looping further; the
//! caller converts that into a slow-profile queue entry.

use super::backoff::BackoffProfile;
use crate::gateway::GatewayError;
use std::future::Future;
use tracing::debug;

/// Result of driving an operation through the fast retry profile
#[derive(Debug)]
pub enum RetryOutcome<T> {
    /// Operation succeeded after `attempts` tries
    Completed { value: T, attempts: u32 },
    /// Retryable failure with the fast budget exhausted; the caller should
    /// schedule a slow-profile retry
    RetryScheduled { error: GatewayError, attempts: u32 },
    /// Non-retryable failure
    Fatal { error: GatewayError, attempts: u32 },
}

/// Executes operations with in-call exponential backoff
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    profile: BackoffProfile,
}

impl RetryExecutor {
    pub fn new(profile: BackoffProfile) -> Self {
        Self { profile }
    }

    /// Run `operation` until success, a fatal error, or budget exhaustion.
    ///
    /// `operation` receives the in-call attempt number (1-based).
    /// `on_retry` fires with the attempt number about to be made and the
    /// error that triggered it, before the backoff sleep, and is awaited to
    /// completion so persisted attempt N precedes attempt N+1.
    pub async fn execute<T, Op, OpFut, Hook, HookFut>(
        &self,
        mut operation: Op,
        mut on_retry: Hook,
    ) -> RetryOutcome<T>
    where
        Op: FnMut(u32) -> OpFut + Send,
        OpFut: Future<Output = Result<T, GatewayError>> + Send,
        Hook: FnMut(u32, GatewayError) -> HookFut + Send,
        HookFut: Future<Output = ()> + Send,
    {
        let max_attempts = self.profile.max_attempts.max(1);
        let mut attempt = 1u32;

        loop {
            match operation(attempt).await {
                Ok(value) => {
                    return RetryOutcome::Completed {
                        value,
                        attempts: attempt,
                    }
                }
                Err(error) if !error.retryable => {
                    return RetryOutcome::Fatal {
                        error,
                        attempts: attempt,
                    }
                }
                Err(error) if attempt >= max_attempts => {
                    return RetryOutcome::RetryScheduled {
                        error,
                        attempts: attempt,
                    }
                }
                Err(error) => {
                    let delay = self.profile.delay_for_attempt(attempt);
                    debug!(
                        attempt,
                        next_attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Transient failure, backing off before retry"
                    );
                    on_retry(attempt + 1, error).await;
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
