//! Time-boxed access-token cache for gateway implementations.
//!
//! Tokens are cached until shortly before expiry and refreshed through a
//! caller-supplied future. A 401 from the remote should be followed by
//! [`TokenCache::invalidate`] and one re-authentication before the call is
//! treated as an auth failure.

use super::GatewayError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::Mutex;

/// Leeway subtracted from the expiry when deciding whether a cached token
/// is still usable.
const EXPIRY_LEEWAY_SECONDS: i64 = 30;

/// Bearer token issued by the remote authentication endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Whether the token is expired (or within the refresh leeway) at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - Duration::seconds(EXPIRY_LEEWAY_SECONDS)
    }
}

/// Serializes token refreshes so concurrent callers share one
/// authentication round-trip.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token, refreshing through `refresh` when the slot
    /// is empty or the token has expired.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<AccessToken, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken, GatewayError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            if !token.is_expired(Utc::now()) {
                return Ok(token.clone());
            }
        }

        let token = refresh().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token, forcing re-authentication on the next call.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}
