//! # Configuration
//!
//! Explicit, validated configuration for the orchestration core. Defaults
//! match the documented profiles; deployments override them through an
//! optional YAML file (`FILING_CONFIG_PATH`) and `FILING__`-prefixed
//! environment variables, merged in that order.
//!
//! ```rust,no_run
//! use filing_core::config::FilingConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FilingConfig::load()?;
//! assert!(config.backoff.fast.max_attempts >= 1);
//! # Ok(())
//! # }
//! ```

use crate::retry::backoff::BackoffProfile;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the submission orchestration core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilingConfig {
    /// Fast and slow retry profiles
    pub backoff: BackoffSettings,
    /// Status poller pacing and budget
    pub poller: PollerSettings,
    /// Lifecycle event channel sizing
    pub events: EventSettings,
}

impl Default for FilingConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffSettings::default(),
            poller: PollerSettings::default(),
            events: EventSettings::default(),
        }
    }
}

/// The two retry profiles: in-call (fast) and queued (slow)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffSettings {
    pub fast: BackoffProfile,
    pub slow: BackoffProfile,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            fast: BackoffProfile::fast(),
            slow: BackoffProfile::slow(),
        }
    }
}

/// Status poller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerSettings {
    /// Fixed interval between status checks
    pub poll_interval_ms: u64,
    /// Poll budget before giving up on an ambiguous remote state
    pub max_poll_attempts: u32,
}

impl PollerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 30_000,
            max_poll_attempts: 20,
        }
    }
}

/// Lifecycle event channel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    pub channel_capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 1000,
        }
    }
}

impl FilingConfig {
    /// Load configuration: defaults, then the YAML file named by
    /// `FILING_CONFIG_PATH` (if set), then `FILING__`-prefixed environment
    /// overrides.
    pub fn load() -> Result<Self, crate::error::FilingError> {
        let defaults = config::Config::try_from(&FilingConfig::default())
            .map_err(|e| crate::error::FilingError::Configuration(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Ok(path) = std::env::var("FILING_CONFIG_PATH") {
            builder = builder.add_source(config::File::with_name(&path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("FILING")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| crate::error::FilingError::Configuration(e.to_string()))
    }
}
