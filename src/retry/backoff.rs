//! # Backoff Profiles
//!
//! Exponential backoff with a maximum-delay cap and optional jitter.
//!
//! ## Overview
//!
//! Two independently configured profiles drive retry timing:
//!
//! - the **fast profile** paces in-call retries during the initial submit
//!   (base 5s, cap 5min, 3 attempts)
//! - the **slow profile** paces queued retries processed by the sweep
//!   (base 5min, cap 4h, 4 attempts)
//!
//! Delays grow as `base * 2^(attempt-1)` up to the cap. Jitter randomizes
//! the result by up to ±10% to avoid thundering-herd retries against the
//! remote gateway; the jittered delay never exceeds the cap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one backoff profile.
///
/// Delays are carried in milliseconds so test environments can shrink them
/// below a second without a separate clock abstraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffProfile {
    /// Base delay for the first retry
    pub base_delay_ms: u64,
    /// Cap applied after exponential growth
    pub max_delay_ms: u64,
    /// Exponential multiplier
    pub multiplier: f64,
    /// Whether to randomize delays
    pub jitter_enabled: bool,
    /// Maximum jitter fraction (0.0 to 1.0)
    pub max_jitter: f64,
    /// Attempt budget for this profile
    pub max_attempts: u32,
}

impl BackoffProfile {
    /// In-call retry profile: base 5s, cap 5min, 3 attempts.
    pub fn fast() -> Self {
        Self {
            base_delay_ms: 5_000,
            max_delay_ms: 300_000,
            multiplier: 2.0,
            jitter_enabled: true,
            max_jitter: 0.1,
            max_attempts: 3,
        }
    }

    /// Queued retry profile: base 5min, cap 4h, 4 attempts.
    pub fn slow() -> Self {
        Self {
            base_delay_ms: 300_000,
            max_delay_ms: 14_400_000,
            multiplier: 2.0,
            jitter_enabled: true,
            max_jitter: 0.1,
            max_attempts: 4,
        }
    }

    /// Delay before the retry that follows `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63);
        let exponential = (self.base_delay_ms as f64) * self.multiplier.powi(exponent as i32);
        let capped = exponential.min(self.max_delay_ms as f64) as u64;

        let delay_ms = if self.jitter_enabled {
            self.apply_jitter(capped)
        } else {
            capped
        };

        Duration::from_millis(delay_ms)
    }

    /// Absolute time at which the retry following `attempt` becomes due.
    pub fn next_retry_at(&self, attempt: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        let delay = self.delay_for_attempt(attempt);
        now + chrono::Duration::milliseconds(delay.as_millis() as i64)
    }

    /// Randomize a delay by up to `max_jitter` in either direction, staying
    /// within `[0, max_delay_ms]`.
    fn apply_jitter(&self, delay_ms: u64) -> u64 {
        use rand::Rng;

        let jitter_range = (delay_ms as f64 * self.max_jitter) as u64;
        if jitter_range == 0 {
            return delay_ms;
        }

        let mut rng = rand::thread_rng();
        let jitter = rng.gen_range(0..=jitter_range);
        let jittered = if rng.gen_bool(0.5) {
            delay_ms.saturating_add(jitter)
        } else {
            delay_ms.saturating_sub(jitter)
        };

        jittered.min(self.max_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn no_jitter(base_ms: u64, max_ms: u64) -> BackoffProfile {
        BackoffProfile {
            base_delay_ms: base_ms,
            max_delay_ms: max_ms,
            multiplier: 2.0,
            jitter_enabled: false,
            max_jitter: 0.0,
            max_attempts: 5,
        }
    }

    #[test]
    fn test_exponential_growth() {
        let profile = no_jitter(5_000, 300_000);
        assert_eq!(profile.delay_for_attempt(1), Duration::from_secs(5));
        assert_eq!(profile.delay_for_attempt(2), Duration::from_secs(10));
        assert_eq!(profile.delay_for_attempt(3), Duration::from_secs(20));
    }

    #[test]
    fn test_cap_applies() {
        let profile = no_jitter(5_000, 12_000);
        assert_eq!(profile.delay_for_attempt(3), Duration::from_millis(12_000));
        assert_eq!(profile.delay_for_attempt(10), Duration::from_millis(12_000));
    }

    #[test]
    fn test_default_profiles() {
        let fast = BackoffProfile::fast();
        assert_eq!(fast.base_delay_ms, 5_000);
        assert_eq!(fast.max_attempts, 3);

        let slow = BackoffProfile::slow();
        assert_eq!(slow.base_delay_ms, 300_000);
        assert_eq!(slow.max_delay_ms, 14_400_000);
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let profile = BackoffProfile {
            jitter_enabled: true,
            max_jitter: 0.1,
            ..no_jitter(10_000, 300_000)
        };

        for _ in 0..100 {
            let delay = profile.delay_for_attempt(1).as_millis() as u64;
            assert!(delay >= 9_000, "jittered delay {delay} below -10% bound");
            assert!(delay <= 11_000, "jittered delay {delay} above +10% bound");
        }
    }

    #[test]
    fn test_jitter_never_exceeds_cap() {
        let profile = BackoffProfile {
            jitter_enabled: true,
            max_jitter: 0.1,
            ..no_jitter(10_000, 10_500)
        };

        for _ in 0..100 {
            let delay = profile.delay_for_attempt(5).as_millis() as u64;
            assert!(delay <= 10_500);
        }
    }

    proptest! {
        #[test]
        fn prop_delay_non_decreasing_and_capped(
            base in 1u64..60_000,
            cap in 60_000u64..14_400_000,
        ) {
            let profile = no_jitter(base, cap);
            let mut previous = Duration::ZERO;
            for attempt in 1..=5u32 {
                let delay = profile.delay_for_attempt(attempt);
                prop_assert!(delay >= previous);
                prop_assert!(delay.as_millis() as u64 <= cap);
                previous = delay;
            }
        }
    }
}
