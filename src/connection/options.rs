//! Reconnect options and backoff computation.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use resilient_ws::ReconnectOptions;
//!
//! let options = ReconnectOptions::new()
//!     .with_max_reconnect_attempts(2)
//!     .with_base_interval(Duration::from_secs(1))
//!     .with_backoff_multiplier(2.0);
//!
//! assert_eq!(options.delay_for(1), Duration::from_secs(2));
//! assert_eq!(options.delay_for(2), Duration::from_secs(4));
//! ```
//!
//! Options can also be read from JSON. The browser-side client's
//! `reconnectInterval` and `reconnectDecay` keys are accepted as aliases:
//!
//! ```json
//! { "maxReconnectAttempts": 10, "baseIntervalMs": 2000, "backoffMultiplier": 2 }
//! { "maxReconnectAttempts": 10, "reconnectInterval": 2000, "reconnectDecay": 2 }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default delay unit before backoff is applied.
pub const DEFAULT_BASE_INTERVAL_MS: u64 = 1000;

/// Default growth factor per consecutive failure.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.5;

// ============================================================================
// ReconnectOptions
// ============================================================================

/// Reconnection policy of a [`ResilientConnection`](crate::ResilientConnection).
///
/// The delay before retry `n` (counting from 1) is
/// `base_interval_ms * backoff_multiplier^n`. There is no upper cap on the
/// delay; the number of retries is limited by `max_reconnect_attempts`.
///
/// Zero values are taken literally. `max_reconnect_attempts: Some(0)` never
/// retries, and a `base_interval_ms` of 0 retries without waiting. The
/// browser client treated an explicit 0 like a missing key; here only a
/// missing key falls back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReconnectOptions {
    /// Consecutive failed cycles tolerated before giving up.
    ///
    /// `None` retries forever.
    pub max_reconnect_attempts: Option<u32>,

    /// Delay unit in milliseconds.
    #[serde(alias = "reconnectInterval")]
    pub base_interval_ms: u64,

    /// Growth factor applied per consecutive failure.
    #[serde(alias = "reconnectDecay")]
    pub backoff_multiplier: f64,
}

impl Default for ReconnectOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ReconnectOptions {
    /// Creates options with the defaults: unbounded attempts, 1000 ms, x1.5.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_reconnect_attempts: None,
            base_interval_ms: DEFAULT_BASE_INTERVAL_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// Parses options from a JSON object. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the JSON is malformed
    /// - [`Error::Config`] if a value is out of range
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ReconnectOptions {
    /// Limits the number of consecutive reconnect attempts.
    #[inline]
    #[must_use]
    pub const fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = Some(attempts);
        self
    }

    /// Removes the attempt limit.
    #[inline]
    #[must_use]
    pub const fn with_unbounded_attempts(mut self) -> Self {
        self.max_reconnect_attempts = None;
        self
    }

    /// Sets the base interval.
    ///
    /// Sub-millisecond precision is truncated.
    #[inline]
    #[must_use]
    pub fn with_base_interval(mut self, interval: Duration) -> Self {
        self.base_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the backoff multiplier.
    #[inline]
    #[must_use]
    pub const fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }
}

// ============================================================================
// Policy
// ============================================================================

impl ReconnectOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the multiplier is not a finite positive number.
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier <= 0.0 {
            return Err(Error::config(format!(
                "backoffMultiplier must be a finite positive number, got {}",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }

    /// Returns the base interval as a duration.
    #[inline]
    #[must_use]
    pub const fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    /// Returns `true` if another retry may be scheduled after
    /// `attempt_count` consecutive failed cycles.
    #[inline]
    #[must_use]
    pub fn allows_retry(&self, attempt_count: u32) -> bool {
        self.max_reconnect_attempts
            .is_none_or(|max| attempt_count < max)
    }

    /// Delay before retry `attempt` (1 for the first retry).
    ///
    /// Saturates at [`Duration::MAX`] when the result is too large to represent.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let millis = self.base_interval_ms as f64 * self.backoff_multiplier.powi(exponent);

        Duration::try_from_secs_f64(millis / 1000.0).unwrap_or(Duration::MAX)
    }
}

// ============================================================================
// Tests
// ============================================================================
