//! Reconnection backoff.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use notify_client::{ReconnectionConfig, Reconnector};
//!
//! let config = ReconnectionConfig::new()
//!     .with_initial_delay(Duration::from_millis(100))
//!     .with_max_retries(3);
//! let mut reconnector = Reconnector::new(&config);
//!
//! reconnector.next().await?; // waits 100ms
//! reconnector.next().await?; // waits 200ms
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default delay before the first reconnect attempt.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Default retry budget.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Default delay restored by [`Reconnector::reset`].
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_millis(100);

// ============================================================================
// Types
// ============================================================================

/// Maps the current delay to the delay of the following attempt.
pub type GrowthFn = Arc<dyn Fn(Duration) -> Duration + Send + Sync>;

fn default_growth() -> GrowthFn {
    Arc::new(|delay| delay.saturating_mul(2))
}

// ============================================================================
// ReconnectionConfig
// ============================================================================

/// Backoff policy.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectionConfig {
    /// Delay before the first attempt (milliseconds when deserialized).
    #[serde(deserialize_with = "crate::millis::deserialize")]
    pub initial_delay: Duration,

    /// Attempts allowed before giving up.
    pub max_retries: u32,

    /// Delay restored whenever a fresh channel opens (milliseconds when
    /// deserialized).
    #[serde(deserialize_with = "crate::millis::deserialize")]
    pub reset_delay: Duration,

    /// Delay growth between attempts.
    #[serde(skip, default = "default_growth")]
    pub growth: GrowthFn,
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconnectionConfig {
    /// Creates the default policy: 1s, doubling, 10 retries, 100ms reset.
    #[must_use]
    pub fn new() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
            reset_delay: DEFAULT_RESET_DELAY,
            growth: default_growth(),
        }
    }

    /// Sets the delay before the first attempt.
    #[inline]
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the retry budget.
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the delay restored by a reset.
    #[inline]
    #[must_use]
    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }

    /// Sets the growth function.
    #[inline]
    #[must_use]
    pub fn with_growth<F>(mut self, growth: F) -> Self
    where
        F: Fn(Duration) -> Duration + Send + Sync + 'static,
    {
        self.growth = Arc::new(growth);
        self
    }
}

impl fmt::Debug for ReconnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconnectionConfig")
            .field("initial_delay", &self.initial_delay)
            .field("max_retries", &self.max_retries)
            .field("reset_delay", &self.reset_delay)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Reconnector
// ============================================================================

/// Backoff scheduler.
///
/// Single-owner: at most one [`Reconnector::next`] is outstanding at a time.
pub struct Reconnector {
    delay: Duration,
    retries: u32,
    max_retries: u32,
    reset_delay: Duration,
    growth: GrowthFn,
}

impl Reconnector {
    /// Creates a scheduler from a policy.
    #[must_use]
    pub fn new(config: &ReconnectionConfig) -> Self {
        Self {
            delay: config.initial_delay,
            retries: 0,
            max_retries: config.max_retries,
            reset_delay: config.reset_delay,
            growth: Arc::clone(&config.growth),
        }
    }

    /// Restores the reset delay and clears the retry counter.
    pub fn reset(&mut self) {
        self.delay = self.reset_delay;
        self.retries = 0;
    }

    /// Consumes one retry and returns how long to wait for it.
    ///
    /// The stored delay advances through the growth function for the
    /// following call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RetriesExhausted`] once the budget is spent.
    pub fn advance(&mut self) -> Result<Duration> {
        if self.retries >= self.max_retries {
            return Err(Error::retries_exhausted(self.max_retries));
        }

        self.retries += 1;
        let delay = self.delay;
        self.delay = (self.growth)(delay);

        debug!(attempt = self.retries, max = self.max_retries, ?delay, "Reconnect scheduled");
        Ok(delay)
    }

    /// Waits for the next attempt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RetriesExhausted`] immediately once the budget is
    /// spent.
    pub async fn next(&mut self) -> Result<()> {
        let delay = self.advance()?;
        sleep(delay).await;
        Ok(())
    }

    /// Delay the next attempt will wait.
    #[inline]
    #[must_use]
    pub fn current_delay(&self) -> Duration {
        self.delay
    }

    /// Attempts consumed since the last reset.
    #[inline]
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

impl fmt::Debug for Reconnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconnector")
            .field("delay", &self.delay)
            .field("retries", &self.retries)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
