//! Exponential reconnect backoff.
//!
//! Delay for retry `n` (0-based) is `initial * multiplier^n`, capped at
//! `max_delay`. After `max_retries` consecutive failures there is no next
//! delay and the caller gives up. The feed link and the broker link each
//! carry their own counter.

use std::time::Duration;

use crate::error::{Result, SbsError};

/// Backoff policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Delay before the first retry.
    pub initial: Duration,
    /// Growth factor per retry.
    pub multiplier: f64,
    /// Delay cap.
    pub max_delay: Duration,
    /// Consecutive retries allowed before giving up.
    pub max_retries: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff {
            initial: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            max_retries: 10,
        }
    }
}

impl Backoff {
    pub fn new(initial: Duration, multiplier: f64, max_delay: Duration, max_retries: u32) -> Self {
        Backoff {
            initial,
            multiplier,
            max_delay,
            max_retries,
        }
    }

    /// Reject policies whose delays would not grow or would start above the cap.
    pub fn validate(&self) -> Result<()> {
        if self.initial.is_zero() {
            return Err(SbsError::Config("backoff initial delay must be > 0".into()));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(SbsError::Config(format!(
                "backoff multiplier must be >= 1.0, got {}",
                self.multiplier
            )));
        }
        if self.max_delay < self.initial {
            return Err(SbsError::Config(
                "backoff max delay must be >= initial delay".into(),
            ));
        }
        Ok(())
    }

    /// Delay before retry number `retry`, or `None` once retries are used up.
    pub fn delay(&self, retry: u32) -> Option<Duration> {
        if retry >= self.max_retries {
            return None;
        }
        let cap = self.max_delay.as_nanos() as f64;
        let exp = i32::try_from(retry).unwrap_or(i32::MAX);
        let nanos = (self.initial.as_nanos() as f64 * self.multiplier.powi(exp)).min(cap);
        Some(Duration::from_nanos(nanos as u64))
    }

    /// The full schedule, one entry per allowed retry.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map_while(move |n| self.delay(n))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
