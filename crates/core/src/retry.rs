//! Bounded exponential backoff for deferred work.
//!
//! The dispatcher consults a [`RetryPolicy`] after a unit of work fails with
//! a transient error: either the item is rescheduled `delay_for(attempt)`
//! into the future, or attempts are exhausted and it is marked failed.

use std::time::Duration;

/// Deterministic exponential backoff: `base * 2^(attempt - 1)`, capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        let base_delay = base_delay.max(Duration::from_millis(1));
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// Spend recording: contention on the summary row clears quickly.
    pub fn spend_recording() -> Self {
        Self::new(5, Duration::from_secs(30), Duration::from_secs(600))
    }

    /// Dayparting and budget sweeps; the next tick also reconciles drift.
    pub fn sweep() -> Self {
        Self::new(3, Duration::from_secs(60), Duration::from_secs(600))
    }

    /// Daily and monthly resets.
    pub fn budget_reset() -> Self {
        Self::new(3, Duration::from_secs(300), Duration::from_secs(1800))
    }

    /// Spend-record retention cleanup.
    pub fn retention() -> Self {
        Self::new(2, Duration::from_secs(300), Duration::from_secs(1800))
    }

    /// Delay before the next try, given the 1-based number of the attempt
    /// that just failed.
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Whether another attempt is allowed after `attempts_made` tries.
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::sweep()
    }
}
