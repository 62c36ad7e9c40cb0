//! Bounded exponential backoff for observer injection.
//!
//! The retry schedule is a small value object rather than ambient timer
//! chains: max attempts, a base delay that doubles per attempt, and a
//! ceiling. Attempt numbering is 1-based; `delay_for(1)` is the base delay.

use web_time::Duration;

/// Bounded exponential-backoff schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Give up after this many failed attempts.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub base: Duration,
    /// Delays never exceed this ceiling.
    pub ceiling: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_secs(1),
            ceiling: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    ///
    /// Doubles per attempt, saturating at the ceiling.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(63);
        let factor = 1u64 << doublings;
        self.base
            .checked_mul(u32::try_from(factor).unwrap_or(u32::MAX))
            .unwrap_or(self.ceiling)
            .min(self.ceiling)
    }

    /// Whether another attempt is allowed after `attempts` failures so far.
    #[must_use]
    pub fn allows(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}
