//! Time source abstraction for deterministic testing.
//!
//! Every time-based behavior in CreditWatch (the relay's health-probe
//! interval, injection backoff delays, the pending-history timeout) reads
//! time through a [`Clock`]. In production the clock is wall time; in tests
//! a [`LabClock`] is advanced manually, so no test ever sleeps.
//!
//! `Clock` is cheaply cloneable; all clones of a lab-backed clock share the
//! same [`LabClock`] and therefore see the same time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use web_time::{Duration, Instant};

/// A manually-advanceable clock for deterministic tests.
///
/// All [`Clock`] handles created from the same `LabClock` observe the same
/// time. Advancing never goes backwards.
#[derive(Debug, Clone)]
pub struct LabClock {
    epoch: Instant,
    offset_us: Arc<AtomicU64>,
}

impl LabClock {
    /// Create a new lab clock starting at `Instant::now()`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            offset_us: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance the lab clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        let us = delta.as_micros().min(u64::MAX as u128) as u64;
        self.offset_us.fetch_add(us, Ordering::Release);
    }

    /// Current lab time.
    #[must_use]
    pub fn now(&self) -> Instant {
        let offset = Duration::from_micros(self.offset_us.load(Ordering::Acquire));
        self.epoch + offset
    }
}

impl Default for LabClock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
enum TimeSource {
    /// Real wall-clock time.
    Real,
    /// Deterministic lab clock for testing.
    Lab(LabClock),
}

/// Cloneable handle onto a time source.
#[derive(Debug, Clone)]
pub struct Clock {
    source: TimeSource,
}

impl Clock {
    /// A clock backed by real wall time.
    #[must_use]
    pub fn real() -> Self {
        Self {
            source: TimeSource::Real,
        }
    }

    /// A clock backed by a [`LabClock`].
    #[must_use]
    pub fn lab(clock: &LabClock) -> Self {
        Self {
            source: TimeSource::Lab(clock.clone()),
        }
    }

    /// Current time according to this clock's source.
    #[must_use]
    pub fn now(&self) -> Instant {
        match &self.source {
            TimeSource::Real => Instant::now(),
            TimeSource::Lab(c) => c.now(),
        }
    }

    /// Whether this clock uses a lab time source.
    #[inline]
    #[must_use]
    pub fn is_lab(&self) -> bool {
        matches!(self.source, TimeSource::Lab(_))
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::real()
    }
}
