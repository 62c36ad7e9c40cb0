//! Derived burn-rate metrics.
//!
//! The burn rate is the mean of all strictly positive consecutive decreases
//! in the history, oldest to newest: increases and resets contribute
//! nothing. It is recomputed on demand from an immutable snapshot and never
//! stored, so recomputing from an unchanged history is bit-identical.

use std::fmt;

/// Average per-operation consumption, rounded to 2 decimal places.
///
/// Returns 0 when fewer than two samples exist or no decrease is present.
#[must_use]
pub fn burn_rate(history: &[f64]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut count = 0u32;
    for pair in history.windows(2) {
        let delta = pair[0] - pair[1];
        if delta > 0.0 {
            total += delta;
            count += 1;
        }
    }

    if count == 0 {
        return 0.0;
    }
    let mean = total / f64::from(count);
    (mean * 100.0).round() / 100.0
}

/// Estimated operations remaining before the credit runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpsRemaining {
    /// No positive burn rate (or no credit): no finite estimate exists.
    Unbounded,
    /// `floor(last_value / burn_rate)` operations left.
    Operations(u64),
}

impl fmt::Display for OpsRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(f, "∞"),
            Self::Operations(n) => write!(f, "{n}"),
        }
    }
}

/// Combine the last accepted value with the current burn rate.
#[must_use]
pub fn operations_remaining(last_value: f64, rate: f64) -> OpsRemaining {
    if rate > 0.0 && last_value > 0.0 {
        OpsRemaining::Operations((last_value / rate).floor() as u64)
    } else {
        OpsRemaining::Unbounded
    }
}
