//! Bounded, oldest-first credit history.
//!
//! # Invariants
//!
//! 1. `len() <= HISTORY_CAPACITY` at all times.
//! 2. Insertion always appends; at capacity the oldest entry is evicted
//!    (FIFO), so the log always equals the last `min(capacity, accepted)`
//!    values in arrival order.
//! 3. The log is owned and mutated only by the store; every other component
//!    sees read-only snapshots.

use serde::{Deserialize, Serialize};

/// Number of recent observations retained.
pub const HISTORY_CAPACITY: usize = 50;

/// Ordered sequence of observed values, oldest first, bounded to the most
/// recent [`HISTORY_CAPACITY`] entries.
///
/// Serializes transparently as a plain number array, which is also the
/// durable-storage representation for the `creditHistory` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: Vec<f64>,
}

impl HistoryLog {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from persisted entries, keeping only the most recent
    /// [`HISTORY_CAPACITY`] if the input is oversized.
    #[must_use]
    pub fn from_entries(entries: Vec<f64>) -> Self {
        let mut log = Self { entries };
        let excess = log.entries.len().saturating_sub(HISTORY_CAPACITY);
        if excess > 0 {
            log.entries.drain(..excess);
        }
        log
    }

    /// Append a value, evicting the oldest entry when at capacity.
    ///
    /// Returns the evicted value, if any.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.entries.len() == HISTORY_CAPACITY {
            Some(self.entries.remove(0))
        } else {
            None
        };
        self.entries.push(value);
        evicted
    }

    /// The newest entry, which always equals the persisted last value.
    #[must_use]
    pub fn last(&self) -> Option<f64> {
        self.entries.last().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only view, oldest first.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.entries
    }

    /// Owned snapshot for handing across context boundaries.
    #[must_use]
    pub fn snapshot(&self) -> Vec<f64> {
        self.entries.clone()
    }
}
