//! Summary view model.

use cwatch_core::kv::{self, KvChange, KvError, KvStore, keys};
use cwatch_core::metrics::{OpsRemaining, burn_rate, operations_remaining};

/// Snapshot handed to whatever renders the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub last_value: Option<f64>,
    /// Oldest first; sparkline-ready.
    pub history: Vec<f64>,
    pub burn_rate: f64,
    pub ops_remaining: OpsRemaining,
}

/// Read-only consumer of store state.
///
/// Driven externally: wire [`on_kv_change`](SummaryPanel::on_kv_change) to
/// the durable store's change notifications and
/// [`on_broadcast`](SummaryPanel::on_broadcast) to the direct channel.
#[derive(Debug, Clone, Default)]
pub struct SummaryPanel {
    last: Option<f64>,
    history: Vec<f64>,
    burn: f64,
}

impl SummaryPanel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One-time initial read of persisted state.
    pub fn load(&mut self, store: &dyn KvStore) -> Result<(), KvError> {
        let map = store.get(&[keys::LAST_CREDIT, keys::CREDIT_HISTORY])?;
        if let Some(last) = map.get(keys::LAST_CREDIT).and_then(kv::as_number) {
            self.last = Some(last);
        }
        if let Some(history) = map.get(keys::CREDIT_HISTORY).and_then(kv::as_number_array) {
            self.set_history(history);
        }
        Ok(())
    }

    /// Apply one durable-storage change notification.
    pub fn on_kv_change(&mut self, change: &KvChange) {
        match change.key.as_str() {
            keys::LAST_CREDIT => {
                self.last = change.new_value.as_ref().and_then(kv::as_number);
            }
            keys::CREDIT_HISTORY => {
                match change.new_value.as_ref().and_then(kv::as_number_array) {
                    Some(history) => self.set_history(history),
                    None => {
                        tracing::warn!("ignoring malformed history change notification");
                    }
                }
            }
            _ => {}
        }
    }

    /// Apply a directly broadcast value.
    ///
    /// The broadcast carries only the value; the matching history arrives
    /// via the storage change notification. Applying the same value twice
    /// changes nothing.
    pub fn on_broadcast(&mut self, value: f64) {
        self.last = Some(value);
    }

    /// False until at least two history points exist — the panel shows an
    /// awaiting-data state rather than a one-point trend.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.history.len() > 1
    }

    /// Current view model. Pure: recomputing from unchanged state yields a
    /// bit-identical summary.
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            last_value: self.last,
            history: self.history.clone(),
            burn_rate: self.burn,
            ops_remaining: operations_remaining(self.last.unwrap_or(0.0), self.burn),
        }
    }

    fn set_history(&mut self, history: Vec<f64>) {
        self.burn = burn_rate(&history);
        self.history = history;
    }
}
