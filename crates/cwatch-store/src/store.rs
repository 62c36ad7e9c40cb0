//! The single write path.
//!
//! `CreditStore` is the one global instance per installation. Each accepted
//! value goes through the same logical unit: read the persisted history,
//! append (evicting beyond capacity), persist the history and the last
//! value, fan the update out to every reachable consumer, and forward a
//! sanitized analytics record. The read-modify-write of the history is
//! serialized by `&mut self`; no two accepts can interleave their read and
//! write of the same log.
//!
//! Failure policy: best-effort stages (each broadcast destination, the
//! analytics sink) never block or fail the durable write; a durable-write
//! failure aborts the accept before anything is announced.

use cwatch_core::history::HistoryLog;
use cwatch_core::kv::{self, KvError, KvMap, KvStore, keys};
use cwatch_core::message::{Delivery, Destination, Message, MessagePort};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;
use web_time::{SystemTime, UNIX_EPOCH};

use crate::analytics::{AnalyticsEvent, AnalyticsSink, sanitize};

/// Store behavior knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorePolicy {
    /// Whether a value rejected by sanitization is still broadcast locally
    /// before being discarded. Off by default: a value too malformed to
    /// persist is normally too malformed to show.
    pub broadcast_unsanitized: bool,
}

/// Failure of the primary (durable) write path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    Kv(#[from] KvError),
}

/// What `accept` did with the offered value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AcceptOutcome {
    /// Appended and persisted; `evicted` carries the entry pushed out of
    /// the bounded history, if any.
    Accepted { evicted: Option<f64> },
    /// Non-finite value: rejected before persistence, logged, not an error.
    Rejected,
}

/// The authoritative store & broadcaster.
pub struct CreditStore<K, P, A> {
    kv: K,
    port: P,
    sink: A,
    policy: StorePolicy,
    identity: Option<String>,
}

impl<K: KvStore, P: MessagePort, A: AnalyticsSink> CreditStore<K, P, A> {
    /// Open the store, bootstrapping the write-once extension identity
    /// before any analytics forwarding can occur.
    ///
    /// Identity bootstrap is best-effort: if durable storage refuses the
    /// read or write, the store runs with analytics disabled rather than
    /// failing activation.
    pub fn open(kv: K, port: P, sink: A, policy: StorePolicy) -> Self {
        let identity = load_or_create_identity(&kv);
        Self {
            kv,
            port,
            sink,
            policy,
            identity,
        }
    }

    /// Accept one observed value. The single write path.
    pub fn accept(&mut self, value: f64) -> Result<AcceptOutcome, StoreError> {
        if !value.is_finite() {
            tracing::warn!(value, "rejecting non-finite observed value");
            if self.policy.broadcast_unsanitized {
                self.broadcast(value);
            }
            return Ok(AcceptOutcome::Rejected);
        }

        let mut history = self.read_history()?;
        let evicted = history.push(value);

        let mut batch = KvMap::new();
        batch.insert(
            keys::CREDIT_HISTORY.to_string(),
            Value::from(history.snapshot()),
        );
        self.kv.set(batch)?;

        let mut batch = KvMap::new();
        batch.insert(keys::LAST_CREDIT.to_string(), Value::from(value));
        self.kv.set(batch)?;

        self.broadcast(value);
        self.forward_analytics(value);

        tracing::debug!(value, history_len = history.len(), "accepted credit value");
        Ok(AcceptOutcome::Accepted { evicted })
    }

    /// Handle a message addressed at the privileged process.
    pub fn on_message(&mut self, msg: Message) -> Result<(), StoreError> {
        match msg {
            Message::ValueObserved { value } => {
                self.accept(value)?;
                Ok(())
            }
            Message::HistoryRequest { request_id } => self.answer_history(request_id),
            Message::ValueBroadcast { .. } | Message::HistoryResponse { .. } => {
                tracing::trace!("ignoring message not addressed to the store");
                Ok(())
            }
        }
    }

    /// Current persisted history snapshot.
    pub fn history(&self) -> Result<HistoryLog, StoreError> {
        self.read_history()
    }

    /// Current persisted last value.
    pub fn last_value(&self) -> Result<Option<f64>, StoreError> {
        let map = self.kv.get(&[keys::LAST_CREDIT])?;
        Ok(map.get(keys::LAST_CREDIT).and_then(kv::as_number))
    }

    /// The installation identity, if bootstrap succeeded.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn read_history(&self) -> Result<HistoryLog, StoreError> {
        let map = self.kv.get(&[keys::CREDIT_HISTORY])?;
        let entries = match map.get(keys::CREDIT_HISTORY) {
            None => Vec::new(),
            Some(value) => kv::as_number_array(value).unwrap_or_else(|| {
                tracing::warn!("malformed persisted history; starting fresh");
                Vec::new()
            }),
        };
        Ok(HistoryLog::from_entries(entries))
    }

    fn answer_history(&self, request_id: u64) -> Result<(), StoreError> {
        let history = self.read_history()?;
        let last = self.last_value()?;
        let msg = Message::HistoryResponse {
            request_id,
            last,
            history: history.snapshot(),
        };
        // The answer rides the tab channel; relays correlate by request id
        // and everyone else ignores it.
        if let Err(err) = self.port.send(Destination::AllTabs, msg) {
            tracing::debug!(%err, request_id, "failed to answer history request");
        }
        Ok(())
    }

    /// Fan out to every destination, tolerating each failure independently.
    fn broadcast(&self, value: f64) {
        for dest in [Destination::AllTabs, Destination::Panel] {
            match self.port.send(dest, Message::ValueBroadcast { value }) {
                Ok(Delivery::Delivered) => {}
                Ok(Delivery::NoReceiver) => {
                    tracing::trace!(?dest, "no receiver for broadcast");
                }
                Err(err) => {
                    tracing::debug!(?dest, %err, "broadcast destination failed; continuing");
                }
            }
        }
    }

    fn forward_analytics(&self, value: f64) {
        let Some(identity) = &self.identity else {
            return;
        };
        let Some(sanitized) = sanitize(value) else {
            tracing::debug!(value, "analytics event skipped: value not sanitizable");
            return;
        };
        let event = AnalyticsEvent {
            identity: identity.clone(),
            value: sanitized,
            timestamp: unix_millis(),
        };
        if let Err(err) = self.sink.record(&event) {
            tracing::debug!(%err, "analytics sink failure swallowed");
        }
    }
}

fn load_or_create_identity<K: KvStore>(kv: &K) -> Option<String> {
    match kv.get(&[keys::EXTENSION_ID]) {
        Ok(map) => {
            if let Some(existing) = map.get(keys::EXTENSION_ID).and_then(Value::as_str) {
                return Some(existing.to_string());
            }
        }
        Err(err) => {
            tracing::warn!(%err, "could not read extension identity; analytics disabled");
            return None;
        }
    }

    let fresh = Uuid::new_v4().to_string();
    let mut batch = KvMap::new();
    batch.insert(keys::EXTENSION_ID.to_string(), Value::from(fresh.clone()));
    match kv.set(batch) {
        Ok(()) => {
            tracing::debug!("generated extension identity");
            Some(fresh)
        }
        Err(err) => {
            tracing::warn!(%err, "could not persist extension identity; analytics disabled");
            None
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis().min(u128::from(u64::MAX)) as u64)
}
