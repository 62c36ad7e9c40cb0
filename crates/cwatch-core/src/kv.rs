//! Durable key-value boundary.
//!
//! The privileged process owns a durable key-value store with three keys:
//! the last accepted credit, the bounded history, and the write-once
//! extension identity. The store trait also carries a change-notification
//! subscription so read-only consumers (the summary panel) can follow
//! mutations made by any writer without polling.
//!
//! Values cross the boundary as loose JSON; typed accessors live next to
//! the trait so every reader interprets stored shapes the same way.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Storage keys. These are the durable contract; renaming one orphans
/// previously persisted state.
pub mod keys {
    /// Most recently accepted credit value (number).
    pub const LAST_CREDIT: &str = "lastCredit";
    /// Bounded history of accepted values (number array, oldest first).
    pub const CREDIT_HISTORY: &str = "creditHistory";
    /// Write-once installation identity (string).
    pub const EXTENSION_ID: &str = "extensionId";
}

/// A batch of key/value pairs, as read from or written to durable storage.
pub type KvMap = BTreeMap<String, Value>;

/// One key mutation, delivered to subscribers after the write lands.
#[derive(Debug, Clone, PartialEq)]
pub struct KvChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// Durable-storage failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvError {
    /// The storage backend is unreachable or refused the operation.
    #[error("durable storage unavailable: {0}")]
    Unavailable(String),
}

/// Identifies one change-notification subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// The durable key-value capability.
///
/// `get`/`set` are fallible; "backend briefly unavailable" is an error the
/// caller handles, not a panic. Change notifications fire once per mutated
/// key, after the mutation is durable, for every writer.
pub trait KvStore {
    /// Read the requested keys. Absent keys are simply missing from the map.
    fn get(&self, keys: &[&str]) -> Result<KvMap, KvError>;

    /// Write all entries in one batch.
    fn set(&self, entries: KvMap) -> Result<(), KvError>;

    /// Register a change listener. The listener stays live until
    /// [`unsubscribe`](KvStore::unsubscribe) is called with the returned id.
    fn subscribe(&self, listener: Box<dyn Fn(&KvChange)>) -> SubscriptionId;

    /// Remove a previously registered listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Interpret a stored value as a number.
#[must_use]
pub fn as_number(value: &Value) -> Option<f64> {
    value.as_f64()
}

/// Interpret a stored value as a number array, rejecting mixed-type arrays.
#[must_use]
pub fn as_number_array(value: &Value) -> Option<Vec<f64>> {
    value
        .as_array()?
        .iter()
        .map(Value::as_f64)
        .collect::<Option<Vec<f64>>>()
}
