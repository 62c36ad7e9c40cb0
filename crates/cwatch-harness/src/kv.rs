//! In-memory durable key-value store with change notifications.

use std::cell::RefCell;
use std::rc::Rc;

use cwatch_core::kv::{KvChange, KvError, KvMap, KvStore, SubscriptionId};

type Listener = Rc<dyn Fn(&KvChange)>;

#[derive(Default)]
struct KvInner {
    map: KvMap,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
    unavailable: bool,
}

/// Cloneable in-memory [`KvStore`]. All clones share the same state, so a
/// store and a panel fixture can be wired to the same storage.
#[derive(Clone, Default)]
pub struct MemoryKv {
    inner: Rc<RefCell<KvInner>>,
}

impl MemoryKv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent operations fail until [`make_available`](Self::make_available).
    pub fn make_unavailable(&self) {
        self.inner.borrow_mut().unavailable = true;
    }

    pub fn make_available(&self) {
        self.inner.borrow_mut().unavailable = false;
    }

    /// Direct peek for assertions.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.borrow().map.get(key).cloned()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, keys: &[&str]) -> Result<KvMap, KvError> {
        let inner = self.inner.borrow();
        if inner.unavailable {
            return Err(KvError::Unavailable("storage offline".into()));
        }
        Ok(keys
            .iter()
            .filter_map(|k| inner.map.get(*k).map(|v| ((*k).to_string(), v.clone())))
            .collect())
    }

    fn set(&self, entries: KvMap) -> Result<(), KvError> {
        // Apply the batch, collect per-key changes, then notify outside the
        // borrow so listeners may re-enter the store.
        let (changes, listeners) = {
            let mut inner = self.inner.borrow_mut();
            if inner.unavailable {
                return Err(KvError::Unavailable("storage offline".into()));
            }
            let mut changes = Vec::with_capacity(entries.len());
            for (key, new_value) in entries {
                let old_value = inner.map.insert(key.clone(), new_value.clone());
                changes.push(KvChange {
                    key,
                    old_value,
                    new_value: Some(new_value),
                });
            }
            let listeners: Vec<Listener> =
                inner.listeners.iter().map(|(_, l)| Rc::clone(l)).collect();
            (changes, listeners)
        };

        for change in &changes {
            for listener in &listeners {
                listener(change);
            }
        }
        Ok(())
    }

    fn subscribe(&self, listener: Box<dyn Fn(&KvChange)>) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner.listeners.push((id, Rc::from(listener)));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .borrow_mut()
            .listeners
            .retain(|(sub_id, _)| *sub_id != id);
    }
}
