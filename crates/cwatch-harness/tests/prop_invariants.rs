//! Property tests across the store/panel boundary.

use std::cell::RefCell;
use std::rc::Rc;

use cwatch_core::history::HISTORY_CAPACITY;
use cwatch_core::kv::KvStore;
use cwatch_core::metrics::burn_rate;
use cwatch_harness::{MemoryBus, MemoryKv, RecordingSink};
use cwatch_panel::SummaryPanel;
use cwatch_store::{CreditStore, StorePolicy};
use proptest::prelude::*;

fn credit_values() -> impl Strategy<Value = Vec<f64>> {
    // Integer-valued credits, the shape the counter takes in practice.
    prop::collection::vec((0u32..1_000_000).prop_map(f64::from), 0..180)
}

proptest! {
    /// After any accept sequence the persisted history is a bounded
    /// suffix of the inputs and the last value is its tail.
    #[test]
    fn history_is_bounded_suffix_and_tail_matches(values in credit_values()) {
        let kv = MemoryKv::new();
        let mut store = CreditStore::open(
            kv.clone(),
            MemoryBus::new(),
            RecordingSink::new(),
            StorePolicy::default(),
        );

        for &v in &values {
            store.accept(v).unwrap();
        }

        let history = store.history().unwrap();
        prop_assert!(history.len() <= HISTORY_CAPACITY);

        let expected_start = values.len().saturating_sub(HISTORY_CAPACITY);
        prop_assert_eq!(history.as_slice(), &values[expected_start..]);
        prop_assert_eq!(store.last_value().unwrap(), values.last().copied());
    }

    /// A panel fed purely by storage change notifications converges on
    /// exactly the store's state, and its derived rate is the same
    /// computation applied to the persisted history.
    #[test]
    fn panel_tracks_store_through_change_notifications(values in credit_values()) {
        let kv = MemoryKv::new();
        let mut store = CreditStore::open(
            kv.clone(),
            MemoryBus::new(),
            RecordingSink::new(),
            StorePolicy::default(),
        );

        let panel = Rc::new(RefCell::new(SummaryPanel::new()));
        let sub = Rc::clone(&panel);
        kv.subscribe(Box::new(move |change| {
            sub.borrow_mut().on_kv_change(change);
        }));

        for &v in &values {
            store.accept(v).unwrap();
        }

        let history = store.history().unwrap();
        let summary = panel.borrow().summary();

        prop_assert_eq!(summary.history.as_slice(), history.as_slice());
        prop_assert_eq!(summary.last_value, store.last_value().unwrap());
        prop_assert_eq!(summary.burn_rate, burn_rate(history.as_slice()));
    }

    /// Re-loading a fresh panel from storage yields the same summary as
    /// the one that followed every change live.
    #[test]
    fn cold_load_equals_live_tracking(values in credit_values()) {
        let kv = MemoryKv::new();
        let mut store = CreditStore::open(
            kv.clone(),
            MemoryBus::new(),
            RecordingSink::new(),
            StorePolicy::default(),
        );

        let live = Rc::new(RefCell::new(SummaryPanel::new()));
        let sub = Rc::clone(&live);
        kv.subscribe(Box::new(move |change| {
            sub.borrow_mut().on_kv_change(change);
        }));

        for &v in &values {
            store.accept(v).unwrap();
        }

        let mut cold = SummaryPanel::new();
        cold.load(&kv).unwrap();

        prop_assert_eq!(cold.summary(), live.borrow().summary());
    }
}
