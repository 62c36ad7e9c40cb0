//! Teardown and recovery of the privileged channel, driven by a lab clock.

use std::cell::RefCell;
use std::rc::Rc;

use cwatch_core::clock::{Clock, LabClock};
use cwatch_core::message::Destination;
use cwatch_harness::{MemoryBus, MemoryKv, RecordingSink};
use cwatch_relay::{ContextValidity, Relay, RelayConfig};
use cwatch_store::{CreditStore, StorePolicy};
use web_time::Duration;

fn pump(
    bus: &MemoryBus,
    store: &mut CreditStore<MemoryKv, MemoryBus, RecordingSink>,
) {
    for msg in bus.drain(Destination::Privileged) {
        store.on_message(msg).unwrap();
    }
}

#[test]
fn values_lost_during_teardown_do_not_wedge_the_relay() {
    let bus = MemoryBus::new();
    let kv = MemoryKv::new();
    let lab = LabClock::new();
    let mut store = CreditStore::open(
        kv.clone(),
        bus.clone(),
        RecordingSink::new(),
        StorePolicy::default(),
    );
    let mut relay = Relay::new(bus.clone(), Clock::lab(&lab), RelayConfig::default());

    relay.forward(50.0).unwrap();
    pump(&bus, &mut store);

    // The privileged side reloads out from under this tab.
    bus.tear_down();
    relay.forward(45.0).unwrap();
    assert_eq!(relay.validity(), ContextValidity::Invalid);

    // While invalid, values are dropped without touching the channel.
    relay.forward(44.0).unwrap();
    relay.forward(43.0).unwrap();

    // Probe while the channel is still down: stays invalid.
    relay.on_tick();
    assert_eq!(relay.validity(), ContextValidity::Invalid);

    // Channel comes back; the next due probe restores the relay without
    // any restart of the tab.
    bus.restore();
    lab.advance(Duration::from_secs(5));
    relay.on_tick();
    assert_eq!(relay.validity(), ContextValidity::Valid);

    relay.forward(40.0).unwrap();
    pump(&bus, &mut store);

    // Values observed during the outage are gone; everything around the
    // outage is intact and ordered.
    assert_eq!(store.history().unwrap().as_slice(), &[50.0, 40.0]);
    assert_eq!(store.last_value().unwrap(), Some(40.0));
}

#[test]
fn probe_does_not_fire_before_its_interval() {
    let bus = MemoryBus::new();
    let lab = LabClock::new();
    let mut relay = Relay::new(bus.clone(), Clock::lab(&lab), RelayConfig::default());

    // First tick probes immediately and sees a healthy channel.
    relay.on_tick();
    assert_eq!(relay.validity(), ContextValidity::Valid);

    bus.tear_down();
    bus.restore();
    bus.tear_down();

    // 4.9s later the probe is not yet due, so the dead channel goes
    // unnoticed and the relay still believes it is valid.
    lab.advance(Duration::from_millis(4_900));
    relay.on_tick();
    assert_eq!(relay.validity(), ContextValidity::Valid);

    lab.advance(Duration::from_millis(100));
    relay.on_tick();
    assert_eq!(relay.validity(), ContextValidity::Invalid);
}

#[test]
fn pending_history_times_out_during_an_outage() {
    let bus = MemoryBus::new();
    let lab = LabClock::new();
    let mut relay = Relay::new(bus.clone(), Clock::lab(&lab), RelayConfig::default());

    let resolved = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&resolved);
    relay.request_history(Box::new(move |snapshot| {
        sink.borrow_mut().push(snapshot);
    }));
    assert!(relay.has_pending_history());

    // The store never answers (say, it crashed); two seconds later the
    // request resolves empty exactly once.
    lab.advance(Duration::from_secs(2));
    relay.on_tick();
    relay.on_tick();

    let resolved = resolved.borrow();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].last, None);
    assert!(resolved[0].history.is_empty());
    assert!(!relay.has_pending_history());
}

#[test]
fn store_survives_storage_outage_and_reports_it() {
    let bus = MemoryBus::new();
    let kv = MemoryKv::new();
    let mut store = CreditStore::open(
        kv.clone(),
        bus.clone(),
        RecordingSink::new(),
        StorePolicy::default(),
    );

    store.accept(50.0).unwrap();

    kv.make_unavailable();
    assert!(store.accept(45.0).is_err());
    // A failed accept broadcasts nothing.
    assert_eq!(bus.queued(Destination::AllTabs), 1);

    kv.make_available();
    store.accept(44.0).unwrap();
    assert_eq!(store.history().unwrap().as_slice(), &[50.0, 44.0]);
}
