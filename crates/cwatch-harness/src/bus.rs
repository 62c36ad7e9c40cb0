//! In-memory message bus.
//!
//! One FIFO queue per destination: sends enqueue, tests drain. Draining
//! instead of delivering inline models the real system's suspension point
//! between send and receipt, so a test can interleave teardown, restore,
//! and delivery however it likes. Order within one queue is FIFO; the test
//! chooses the order across queues, mirroring the "no ordering across
//! destinations" guarantee.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use cwatch_core::message::{Delivery, Destination, Message, MessagePort, SendError};

#[derive(Default)]
struct BusState {
    torn_down: bool,
    absent: Vec<Destination>,
    queues: BTreeMap<Destination, Vec<Message>>,
}

/// Cloneable in-memory [`MessagePort`]. All clones share the same queues.
#[derive(Clone, Default)]
pub struct MemoryBus {
    state: Rc<RefCell<BusState>>,
}

impl MemoryBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the privileged side being reloaded/uninstalled: every send
    /// fails as torn down and the health check reports dead.
    pub fn tear_down(&self) {
        self.state.borrow_mut().torn_down = true;
    }

    /// Bring the privileged side back.
    pub fn restore(&self) {
        self.state.borrow_mut().torn_down = false;
    }

    /// Mark a destination as having no receiver: sends succeed with
    /// [`Delivery::NoReceiver`] and the message is discarded.
    pub fn set_absent(&self, dest: Destination) {
        let mut state = self.state.borrow_mut();
        if !state.absent.contains(&dest) {
            state.absent.push(dest);
        }
    }

    /// Take every queued message for `dest`, in send order.
    #[must_use]
    pub fn drain(&self, dest: Destination) -> Vec<Message> {
        self.state
            .borrow_mut()
            .queues
            .get_mut(&dest)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Number of messages currently queued for `dest`.
    #[must_use]
    pub fn queued(&self, dest: Destination) -> usize {
        self.state
            .borrow()
            .queues
            .get(&dest)
            .map_or(0, Vec::len)
    }
}

impl MessagePort for MemoryBus {
    fn send(&self, dest: Destination, msg: Message) -> Result<Delivery, SendError> {
        let mut state = self.state.borrow_mut();
        if state.torn_down {
            return Err(SendError::ChannelTornDown);
        }
        if state.absent.contains(&dest) {
            return Ok(Delivery::NoReceiver);
        }
        state.queues.entry(dest).or_default().push(msg);
        Ok(Delivery::Delivered)
    }

    fn channel_alive(&self) -> bool {
        !self.state.borrow().torn_down
    }
}
