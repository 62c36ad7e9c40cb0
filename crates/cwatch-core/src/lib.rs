#![forbid(unsafe_code)]

//! Core vocabulary for CreditWatch: the cross-context wire message union,
//! the injectable clock, the bounded credit history, burn-rate metrics, and
//! the durable key-value boundary.
//!
//! Everything here is shared by the observer, relay, store, and panel
//! crates; none of it performs I/O.

pub mod clock;
pub mod history;
pub mod kv;
pub mod message;
pub mod metrics;

pub use clock::{Clock, LabClock};
pub use history::{HISTORY_CAPACITY, HistoryLog};
pub use kv::{KvChange, KvError, KvMap, KvStore, SubscriptionId, keys};
pub use message::{Delivery, Destination, Message, MessagePort, SendError};
pub use metrics::{OpsRemaining, burn_rate, operations_remaining};
