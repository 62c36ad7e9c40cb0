#![forbid(unsafe_code)]

//! Test fixtures for CreditWatch.
//!
//! Cross-context delivery in production is asynchronous message passing;
//! the fixtures model it as explicit queues that tests pump by hand, which
//! keeps every interleaving deterministic. The [`MemoryBus`] additionally
//! simulates the privileged side being torn down and later restored, and
//! the [`MemoryKv`] delivers per-key change notifications the way the
//! durable store does.

pub mod bus;
pub mod kv;
pub mod sink;

pub use bus::MemoryBus;
pub use kv::MemoryKv;
pub use sink::RecordingSink;
