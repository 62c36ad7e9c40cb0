#![forbid(unsafe_code)]

//! Read-only summary consumer.
//!
//! The panel reads current state once on activation, then follows both the
//! durable-storage change notifications and the direct broadcast channel,
//! applying whichever arrives first. Duplicate delivery of the same value
//! is an effective no-op: the view model is recomputed from snapshots, so
//! an unchanged history yields an identical summary. The panel never
//! writes.

pub mod panel;

pub use panel::{Summary, SummaryPanel};
