#![forbid(unsafe_code)]

//! The privileged store & broadcaster: the authoritative sequencer that
//! turns observed values into durable state and fans updates out to every
//! live consumer.

pub mod analytics;
pub mod store;

pub use analytics::{AnalyticsError, AnalyticsEvent, AnalyticsSink, NoopSink, sanitize};
pub use store::{AcceptOutcome, CreditStore, StoreError, StorePolicy};
