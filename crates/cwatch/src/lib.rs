#![forbid(unsafe_code)]

//! CreditWatch public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub mod prelude {
    pub use cwatch_core as core;
    #[cfg(feature = "harness")]
    pub use cwatch_harness as harness;
    pub use cwatch_observer as observer;
    pub use cwatch_panel as panel;
    pub use cwatch_relay as relay;
    pub use cwatch_store as store;
}
