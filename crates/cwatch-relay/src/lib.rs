#![forbid(unsafe_code)]

//! Bridge-context relay: forwards observed values to the privileged store,
//! republishes broadcasts locally, and keeps itself honest about whether
//! the privileged channel currently exists.

pub mod backoff;
pub mod relay;

pub use backoff::RetryPolicy;
pub use relay::{
    ContextValidity, Forwarded, HistoryHook, HistorySnapshot, InjectError, LocalHook,
    ObserverHost, Relay, RelayConfig,
};
