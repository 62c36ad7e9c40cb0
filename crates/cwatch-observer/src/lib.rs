#![forbid(unsafe_code)]

//! Page-context observer: turns raw credit readings into a de-duplicated
//! stream of observed values, plus the raw-value boundary helpers.

pub mod observer;
pub mod source;

pub use observer::Observer;
pub use source::{WorkspaceRecord, parse_credit_text, remaining_from_workspace};
