//! Cross-context wire messages and the messaging boundary.
//!
//! All communication between the page context, the bridge context, and the
//! privileged process goes through a small closed tagged union. Receivers
//! match exhaustively and ignore messages not addressed to them; a payload
//! whose tag is not in the union fails to decode and is dropped at the
//! boundary rather than guessed at.
//!
//! Delivery semantics: sends are fire-and-forget with an inspectable
//! outcome. "Nobody is listening at that destination" is a *normal* result
//! ([`Delivery::NoReceiver`]), distinct from the channel to the privileged
//! side having been torn down ([`SendError::ChannelTornDown`]), which is in
//! turn distinct from every other send failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire message union.
///
/// The `type` tag values are the wire contract shared with every context;
/// they never change independently of each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Page context observed a new credit value. Relay → Store.
    #[serde(rename = "VALUE_OBSERVED")]
    ValueObserved { value: f64 },

    /// Store accepted a value and is fanning it out. Store → {Relay, Panel}.
    #[serde(rename = "VALUE_BROADCAST")]
    ValueBroadcast { value: f64 },

    /// Relay asks the store for its current snapshot. Relay → Store.
    #[serde(rename = "HISTORY_REQUEST")]
    HistoryRequest { request_id: u64 },

    /// Snapshot answer; correlated by `request_id`. Store → Relay.
    #[serde(rename = "HISTORY_RESPONSE")]
    HistoryResponse {
        request_id: u64,
        last: Option<f64>,
        history: Vec<f64>,
    },
}

impl Message {
    /// Encode to the JSON wire form.
    #[must_use]
    pub fn encode(&self) -> String {
        // The union contains no map keys or non-string tags, so encoding
        // cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Decode from the JSON wire form.
    ///
    /// Returns `None` for unrecognized tags or malformed payloads; callers
    /// drop such messages instead of propagating an error across contexts.
    #[must_use]
    pub fn decode(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(msg) => Some(msg),
            Err(err) => {
                tracing::trace!(%err, "dropping unrecognized message payload");
                None
            }
        }
    }
}

/// Where a message is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Destination {
    /// The single privileged process (store & broadcaster).
    Privileged,
    /// Every live tab's relay.
    AllTabs,
    /// Any open summary panel.
    Panel,
}

/// Successful send outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// At least one receiver took the message.
    Delivered,
    /// The destination exists but nobody is listening right now.
    /// This is a normal, non-exceptional outcome.
    NoReceiver,
}

/// Send failure, classified so callers can tell an expected transient
/// teardown apart from everything else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The privileged side was reloaded or uninstalled. Expected during
    /// development reloads; recovered by the relay's health probe.
    #[error("messaging channel torn down")]
    ChannelTornDown,

    /// Any other failure. Surfaced to the caller, never fatal to the host.
    #[error("send failed: {0}")]
    Other(String),
}

/// The ordered, at-most-once-per-call messaging capability.
///
/// Delivery order to a single destination is FIFO per sender; no ordering
/// holds across distinct destinations. Implementations are free to deliver
/// asynchronously; `send` only hands the message off.
pub trait MessagePort {
    /// Send one message toward `dest`.
    fn send(&self, dest: Destination, msg: Message) -> Result<Delivery, SendError>;

    /// Cheap health check: is the channel to the privileged side currently
    /// usable? Used by the relay's periodic probe.
    fn channel_alive(&self) -> bool;
}
