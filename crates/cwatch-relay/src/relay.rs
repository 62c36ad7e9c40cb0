//! The relay proper: a per-tab bridge between the page-context observer and
//! the privileged store.
//!
//! # State machine
//!
//! ```text
//! Valid --send classified as torn down--> Invalid
//! Invalid --periodic probe finds channel alive--> Valid
//! ```
//!
//! While `Invalid`, `forward` silently drops values (the store is
//! authoritative only for values that crossed a live channel) and never
//! panics the host page. A probe on a fixed interval re-checks the channel
//! and flips back to `Valid` without a page reload.
//!
//! # Failure classification
//!
//! [`SendError::ChannelTornDown`] is the expected teardown during privileged
//! reloads: logged once, never escalated. Every other send error is
//! surfaced to the caller, but also parks the relay until the probe
//! succeeds — matching the "degrade to silence" policy.

use cwatch_core::clock::Clock;
use cwatch_core::message::{Delivery, Destination, Message, MessagePort, SendError};
use thiserror::Error;
use web_time::{Duration, Instant};

use crate::backoff::RetryPolicy;

/// Whether the privileged messaging channel is currently usable.
/// Per-relay-instance, never persisted, reset on instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextValidity {
    Valid,
    Invalid,
}

/// Relay timing knobs.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// How often the health probe re-checks the channel.
    pub probe_interval: Duration,
    /// How long a pending history request waits before resolving empty.
    pub history_timeout: Duration,
    /// Injection retry schedule.
    pub retry: RetryPolicy,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(5),
            history_timeout: Duration::from_secs(2),
            retry: RetryPolicy::default(),
        }
    }
}

/// Observer-code loading failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectError {
    /// The privileged side is not ready to serve the observer yet.
    #[error("privileged side not ready")]
    NotReady,

    #[error("injection failed: {0}")]
    Failed(String),
}

/// The host capability that loads the observer into the page context.
pub trait ObserverHost {
    fn inject(&mut self) -> Result<(), InjectError>;
}

/// Outcome of a `forward` call that did not hard-fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forwarded {
    /// The store took the value.
    Sent,
    /// Channel is up but the store is not listening right now.
    NoReceiver,
    /// Dropped: the relay is (or just became) invalid. Acceptable loss.
    Dropped,
}

/// Read-only store snapshot delivered to a history request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistorySnapshot {
    pub last: Option<f64>,
    pub history: Vec<f64>,
}

impl HistorySnapshot {
    /// The fallback snapshot used when no response arrives in time.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Receives each broadcast value for the summary consumer in this tab.
pub type LocalHook = Box<dyn FnMut(f64)>;

/// One-shot receiver for a history request's resolution.
pub type HistoryHook = Box<dyn FnOnce(HistorySnapshot)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InjectionState {
    Idle,
    /// Waiting to retry; `attempts` failures so far.
    Waiting { attempts: u32, due: Instant },
    Done,
    GaveUp,
}

struct PendingHistory {
    request_id: u64,
    deadline: Instant,
    /// Taken exactly once, on resolution or timeout. Clearing the slot is
    /// what unregisters the temporary listener on both paths.
    deliver: Option<HistoryHook>,
}

/// Per-tab relay instance.
pub struct Relay<P: MessagePort> {
    port: P,
    clock: Clock,
    config: RelayConfig,
    validity: ContextValidity,
    invalidation_logged: bool,
    last_probe: Option<Instant>,
    host: Option<Box<dyn ObserverHost>>,
    injection: InjectionState,
    pending_history: Option<PendingHistory>,
    next_request_id: u64,
    local: Option<LocalHook>,
}

impl<P: MessagePort> Relay<P> {
    /// Create a relay over `port`. A fresh relay starts `Valid`.
    pub fn new(port: P, clock: Clock, config: RelayConfig) -> Self {
        Self {
            port,
            clock,
            config,
            validity: ContextValidity::Valid,
            invalidation_logged: false,
            last_probe: None,
            host: None,
            injection: InjectionState::Idle,
            pending_history: None,
            next_request_id: 1,
            local: None,
        }
    }

    /// Attach the hook that republishes broadcasts to this tab's consumer.
    #[must_use]
    pub fn with_local_hook(mut self, hook: LocalHook) -> Self {
        self.local = Some(hook);
        self
    }

    /// Attach the host capability used to load the observer.
    #[must_use]
    pub fn with_observer_host(mut self, host: Box<dyn ObserverHost>) -> Self {
        self.host = Some(host);
        self
    }

    #[must_use]
    pub fn validity(&self) -> ContextValidity {
        self.validity
    }

    /// Whether the injection retry budget was exhausted.
    #[must_use]
    pub fn injection_gave_up(&self) -> bool {
        self.injection == InjectionState::GaveUp
    }

    /// Whether observer injection completed.
    #[must_use]
    pub fn injection_done(&self) -> bool {
        self.injection == InjectionState::Done
    }

    /// Whether a history request is still awaiting resolution.
    #[must_use]
    pub fn has_pending_history(&self) -> bool {
        self.pending_history.is_some()
    }

    // ── Forwarding ───────────────────────────────────────────────────

    /// Deliver one observed value to the store.
    ///
    /// Never panics the host: while `Invalid` the value is silently
    /// dropped; a teardown discovered mid-send flips the relay `Invalid`
    /// and also drops. Only unclassified errors are returned.
    pub fn forward(&mut self, value: f64) -> Result<Forwarded, SendError> {
        if self.validity == ContextValidity::Invalid {
            tracing::trace!(value, "relay invalid; dropping observed value");
            return Ok(Forwarded::Dropped);
        }

        match self
            .port
            .send(Destination::Privileged, Message::ValueObserved { value })
        {
            Ok(Delivery::Delivered) => Ok(Forwarded::Sent),
            Ok(Delivery::NoReceiver) => {
                tracing::debug!(value, "store not listening; value not recorded");
                Ok(Forwarded::NoReceiver)
            }
            Err(SendError::ChannelTornDown) => {
                self.invalidate();
                Ok(Forwarded::Dropped)
            }
            Err(err) => {
                // Unexpected failure: park the relay like a teardown (the
                // probe will recover it) but let the caller see the error.
                tracing::warn!(%err, "unexpected send failure while forwarding");
                self.invalidate();
                Err(err)
            }
        }
    }

    fn invalidate(&mut self) {
        if !self.invalidation_logged {
            // Expected during privileged reloads; log once, not per drop.
            tracing::debug!("privileged context invalidated; relay dormant until probe succeeds");
            self.invalidation_logged = true;
        }
        self.validity = ContextValidity::Invalid;
    }

    // ── Inbound messages ─────────────────────────────────────────────

    /// Handle a message pushed at this relay. Unrecognized or unaddressed
    /// kinds are ignored, never assumed.
    pub fn on_message(&mut self, msg: Message) {
        match msg {
            Message::ValueBroadcast { value } => {
                if let Some(hook) = &mut self.local {
                    hook(value);
                }
            }
            Message::HistoryResponse {
                request_id,
                last,
                history,
            } => {
                let matches = self
                    .pending_history
                    .as_ref()
                    .is_some_and(|p| p.request_id == request_id);
                if !matches {
                    tracing::trace!(request_id, "ignoring unsolicited history response");
                    return;
                }
                if let Some(mut pending) = self.pending_history.take()
                    && let Some(deliver) = pending.deliver.take()
                {
                    deliver(HistorySnapshot { last, history });
                }
            }
            Message::ValueObserved { .. } | Message::HistoryRequest { .. } => {
                tracing::trace!("ignoring message not addressed to the relay");
            }
        }
    }

    // ── History request ──────────────────────────────────────────────

    /// Ask the store for its current snapshot.
    ///
    /// `deliver` resolves exactly once: with the store's answer, or with
    /// the empty default after the configured timeout. Issuing a new
    /// request supersedes an unresolved one (which resolves empty).
    pub fn request_history(&mut self, deliver: HistoryHook) {
        if let Some(mut old) = self.pending_history.take()
            && let Some(old_deliver) = old.deliver.take()
        {
            old_deliver(HistorySnapshot::empty());
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        let deadline = self.clock.now() + self.config.history_timeout;

        match self
            .port
            .send(Destination::Privileged, Message::HistoryRequest { request_id })
        {
            Ok(_) => {
                self.pending_history = Some(PendingHistory {
                    request_id,
                    deadline,
                    deliver: Some(deliver),
                });
            }
            Err(SendError::ChannelTornDown) => {
                self.invalidate();
                deliver(HistorySnapshot::empty());
            }
            Err(err) => {
                tracing::warn!(%err, "history request failed to send");
                deliver(HistorySnapshot::empty());
            }
        }
    }

    // ── Injection ────────────────────────────────────────────────────

    /// Request observer injection now; on failure the retry schedule takes
    /// over via [`on_tick`](Relay::on_tick).
    pub fn begin_injection(&mut self) {
        let now = self.clock.now();
        self.attempt_injection(0, now);
    }

    fn attempt_injection(&mut self, prior_failures: u32, now: Instant) {
        let Some(host) = self.host.as_mut() else {
            self.injection = InjectionState::Idle;
            return;
        };
        match host.inject() {
            Ok(()) => {
                tracing::debug!("observer injected into page context");
                self.injection = InjectionState::Done;
            }
            Err(err) if self.config.retry.allows(prior_failures) => {
                let attempts = prior_failures + 1;
                let delay = self.config.retry.delay_for(attempts);
                tracing::debug!(
                    %err,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    "injection failed; retrying"
                );
                self.injection = InjectionState::Waiting {
                    attempts,
                    due: now + delay,
                };
            }
            Err(err) => {
                tracing::warn!(%err, attempts = prior_failures, "injection failed; giving up");
                self.injection = InjectionState::GaveUp;
            }
        }
    }

    // ── Periodic driving ─────────────────────────────────────────────

    /// Drive time-based work: the health probe, scheduled injection
    /// retries, and the pending-history timeout.
    pub fn on_tick(&mut self) {
        let now = self.clock.now();
        self.tick_probe(now);
        self.tick_injection(now);
        self.tick_history(now);
    }

    fn tick_probe(&mut self, now: Instant) {
        let due = match self.last_probe {
            None => true,
            Some(at) => now.duration_since(at) >= self.config.probe_interval,
        };
        if !due {
            return;
        }
        self.last_probe = Some(now);

        let alive = self.port.channel_alive();
        match (alive, self.validity) {
            (true, ContextValidity::Invalid) => {
                tracing::debug!("privileged context restored");
                self.validity = ContextValidity::Valid;
                self.invalidation_logged = false;
            }
            (false, ContextValidity::Valid) => self.invalidate(),
            _ => {}
        }
    }

    fn tick_injection(&mut self, now: Instant) {
        if let InjectionState::Waiting { attempts, due } = self.injection
            && now >= due
        {
            self.attempt_injection(attempts, now);
        }
    }

    fn tick_history(&mut self, now: Instant) {
        let timed_out = self
            .pending_history
            .as_ref()
            .is_some_and(|p| now >= p.deadline);
        if !timed_out {
            return;
        }
        if let Some(mut pending) = self.pending_history.take() {
            tracing::debug!(
                request_id = pending.request_id,
                "history request timed out; resolving empty"
            );
            if let Some(deliver) = pending.deliver.take() {
                deliver(HistorySnapshot::empty());
            }
        }
    }
}
