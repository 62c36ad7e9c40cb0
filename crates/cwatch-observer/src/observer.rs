//! Change detection for the observed credit value.
//!
//! One `Observer` instance exists per page-context lifetime. It owns the
//! only copy of "what did I last emit" and exposes it solely through its
//! forwarding hook: there is no shared mutable state to race on, and a
//! navigation resets the sequence instead of comparing against
//! pre-navigation values.
//!
//! # Contract
//!
//! - The forwarding hook is called with a numeric value at most once per
//!   distinct change, in the order readings arrive.
//! - A missing or malformed reading produces no emission: not a zero, not
//!   an error.
//! - The optional burn hook fires with the magnitude of a detected
//!   decrease. It is a presentation nicety; the store, not this hook, is
//!   authoritative.

/// Receives each newly observed value, exactly once per distinct change.
pub type ForwardHook = Box<dyn FnMut(f64)>;

/// Receives the magnitude of a detected decrease (always > 0).
pub type BurnHook = Box<dyn FnMut(f64)>;

/// Lazy, infinite, non-restartable source of observed-value events.
pub struct Observer {
    last_emitted: Option<f64>,
    forward: ForwardHook,
    on_burn: Option<BurnHook>,
}

impl Observer {
    /// Create an observer that emits through `forward`.
    pub fn new(forward: ForwardHook) -> Self {
        Self {
            last_emitted: None,
            forward,
            on_burn: None,
        }
    }

    /// Attach the optional burn-notification hook.
    #[must_use]
    pub fn with_burn_hook(mut self, hook: BurnHook) -> Self {
        self.on_burn = Some(hook);
        self
    }

    /// Offer a raw reading.
    ///
    /// `None` means the reading was missing or malformed and is skipped.
    /// Non-finite numbers are treated as malformed at this boundary too.
    /// Returns `true` when a value was emitted.
    pub fn offer(&mut self, reading: Option<f64>) -> bool {
        let Some(value) = reading else {
            return false;
        };
        if !value.is_finite() {
            tracing::trace!(value, "skipping non-finite reading");
            return false;
        }
        if self.last_emitted == Some(value) {
            return false;
        }

        if let Some(previous) = self.last_emitted
            && value < previous
            && let Some(hook) = &mut self.on_burn
        {
            hook(previous - value);
        }

        tracing::debug!(value, "credit change detected");
        self.last_emitted = Some(value);
        (self.forward)(value);
        true
    }

    /// Start a new sequence after a navigation or page reset.
    ///
    /// The next reading is emitted unconditionally rather than compared
    /// against pre-navigation state.
    pub fn reset(&mut self) {
        self.last_emitted = None;
    }

    /// The value this instance last emitted, if any.
    #[must_use]
    pub fn last_emitted(&self) -> Option<f64> {
        self.last_emitted
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("last_emitted", &self.last_emitted)
            .field("has_burn_hook", &self.on_burn.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_observer() -> (Observer, Rc<RefCell<Vec<f64>>>, Rc<RefCell<Vec<f64>>>) {
        let emitted = Rc::new(RefCell::new(Vec::new()));
        let burns = Rc::new(RefCell::new(Vec::new()));
        let e = Rc::clone(&emitted);
        let b = Rc::clone(&burns);
        let observer = Observer::new(Box::new(move |v| e.borrow_mut().push(v)))
            .with_burn_hook(Box::new(move |d| b.borrow_mut().push(d)));
        (observer, emitted, burns)
    }

    #[test]
    fn emits_only_on_change() {
        let (mut obs, emitted, _) = recording_observer();

        assert!(obs.offer(Some(50.0)));
        assert!(!obs.offer(Some(50.0)));
        assert!(!obs.offer(Some(50.0)));
        assert!(obs.offer(Some(45.0)));

        assert_eq!(*emitted.borrow(), vec![50.0, 45.0]);
    }

    #[test]
    fn missing_reading_emits_nothing() {
        let (mut obs, emitted, _) = recording_observer();

        assert!(!obs.offer(None));
        obs.offer(Some(50.0));
        assert!(!obs.offer(None));

        // A gap does not re-trigger emission of the unchanged value.
        assert!(!obs.offer(Some(50.0)));
        assert_eq!(*emitted.borrow(), vec![50.0]);
    }

    #[test]
    fn non_finite_reading_is_malformed() {
        let (mut obs, emitted, _) = recording_observer();

        assert!(!obs.offer(Some(f64::NAN)));
        assert!(!obs.offer(Some(f64::INFINITY)));
        assert!(emitted.borrow().is_empty());
        assert_eq!(obs.last_emitted(), None);
    }

    #[test]
    fn burn_hook_fires_on_decrease_only() {
        let (mut obs, _, burns) = recording_observer();

        obs.offer(Some(50.0)); // first value: no previous, no burn
        obs.offer(Some(45.0)); // decrease of 5
        obs.offer(Some(60.0)); // increase: no burn
        obs.offer(Some(40.0)); // decrease of 20

        assert_eq!(*burns.borrow(), vec![5.0, 20.0]);
    }

    #[test]
    fn reset_starts_a_new_sequence() {
        let (mut obs, emitted, burns) = recording_observer();

        obs.offer(Some(50.0));
        obs.reset();

        // Same value is re-emitted after reset, and a lower value is not
        // treated as a decrease relative to the pre-reset state.
        assert!(obs.offer(Some(50.0)));
        obs.reset();
        assert!(obs.offer(Some(30.0)));

        assert_eq!(*emitted.borrow(), vec![50.0, 50.0, 30.0]);
        assert!(burns.borrow().is_empty());
    }

    #[test]
    fn works_without_burn_hook() {
        let mut obs = Observer::new(Box::new(|_| {}));
        assert!(obs.offer(Some(50.0)));
        assert!(obs.offer(Some(40.0)));
        assert_eq!(obs.last_emitted(), Some(40.0));
    }
}
