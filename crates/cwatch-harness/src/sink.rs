//! Recording analytics sink.

use std::cell::RefCell;
use std::rc::Rc;

use cwatch_store::analytics::{AnalyticsError, AnalyticsEvent, AnalyticsSink};

/// Cloneable sink that records every event and can be switched to failing.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<AnalyticsEvent>>>,
    failing: Rc<RefCell<bool>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.borrow().clone()
    }

    pub fn start_failing(&self) {
        *self.failing.borrow_mut() = true;
    }

    pub fn stop_failing(&self) {
        *self.failing.borrow_mut() = false;
    }
}

impl AnalyticsSink for RecordingSink {
    fn record(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        if *self.failing.borrow() {
            return Err(AnalyticsError::Unreachable("sink offline".into()));
        }
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }
}
