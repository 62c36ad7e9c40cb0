//! Optional analytics boundary.
//!
//! The sink is strictly best-effort: absence of configuration and every
//! failure degrade to a log line. Nothing on this path may block or fail
//! the primary write path.

use serde::Serialize;
use thiserror::Error;

/// One outbound analytics record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsEvent {
    /// The installation's write-once identity.
    pub identity: String,
    /// Sanitized (integer) credit value.
    pub value: i64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Sink failure. Always swallowed by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    #[error("analytics sink rejected event: {0}")]
    Rejected(String),

    #[error("analytics sink unreachable: {0}")]
    Unreachable(String),
}

/// Accepts event records; may fail; failures are swallowed upstream.
pub trait AnalyticsSink {
    fn record(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError>;
}

/// Sink used when no analytics endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    fn record(&self, _event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        Ok(())
    }
}

/// Sanitize a value for the analytics record: coerce a fractional value to
/// the nearest integer, reject anything non-finite.
#[must_use]
pub fn sanitize(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    Some(value.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_rounds_fractional() {
        assert_eq!(sanitize(37.0), Some(37));
        assert_eq!(sanitize(37.4), Some(37));
        assert_eq!(sanitize(37.5), Some(38));
        assert_eq!(sanitize(-0.4), Some(0));
    }

    #[test]
    fn sanitize_rejects_non_finite() {
        assert_eq!(sanitize(f64::NAN), None);
        assert_eq!(sanitize(f64::INFINITY), None);
        assert_eq!(sanitize(f64::NEG_INFINITY), None);
    }

    #[test]
    fn noop_sink_always_succeeds() {
        let event = AnalyticsEvent {
            identity: "test".into(),
            value: 37,
            timestamp: 0,
        };
        assert_eq!(NoopSink.record(&event), Ok(()));
    }
}
