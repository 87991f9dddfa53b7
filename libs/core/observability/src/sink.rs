//! Persistence-facing metrics sink.

use metrics::{counter, gauge, histogram};
use std::fmt;
use std::time::Duration;

/// Outcome of a single physical persistence attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    /// Failed with an error that may succeed on a later attempt
    Retryable,
    /// Failed with an error that no retry can change
    Terminal,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Retryable => "retryable",
            AttemptOutcome::Terminal => "terminal",
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver for persistence observability events.
///
/// Implementations must not fail or block; callers never inspect the result.
pub trait MetricsSink: Send + Sync {
    fn record_attempt(&self, operation: &str, attempt: u32, outcome: AttemptOutcome);

    fn record_latency(&self, operation: &str, duration: Duration);

    fn record_health_status(&self, component: &str, healthy: bool);
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn record_attempt(&self, _operation: &str, _attempt: u32, _outcome: AttemptOutcome) {}

    fn record_latency(&self, _operation: &str, _duration: Duration) {}

    fn record_health_status(&self, _component: &str, _healthy: bool) {}
}

/// Sink backed by the global `metrics` recorder (Prometheus once
/// [`crate::init_metrics`] has run)
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl MetricsSink for PrometheusSink {
    fn record_attempt(&self, operation: &str, attempt: u32, outcome: AttemptOutcome) {
        counter!(
            "db_operation_attempts_total",
            "operation" => operation.to_string(),
            "outcome" => outcome.as_str()
        )
        .increment(1);

        tracing::trace!(operation, attempt, outcome = %outcome, "Recorded persistence attempt");
    }

    fn record_latency(&self, operation: &str, duration: Duration) {
        histogram!("db_operation_duration_seconds", "operation" => operation.to_string())
            .record(duration.as_secs_f64());
    }

    fn record_health_status(&self, component: &str, healthy: bool) {
        gauge!("health_check_status", "component" => component.to_string())
            .set(if healthy { 1.0 } else { 0.0 });
    }
}
