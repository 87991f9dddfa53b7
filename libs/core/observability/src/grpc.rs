//! gRPC request metrics.

use metrics::{counter, histogram};
use std::time::Duration;

/// gRPC metrics recorder
pub struct GrpcMetrics;

impl GrpcMetrics {
    /// Record one completed RPC.
    ///
    /// `code` is the gRPC status name (`"OK"`, `"NOT_FOUND"`, ...).
    pub fn record_request(method: &str, code: &str, duration: Duration) {
        counter!(
            "grpc_requests_total",
            "method" => method.to_string(),
            "code" => code.to_string()
        )
        .increment(1);
        histogram!("grpc_request_duration_seconds", "method" => method.to_string())
            .record(duration.as_secs_f64());

        tracing::debug!(
            method,
            code,
            duration_ms = duration.as_millis() as u64,
            "gRPC request completed"
        );
    }
}
