//! Observability utilities for the user service.
//!
//! This crate provides:
//! - Prometheus recorder installation and the `/metrics` renderer
//! - Axum middleware for automatic request metrics
//! - [`MetricsSink`], the seam through which the persistence layer reports
//!   attempts, latencies and health without depending on an exporter
//! - [`GrpcMetrics`] for per-method RPC counters
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, PrometheusSink};
//!
//! init_metrics()?;
//! let sink = Arc::new(PrometheusSink);
//!
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

pub mod grpc;
pub mod middleware;
pub mod sink;

pub use grpc::GrpcMetrics;
pub use middleware::metrics_middleware;
pub use sink::{AttemptOutcome, MetricsSink, NoopSink, PrometheusSink};

pub use metrics_exporter_prometheus::BuildError;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// Installs the global recorder on the first call and returns the same handle
/// afterwards.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // HTTP
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // gRPC
    describe_counter!("grpc_requests_total", "Total number of gRPC requests");
    describe_histogram!(
        "grpc_request_duration_seconds",
        "gRPC request duration in seconds"
    );

    // Persistence
    describe_counter!(
        "db_operation_attempts_total",
        "Physical persistence attempts by operation and outcome"
    );
    describe_histogram!(
        "db_operation_duration_seconds",
        "Logical persistence operation duration in seconds, retries included"
    );
    describe_gauge!(
        "health_check_status",
        "Component health (1 = healthy, 0 = unhealthy)"
    );
}
