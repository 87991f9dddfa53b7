//! Server infrastructure: router layering, health aggregation and graceful
//! shutdown shared between the HTTP and gRPC listeners.

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_app, create_router};
pub use health::{HealthCheckFuture, run_health_checks};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
