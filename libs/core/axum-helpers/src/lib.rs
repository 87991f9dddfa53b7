//! # Axum Helpers
//!
//! Shared building blocks for the HTTP surface.
//!
//! ## Modules
//!
//! - **[`auth`]**: HS256 bearer tokens and the route-gating middleware
//! - **[`server`]**: Router layering, health aggregation, graceful shutdown
//! - **[`errors`]**: Structured error responses with error codes
//! - **[`extractors`]**: Validated JSON bodies and numeric id paths

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod server;

pub use auth::{JwtAuth, JwtClaims, JwtConfig, jwt_auth_middleware};

pub use server::{
    HealthCheckFuture, ShutdownCoordinator, create_app, create_router, run_health_checks,
    shutdown_signal,
};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{IdPath, ValidatedJson};
