use super::shutdown::ShutdownCoordinator;
use crate::errors::not_found;
use axum::{Router, http::StatusCode};
use core_config::server::ServerConfig;
use std::io;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

/// Wraps domain routes with the cross-cutting layers every HTTP surface gets:
/// request tracing, a request timeout and a JSON 404 fallback.
pub fn create_router(routes: Router, request_timeout: Duration) -> Router {
    routes
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Starts the Axum server and stops accepting connections once `shutdown`
/// fires, letting in-flight requests finish.
///
/// # Errors
/// Returns an error if the listener fails to bind or the server fails while
/// running.
///
/// # Example
/// ```ignore
/// let shutdown = ShutdownCoordinator::new();
/// create_app(router, &ServerConfig::default(), shutdown.clone()).await?;
/// ```
pub async fn create_app(
    router: Router,
    server_config: &ServerConfig,
    shutdown: ShutdownCoordinator,
) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;

    info!("HTTP server starting on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { shutdown.wait_for_shutdown().await })
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        })?;

    info!("HTTP server stopped");
    Ok(())
}
