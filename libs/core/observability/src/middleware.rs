//! Axum middleware for HTTP request metrics.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Request, Response, StatusCode},
    middleware::Next,
};
use metrics::{counter, histogram};
use std::time::Instant;

/// Paths that are never recorded, so scrapes do not count themselves.
const UNRECORDED_PATHS: &[&str] = &["/metrics"];

/// Records one sample per request, labelled by the matched route template
/// (`/users/{id}`, not `/users/7`) so label cardinality stays bounded.
///
/// Emits:
/// - `http_requests_total{method, path, status, status_class}`
/// - `http_request_duration_seconds{method, path, status}`
/// - `http_requests_errors_total{method, path, status}` for 4xx and 5xx
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/users", get(list_users))
///     .layer(axum::middleware::from_fn(metrics_middleware));
/// ```
pub async fn metrics_middleware(
    matched_path: Option<MatchedPath>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let path = match matched_path {
        Some(p) => p.as_str().to_string(),
        // Unmatched requests collapse into one series
        None => "unmatched".to_string(),
    };
    if UNRECORDED_PATHS.contains(&path.as_str()) {
        return next.run(request).await;
    }

    let method = request.method().to_string();
    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    let status = response.status();
    let code = status.as_u16().to_string();

    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => code.clone(),
        "status_class" => status_class(status)
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => code.clone()
    )
    .record(elapsed);

    if status.is_client_error() || status.is_server_error() {
        counter!(
            "http_requests_errors_total",
            "method" => method,
            "path" => path,
            "status" => code
        )
        .increment(1);
    }

    response
}

fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, middleware, routing::get};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_middleware_passes_response_through() {
        let app = Router::new()
            .route("/users/{id}", get(|| async { StatusCode::NOT_FOUND }))
            .route("/metrics", get(|| async { "# scrape" }))
            .layer(middleware::from_fn(metrics_middleware));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/users/7").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_status_class() {
        assert_eq!(status_class(StatusCode::CREATED), "2xx");
        assert_eq!(status_class(StatusCode::UNAUTHORIZED), "4xx");
        assert_eq!(status_class(StatusCode::SERVICE_UNAVAILABLE), "5xx");
    }
}
