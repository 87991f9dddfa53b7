use super::jwt::JwtAuth;
use crate::errors::AppError;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// JWT authentication middleware
///
/// Requires a valid bearer token and inserts the decoded [`super::JwtClaims`]
/// into request extensions. Missing and invalid tokens both yield 401.
///
/// # Example
///
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/users", get(list_users))
///     .layer(axum::middleware::from_fn_with_state(auth.clone(), jwt_auth_middleware));
/// ```
pub async fn jwt_auth_middleware(
    State(auth): State<JwtAuth>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = extract_bearer_token(&headers) else {
        tracing::warn!(path = %request.uri().path(), "Request without bearer token");
        return Err(AppError::Unauthorized(
            "Authorization header required".to_string(),
        ));
    };

    let claims = auth.verify(token).map_err(|e| {
        tracing::warn!(path = %request.uri().path(), error = %e, "JWT verification failed");
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    tracing::debug!(user_id = %claims.sub, "Authenticated request");
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
