use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AppError, HealthCheckFuture, IdPath, JwtAuth, JwtClaims, ValidatedJson, jwt_auth_middleware,
    run_health_checks,
};
use serde::Serialize;

use crate::error::UserError;
use crate::models::{CreateUser, LoginRequest, UpdateUser, User, UserResponse};
use crate::repository::UserStore;
use crate::service::UserService;

/// Shared state for the HTTP handlers
pub struct HttpState<S> {
    service: UserService<S>,
    auth: JwtAuth,
}

impl<S> Clone for HttpState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            auth: self.auth.clone(),
        }
    }
}

/// Create the users router.
///
/// Public: `POST /signup`, `POST /login`, `GET /healthz`.
/// Behind the bearer-token gate: `GET /users`, `GET|PUT|DELETE /users/{id}`.
pub fn router<S: UserStore + 'static>(service: UserService<S>, auth: JwtAuth) -> Router {
    let state = HttpState {
        service,
        auth: auth.clone(),
    };

    let protected = Router::new()
        .route("/users", get(list_users::<S>))
        .route(
            "/users/{id}",
            get(get_user::<S>)
                .put(update_user::<S>)
                .delete(delete_user::<S>),
        )
        .layer(middleware::from_fn_with_state(auth, jwt_auth_middleware));

    Router::new()
        .route("/signup", post(signup::<S>))
        .route("/login", post(login::<S>))
        .route("/healthz", get(health::<S>))
        .merge(protected)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    message: &'static str,
    user: UserResponse,
    token: String,
}

#[derive(Debug, Serialize)]
struct UserEnvelope {
    user: UserResponse,
}

#[derive(Debug, Serialize)]
struct UsersEnvelope {
    users: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
struct UpdatedEnvelope {
    message: &'static str,
    user: UserResponse,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

fn issue_token(auth: &JwtAuth, user: &User) -> Result<String, AppError> {
    auth.issue(&user.id.to_string())
        .map_err(|e| UserError::Token(e.to_string()).into())
}

/// Register a new user and return a token
///
/// POST /signup
#[tracing::instrument(skip_all)]
async fn signup<S: UserStore>(
    State(state): State<HttpState<S>>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.service.create_user(input).await?;
    let token = issue_token(&state.auth, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully",
            user: user.into(),
            token,
        }),
    ))
}

/// Verify credentials and return a token
///
/// POST /login
#[tracing::instrument(skip_all)]
async fn login<S: UserStore>(
    State(state): State<HttpState<S>>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .service
        .authenticate(&input.email, &input.password)
        .await?;
    let token = issue_token(&state.auth, &user)?;

    Ok(Json(AuthResponse {
        message: "Login successful",
        user: user.into(),
        token,
    }))
}

/// Store reachability
///
/// GET /healthz
async fn health<S: UserStore>(State(state): State<HttpState<S>>) -> impl IntoResponse {
    let checks: Vec<(&str, HealthCheckFuture)> = vec![(
        "database",
        Box::pin(async {
            state
                .service
                .check_health()
                .await
                .map_err(|e| e.to_string())
        }),
    )];

    run_health_checks(checks).await
}

/// List all users
///
/// GET /users
#[tracing::instrument(skip_all, fields(caller = %claims.sub))]
async fn list_users<S: UserStore>(
    State(state): State<HttpState<S>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<UsersEnvelope>, AppError> {
    let users = state.service.list_users().await?;

    Ok(Json(UsersEnvelope {
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// Get a user by ID
///
/// GET /users/{id}
#[tracing::instrument(skip(state))]
async fn get_user<S: UserStore>(
    State(state): State<HttpState<S>>,
    IdPath(id): IdPath,
) -> Result<Json<UserEnvelope>, AppError> {
    let user = state.service.get_user(id).await?;
    Ok(Json(UserEnvelope { user: user.into() }))
}

/// Update a user's name and/or email
///
/// PUT /users/{id}
///
/// Field rules apply after empty fields are dropped, so validation happens in
/// the service rather than in the extractor.
#[tracing::instrument(skip(state, input))]
async fn update_user<S: UserStore>(
    State(state): State<HttpState<S>>,
    IdPath(id): IdPath,
    input: Result<Json<UpdateUser>, JsonRejection>,
) -> Result<Json<UpdatedEnvelope>, AppError> {
    let Json(input) = input?;
    let user = state.service.update_user(id, input).await?;

    Ok(Json(UpdatedEnvelope {
        message: "User updated successfully",
        user: user.into(),
    }))
}

/// Delete a user
///
/// DELETE /users/{id}
#[tracing::instrument(skip(state))]
async fn delete_user<S: UserStore>(
    State(state): State<HttpState<S>>,
    IdPath(id): IdPath,
) -> Result<Json<MessageResponse>, AppError> {
    state.service.delete_user(id).await?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_access::UserDataAccess;
    use crate::password::fast_hasher;
    use crate::repository::InMemoryUserStore;
    use axum::body::Body;
    use axum::http::{Request, header};
    use axum_helpers::JwtConfig;
    use database::{RetryExecutor, RetryPolicy};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("router-test-secret-that-is-long-enough").unwrap())
    }

    fn app() -> Router {
        let service = UserService::new(
            UserDataAccess::new(
                InMemoryUserStore::new(),
                RetryExecutor::default(),
                RetryPolicy::default(),
            ),
            Arc::new(fast_hasher()),
        );
        router(service, auth())
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn signup_ann(app: &Router) -> (i64, String) {
        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/signup",
                None,
                json!({"name": "Ann", "email": "ann@x.com", "password": "secret1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        (
            body["user"]["id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_signup_returns_user_and_token() {
        let app = app();
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/signup",
                None,
                json!({"name": "Ann", "email": "ann@x.com", "password": "secret1"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "User created successfully");
        assert_eq!(body["user"]["email"], "ann@x.com");
        assert!(body["user"].get("password_digest").is_none());
        assert!(!body["token"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_signup_validation_failure_is_400() {
        let (status, _) = send(
            &app(),
            json_request(
                "POST",
                "/signup",
                None,
                json!({"name": "Ann", "email": "ann@x.com", "password": "123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_signup_is_409() {
        let app = app();
        signup_ann(&app).await;

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/signup",
                None,
                json!({"name": "Ann2", "email": "ann@x.com", "password": "secret2"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_failures_share_one_shape() {
        let app = app();
        signup_ann(&app).await;

        let (wrong_status, wrong_body) = send(
            &app,
            json_request(
                "POST",
                "/login",
                None,
                json!({"email": "ann@x.com", "password": "wrong-password"}),
            ),
        )
        .await;
        let (unknown_status, unknown_body) = send(
            &app,
            json_request(
                "POST",
                "/login",
                None,
                json!({"email": "nobody@x.com", "password": "secret1"}),
            ),
        )
        .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body, unknown_body);
    }

    #[tokio::test]
    async fn test_login_success() {
        let app = app();
        signup_ann(&app).await;

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/login",
                None,
                json!({"email": "ann@x.com", "password": "secret1"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Login successful");
        assert_eq!(body["user"]["name"], "Ann");
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let app = app();
        let (id, _) = signup_ann(&app).await;

        let (status, _) = send(&app, get("/users", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            json_request("PUT", &format!("/users/{id}"), None, json!({"name": "Eve"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, get("/users", Some("not-a-token"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_and_get_with_token() {
        let app = app();
        let (id, token) = signup_ann(&app).await;

        let (status, body) = send(&app, get("/users", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["users"].as_array().unwrap().len(), 1);

        let (status, body) = send(&app, get(&format!("/users/{id}"), Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], id);

        let (status, _) = send(&app, get("/users/999", Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_400() {
        let app = app();
        let (_, token) = signup_ann(&app).await;

        let (status, body) = send(&app, get("/users/abc", Some(&token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid user ID");
    }

    #[tokio::test]
    async fn test_update_with_invalid_email_is_400() {
        let app = app();
        let (id, token) = signup_ann(&app).await;

        let (status, body) = send(
            &app,
            json_request(
                "PUT",
                &format!("/users/{id}"),
                Some(&token),
                json!({"email": "not-an-email"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid email address");
    }

    #[tokio::test]
    async fn test_partial_update_then_delete() {
        let app = app();
        let (id, token) = signup_ann(&app).await;
        let uri = format!("/users/{id}");

        let (status, body) = send(
            &app,
            json_request("PUT", &uri, Some(&token), json!({"name": "", "email": "new@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User updated successfully");
        assert_eq!(body["user"]["name"], "Ann");
        assert_eq!(body["user"]["email"], "new@x.com");

        let request = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User deleted successfully");

        let (status, _) = send(&app, get(&uri, Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_healthz_reports_connected() {
        let (status, body) = send(&app(), get("/healthz", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }
}
