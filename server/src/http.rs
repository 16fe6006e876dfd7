//! HTTP routes.
//!
//! - `POST /signup`   register with `{email, password}`
//! - `POST /login`    exchange credentials for a bearer token
//! - `GET /users/me`  resolve the bearer token's user
//! - `GET /health`    liveness probe
//!
//! Errors are rendered as `{"detail": "..."}` with the status code of the
//! corresponding `AuthError`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Request, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::service::{AuthError, AuthService};
use crate::types::{AccessToken, Credentials, PublicUser};

#[derive(Clone)]
struct AppState {
    service: Arc<AuthService>,
}

/// Build the router over a shared service.
pub fn router(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/users/me", get(current_user))
        .route("/health", get(health))
        .with_state(AppState { service })
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl AuthError {
    const fn status_code(&self) -> StatusCode {
        match self {
            Self::DuplicateEmail => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::InvalidOrExpiredToken => StatusCode::UNAUTHORIZED,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorBody {
            detail: self.to_string(),
        });

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// JSON request body whose rejections render as `AuthError::InvalidRequest`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| map_json_rejection(&rejection))
    }
}

fn map_json_rejection(rejection: &JsonRejection) -> AuthError {
    tracing::debug!("rejected request body: {rejection}");
    match rejection {
        JsonRejection::JsonSyntaxError(_) => {
            AuthError::InvalidRequest("request body is not valid JSON")
        }
        JsonRejection::MissingJsonContentType(_) => {
            AuthError::InvalidRequest("expected an application/json request body")
        }
        _ => AuthError::InvalidRequest("request body must contain an email and a password"),
    }
}

/// Token taken from an `Authorization: Bearer <token>` header.
#[derive(Debug)]
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        parse_bearer(value)
            .map(|token| Self(token.to_string()))
            .ok_or(AuthError::InvalidOrExpiredToken)
    }
}

/// The scheme is matched case-insensitively.
fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Run bcrypt-bound work off the async worker threads.
async fn run_blocking<T, F>(work: F) -> Result<T, AuthError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!("blocking auth task failed: {e}");
        AuthError::Internal
    })?
}

#[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected
async fn signup(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> Result<Json<PublicUser>, AuthError> {
    let service = Arc::clone(&state.service);
    let user = run_blocking(move || service.signup(&credentials)).await?;
    Ok(Json(PublicUser::from(&user)))
}

#[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected
async fn login(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> Result<Json<AccessToken>, AuthError> {
    let service = Arc::clone(&state.service);
    let token = run_blocking(move || service.login(&credentials)).await?;
    Ok(Json(token))
}

async fn current_user(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<PublicUser>, AuthError> {
    let user = state.service.current_user(&token)?;
    Ok(Json(PublicUser::from(&user)))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
