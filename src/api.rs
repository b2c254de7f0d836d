//! HTTP surface for the user registry.
//!
//! This module exposes a compact Axum router:
//!
//! - `GET /` – Static welcome message.
//! - `GET /health` – Status, version, and environment.
//! - `GET /users/:id` – Fetch one user (404 when unknown).
//! - `POST /users/` – Register a user (201, or 400 when the id is taken).
//! - `GET /users/?active=<bool>` – List users, optionally filtered by `active`.
//! - `GET /metrics` – Prometheus text exposition of the request counters.
//!
//! Every request, matched or not, passes through [`count_requests`] before routing, so the
//! `/metrics` body already accounts for the scrape that produced it.

use crate::health::{HealthReport, HealthResponse};
use crate::metrics::{PROMETHEUS_CONTENT_TYPE, RequestMetrics, render_prometheus};
use crate::store::{StoreError, User, UserStore};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Path, Query, Request, State,
        rejection::{BytesRejection, JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Message returned by `GET /`.
pub const WELCOME_MESSAGE: &str = "DevOps FastAPI CI/CD is running";

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Registry backing the `/users` routes.
    pub store: Arc<dyn UserStore>,
    /// Request counters exposed on `/metrics`.
    pub metrics: Arc<RequestMetrics>,
    /// Reporter backing `/health`.
    pub health: HealthReport,
}

impl AppState {
    /// Bundle a store and health reporter with a fresh set of counters.
    pub fn new(store: Arc<dyn UserStore>, health: HealthReport) -> Self {
        Self {
            store,
            metrics: Arc::new(RequestMetrics::new()),
            health,
        }
    }
}

/// Build the HTTP router exposing the registry API surface.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/users/:id", get(get_user))
        .route("/users/", get(list_users).post(create_user))
        .route("/users", get(list_users).post(create_user))
        .route("/metrics", get(get_metrics))
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .with_state(state)
}

/// Count every inbound request before it is dispatched.
async fn count_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.metrics.record_request();
    tracing::debug!(method = %request.method(), path = %request.uri().path(), "Request received");
    next.run(request).await
}

/// Body for plain acknowledgement responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    fn json(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

async fn root() -> Json<MessageResponse> {
    MessageResponse::json(WELCOME_MESSAGE)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.health.report())
}

async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.store.get(id)?))
}

async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let user = decode_user(&headers, &body?)?;
    state.store.create(user)?;
    state.metrics.record_user_created();
    Ok((
        StatusCode::CREATED,
        MessageResponse::json("User created successfully"),
    ))
}

/// Decode a user from a request body.
///
/// A body without `Content-Type` is still parsed as JSON; any other non-JSON media type is
/// rejected.
fn decode_user(headers: &HeaderMap, body: &[u8]) -> Result<User, ApiError> {
    if headers
        .get(header::CONTENT_TYPE)
        .is_some_and(|content_type| !is_json_content_type(content_type))
    {
        return Err(ApiError::Validation(
            "Expected request with `Content-Type: application/json`".to_string(),
        ));
    }
    let Json(user) = Json::<User>::from_bytes(body)?;
    Ok(user)
}

fn is_json_content_type(value: &HeaderValue) -> bool {
    let Ok(value) = value.to_str() else {
        return false;
    };
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Query string accepted by `GET /users/`.
#[derive(Debug, Deserialize)]
struct ListUsersQuery {
    #[serde(default)]
    active: Option<String>,
}

async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<Vec<User>>, ApiError> {
    let Query(query) = query?;
    let active = query.active.as_deref().map(parse_bool_flag).transpose()?;
    Ok(Json(state.store.list(active)))
}

/// Parse a query-string boolean, accepting the usual spellings.
fn parse_bool_flag(raw: &str) -> Result<bool, ApiError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Ok(true),
        "false" | "0" | "no" | "off" | "f" | "n" => Ok(false),
        _ => Err(ApiError::Validation(format!(
            "Query parameter `active` must be a boolean, got `{raw}`"
        ))),
    }
}

async fn get_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus(&state.metrics.snapshot());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        body,
    )
}

async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Body for error responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable failure reason.
    pub detail: String,
}

/// Failures surfaced at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The store rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The request path, query, or body failed structural validation.
    #[error("{0}")]
    Validation(String),
    /// No route matches the request path.
    #[error("Not Found")]
    RouteNotFound,
    /// The path exists but does not accept the request method.
    #[error("Method Not Allowed")]
    MethodNotAllowed,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound(_)) | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Store(StoreError::AlreadyExists(_)) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
        Self::Validation(rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}
