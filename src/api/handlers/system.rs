//! System endpoints: health check and namespace status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::service::NamespaceStatus;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process serves requests.
    pub status: String,
    /// Current server time (RFC 3339).
    pub timestamp: String,
    /// Crate version.
    pub version: String,
}

/// Error body for the status endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusError {
    /// Stable error kind.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /status` — Relay namespace snapshot.
#[utoipa::path(
    get,
    path = "/status",
    tag = "System",
    summary = "Namespace status",
    description = "Returns the number of live connections, whether a visualization consumer is registered, and which file's parse result is cached.",
    responses(
        (status = 200, description = "Namespace snapshot", body = NamespaceStatus),
        (status = 503, description = "Namespace worker stopped", body = StatusError),
    )
)]
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.namespace.status().await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusError {
                kind: err.kind().to_string(),
                message: err.to_string(),
            }),
        )
            .into_response(),
    }
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
}
