//! System endpoints: banner and health check.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Plain-text body served at `/`.
pub const BANNER: &str = "Audio relay WebSocket server";

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /`: Identify the service to plain HTTP clients.
#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    summary = "Service banner",
    description = "Plain-text banner. WebSocket clients connect to `/ws`.",
    responses(
        (status = 200, description = "Service banner", body = String, content_type = "text/plain"),
    )
)]
pub async fn banner_handler() -> impl IntoResponse {
    (StatusCode::OK, BANNER)
}

/// `GET /health`: Service health status.
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

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(banner_handler))
        .route("/health", get(health_handler))
}
