//! HTTP handlers.

pub mod admin;
pub mod announcements;
pub mod auth;
pub mod credits;
pub mod generation;
pub mod payments;

use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness probe.
pub async fn ready() -> StatusCode {
    StatusCode::OK
}
