//! Announcement banner handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// The current site-wide announcement, or 204 when none is published.
pub async fn get_announcement(State(state): State<AppState>) -> ApiResult<Response> {
    match state.config_store.announcement().await? {
        Some(announcement) => Ok(Json(announcement).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

#[derive(Debug, Deserialize)]
pub struct DismissRequest {
    pub id: i64,
}

/// Record that the user dismissed the announcement with the given id.
pub async fn dismiss_announcement(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<DismissRequest>,
) -> ApiResult<StatusCode> {
    let current = state
        .config_store
        .announcement()
        .await?
        .ok_or_else(|| ApiError::not_found("No announcement is published"))?;

    if current.id != request.id {
        return Err(ApiError::bad_request("Announcement id does not match"));
    }

    state
        .identity
        .set_dismissed_announcement(&user.uid, request.id)
        .await?;

    // Keep the live session in sync with the backend
    let _ = state.sessions.refresh(&user.uid).await;

    Ok(StatusCode::NO_CONTENT)
}
