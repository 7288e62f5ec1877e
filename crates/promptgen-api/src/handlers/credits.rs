//! Credit balance handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CreditsResponse {
    pub credits: u32,
}

/// The authenticated user's live credit balance.
pub async fn get_credits(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<CreditsResponse>> {
    let credits = match state.sessions.profile(&user.uid).await {
        Some(profile) => profile.credits,
        None => state.sessions.refresh(&user.uid).await?.credits,
    };
    Ok(Json(CreditsResponse { credits }))
}
