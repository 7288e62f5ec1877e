//! Authentication handlers.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use promptgen_models::UserProfile;

use crate::auth::{mint_token, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Header carrying the caller's session key for referral capture.
const SESSION_ID_HEADER: &str = "x-session-id";

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

fn session_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Log in with email and password.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let profile = state
        .identity
        .login(&request.email, &request.password)
        .await?;
    state.sessions.insert(profile.clone()).await;

    let token = mint_token(&profile, &state.config.auth_secret, state.config.token_ttl)?;
    info!(user_id = %profile.id, "User logged in");

    Ok(Json(AuthResponse {
        token,
        user: profile,
    }))
}

/// Register a new account.
///
/// A referral code previously captured for the caller's session key is
/// consumed here (read once): the new profile's `referred_by` is set and the
/// code is gone for any later registration in the same session.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let session = session_key(&headers);
    let referred_by = match &session {
        Some(key) => state.referrals.take(key).await,
        None => None,
    };

    let profile = match state
        .identity
        .register(&request.email, &request.password, referred_by.clone())
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            // A failed registration must not burn the captured code
            if let (Some(key), Some(code)) = (&session, &referred_by) {
                state.referrals.capture(key, code).await;
            }
            return Err(e);
        }
    };
    state.sessions.insert(profile.clone()).await;

    let token = mint_token(&profile, &state.config.auth_secret, state.config.token_ttl)?;
    info!(user_id = %profile.id, referred = profile.referred_by.is_some(), "User registered");

    Ok(Json(AuthResponse {
        token,
        user: profile,
    }))
}

/// End the authenticated session.
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> StatusCode {
    state.sessions.remove(&user.uid).await;
    StatusCode::NO_CONTENT
}

/// The authenticated user's profile, re-fetched from the identity backend.
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<UserProfile>> {
    let profile = state.sessions.refresh(&user.uid).await?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct CaptureQuery {
    #[serde(rename = "ref")]
    pub code: String,
}

/// Capture a referral code from the `?ref=` query parameter.
///
/// The code is stored against the caller's `X-Session-Id` and consumed at
/// most once, by the next registration carrying the same session key.
pub async fn capture_referral(
    State(state): State<AppState>,
    Query(query): Query<CaptureQuery>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let key = session_key(&headers)
        .ok_or_else(|| ApiError::bad_request("X-Session-Id header is required"))?;

    state.referrals.capture(&key, &query.code).await;
    Ok(StatusCode::NO_CONTENT)
}
