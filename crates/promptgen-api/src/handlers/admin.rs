//! Admin handlers for user, payment, and site management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use promptgen_models::{Announcement, Transaction, UserProfile, UserRole};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Verify the caller is an admin against the identity backend.
///
/// The role in the session token could be stale; the backend is the source
/// of truth.
async fn require_admin(state: &AppState, user: &AuthUser) -> ApiResult<()> {
    let profile = state
        .identity
        .get_profile(&user.uid)
        .await?
        .ok_or_else(|| ApiError::forbidden("Admin access required"))?;

    match profile.role {
        UserRole::Admin => Ok(()),
        UserRole::User | UserRole::Influencer | UserRole::Affiliate => {
            Err(ApiError::forbidden("Admin access required"))
        }
    }
}

/// List every user profile.
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<UserProfile>>> {
    require_admin(&state, &user).await?;
    Ok(Json(state.identity.list_users().await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

/// Assign a role to a user.
pub async fn update_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> ApiResult<Json<UserProfile>> {
    require_admin(&state, &user).await?;
    let profile = state.identity.set_role(&user_id, request.role).await?;
    info!(admin = %user.uid, user_id, role = request.role.as_str(), "Role updated");
    Ok(Json(profile))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommissionRequest {
    /// Commission rate in [0, 1].
    #[validate(range(min = 0.0, max = 1.0))]
    pub rate: f64,
}

/// Set an affiliate's commission rate.
pub async fn update_commission_rate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<String>,
    Json(request): Json<CommissionRequest>,
) -> ApiResult<Json<UserProfile>> {
    require_admin(&state, &user).await?;
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let profile = state
        .identity
        .set_commission_rate(&user_id, request.rate)
        .await?;
    info!(admin = %user.uid, user_id, rate = request.rate, "Commission rate updated");
    Ok(Json(profile))
}

#[derive(Debug, Deserialize, Validate)]
pub struct GrantCreditsRequest {
    #[validate(range(min = 1))]
    pub amount: u32,
}

/// Grant credits to a user at the backend.
///
/// The grant shows up on the user's next profile fetch.
pub async fn grant_credits(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<String>,
    Json(request): Json<GrantCreditsRequest>,
) -> ApiResult<Json<UserProfile>> {
    require_admin(&state, &user).await?;
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let profile = state
        .identity
        .grant_credits(&user_id, request.amount)
        .await?;
    info!(admin = %user.uid, user_id, amount = request.amount, "Credits granted");
    Ok(Json(profile))
}

/// List every settled transaction.
pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Transaction>>> {
    require_admin(&state, &user).await?;
    Ok(Json(state.transactions.list().await?))
}

#[derive(Serialize)]
pub struct RevenueResponse {
    pub total_revenue: f64,
}

/// Total revenue across all transactions.
pub async fn total_revenue(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<RevenueResponse>> {
    require_admin(&state, &user).await?;
    Ok(Json(RevenueResponse {
        total_revenue: state.transactions.total_revenue().await?,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PixKeyRequest {
    #[validate(length(min = 1))]
    pub key: String,
}

/// Store the merchant PIX key used to mint charges.
pub async fn set_pix_key(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<PixKeyRequest>,
) -> ApiResult<StatusCode> {
    require_admin(&state, &user).await?;
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    state.config_store.set_pix_key(&request.key).await?;
    info!(admin = %user.uid, "PIX key updated");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnnouncementRequest {
    #[validate(length(min = 1))]
    pub message: String,
}

/// Publish a site-wide announcement, replacing any previous one.
pub async fn publish_announcement(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AnnouncementRequest>,
) -> ApiResult<Json<Announcement>> {
    require_admin(&state, &user).await?;
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let announcement = Announcement::new(request.message.trim());
    state.config_store.set_announcement(&announcement).await?;
    info!(admin = %user.uid, announcement_id = announcement.id, "Announcement published");
    Ok(Json(announcement))
}

/// Clear the published announcement.
pub async fn clear_announcement(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<StatusCode> {
    require_admin(&state, &user).await?;
    state.config_store.clear_announcement().await?;
    info!(admin = %user.uid, "Announcement cleared");
    Ok(StatusCode::NO_CONTENT)
}
