//! Payment handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use promptgen_models::{CardPaymentResult, PixCharge};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::{PurchaseState, PurchaseView};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct PixChargeRequest {
    /// Credits to purchase.
    #[validate(range(min = 1, max = 1000))]
    pub credits: u32,
    /// Display amount, e.g. "45,00".
    pub amount: String,
}

#[derive(Serialize)]
pub struct PixChargeResponse {
    pub charge: PixCharge,
    pub state: PurchaseState,
}

/// Create a PIX charge for a credit package.
///
/// When no merchant key is configured the response carries the sentinel
/// charge and the `not_configured` state; the UI renders it as a terminal
/// explanation, not a QR code.
pub async fn create_pix_charge(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<PixChargeRequest>,
) -> ApiResult<Json<PixChargeResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let charge = state
        .gateway
        .start_pix_purchase(&user.uid, request.credits, &request.amount)
        .await?;

    let purchase_state = if charge.is_configured() {
        PurchaseState::AwaitingConfirmation
    } else {
        PurchaseState::NotConfigured
    };

    Ok(Json(PixChargeResponse {
        charge,
        state: purchase_state,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CardPaymentRequest {
    #[validate(range(min = 1, max = 1000))]
    pub credits: u32,
    pub amount: String,
    pub card_token: String,
}

/// Process a card payment. Approval settles the purchase immediately.
pub async fn create_card_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CardPaymentRequest>,
) -> ApiResult<Json<CardPaymentResult>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let result = state
        .gateway
        .start_card_purchase(
            &user.uid,
            request.credits,
            &request.amount,
            &request.card_token,
        )
        .await?;

    Ok(Json(result))
}

/// Current status of a purchase.
pub async fn get_purchase_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(charge_id): Path<String>,
) -> ApiResult<Json<PurchaseView>> {
    state
        .gateway
        .purchase_view(&charge_id, &user.uid)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Transaction not found."))
}

/// Stop polling a purchase (dialog closed before confirmation).
pub async fn cancel_purchase(
    State(state): State<AppState>,
    user: AuthUser,
    Path(charge_id): Path<String>,
) -> StatusCode {
    state.gateway.cancel(&charge_id, &user.uid).await;
    StatusCode::NO_CONTENT
}
