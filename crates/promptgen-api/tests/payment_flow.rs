//! End-to-end purchase flow tests against the in-memory backends.

use std::sync::Arc;
use std::time::Duration;

use promptgen_api::backends::{
    ConfigStore, IdentityBackend, MemoryConfigStore, MemoryIdentity, MemoryTransactionLog,
    PixPaymentBackend, TransactionLog,
};
use promptgen_api::services::PurchaseState;
use promptgen_api::{ApiConfig, AppState};
use promptgen_models::PaymentStatus;

/// Build app state over demo users with an instantly-confirming processor.
fn test_state() -> AppState {
    let mut config = ApiConfig::default();
    config.payment_auto_close_delay = Duration::ZERO;

    let identity = Arc::new(MemoryIdentity::with_demo_users());
    let config_store = Arc::new(MemoryConfigStore::new());
    let payments = Arc::new(
        PixPaymentBackend::new(config_store.clone(), Duration::ZERO).without_qr_fetch(),
    );
    let transactions = Arc::new(MemoryTransactionLog::new());

    AppState::with_backends(config, identity, payments, transactions, config_store)
}

async fn login(state: &AppState, email: &str) -> String {
    let profile = state.identity.login(email, "password").await.unwrap();
    let uid = profile.id.clone();
    state.sessions.insert(profile).await;
    uid
}

#[tokio::test]
async fn pix_purchase_grants_credits_exactly_once() {
    let state = test_state();
    state.config_store.set_pix_key("chave@pix.com").await.unwrap();
    let uid = login(&state, "user@demo.com").await;

    let charge = state
        .gateway
        .start_pix_purchase(&uid, 50, "45,00")
        .await
        .unwrap();
    assert!(charge.is_configured());

    // Drive confirmation deterministically instead of via the 3s poller
    state.gateway.cancel(&charge.id, &uid).await;
    assert!(state.gateway.check_once(&charge.id).await);

    let view = state.gateway.purchase_view(&charge.id, &uid).await.unwrap();
    assert_eq!(view.state, PurchaseState::Confirmed);
    assert_eq!(view.status, PaymentStatus::Paid);
    assert_eq!(state.sessions.profile(&uid).await.unwrap().credits, 60);

    // Repeated polls after confirmation produce no additional side effects
    state.gateway.check_once(&charge.id).await;
    state.gateway.check_once(&charge.id).await;
    assert_eq!(state.sessions.profile(&uid).await.unwrap().credits, 60);

    // Exactly one transaction record for the charge
    tokio::time::sleep(Duration::from_millis(100)).await;
    let txs = state.transactions.list().await.unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].id, charge.id);
    assert_eq!(txs[0].credits_purchased, 50);
    assert_eq!(txs[0].amount_paid, 45.0);
    assert!(txs[0].affiliate_id.is_none());
    assert_eq!(state.transactions.total_revenue().await.unwrap(), 45.0);
}

#[tokio::test]
async fn referred_purchase_accrues_commission_once() {
    let state = test_state();
    state.config_store.set_pix_key("chave@pix.com").await.unwrap();

    // user-3 was referred by aff-user-4, whose rate is 0.15
    let uid = login(&state, "test@demo.com").await;

    let charge = state
        .gateway
        .start_pix_purchase(&uid, 50, "45,00")
        .await
        .unwrap();
    state.gateway.cancel(&charge.id, &uid).await;

    state.gateway.check_once(&charge.id).await;
    state.gateway.check_once(&charge.id).await;

    // 45.00 * 0.15 = 6.75, on top of the seeded 6.75
    let affiliate = state.identity.get_profile("user-4").await.unwrap().unwrap();
    assert_eq!(affiliate.commission_earned, Some(13.5));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let txs = state.transactions.list().await.unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].affiliate_id.as_deref(), Some("aff-user-4"));
    assert_eq!(txs[0].commission_paid, Some(6.75));
}

#[tokio::test]
async fn unconfigured_pix_key_yields_terminal_sentinel() {
    let state = test_state();
    let uid = login(&state, "user@demo.com").await;

    let charge = state
        .gateway
        .start_pix_purchase(&uid, 50, "45,00")
        .await
        .unwrap();

    assert!(!charge.is_configured());
    assert!(charge.qr_code.contains("not configured"));
    // Sentinel charges are never tracked or polled
    assert!(state.gateway.purchase_view(&charge.id, &uid).await.is_none());
    // And no credits were granted
    assert_eq!(state.sessions.profile(&uid).await.unwrap().credits, 10);
}

#[tokio::test]
async fn auto_close_signal_raises_after_confirmation() {
    let state = test_state();
    state.config_store.set_pix_key("chave@pix.com").await.unwrap();
    let uid = login(&state, "user@demo.com").await;

    let charge = state
        .gateway
        .start_pix_purchase(&uid, 10, "10,00")
        .await
        .unwrap();
    state.gateway.cancel(&charge.id, &uid).await;
    state.gateway.check_once(&charge.id).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    let view = state.gateway.purchase_view(&charge.id, &uid).await.unwrap();
    assert!(view.auto_close);
}

#[tokio::test]
async fn card_approval_settles_inline() {
    let state = test_state();
    let uid = login(&state, "user@demo.com").await;

    let result = state
        .gateway
        .start_card_purchase(&uid, 20, "18,00", "tok_visa")
        .await
        .unwrap();
    assert_eq!(
        result.status,
        promptgen_models::CardStatus::Approved
    );
    assert_eq!(state.sessions.profile(&uid).await.unwrap().credits, 30);

    // Rejected card grants nothing
    let result = state
        .gateway
        .start_card_purchase(&uid, 20, "18,00", "")
        .await
        .unwrap();
    assert_eq!(
        result.status,
        promptgen_models::CardStatus::Rejected
    );
    assert_eq!(state.sessions.profile(&uid).await.unwrap().credits, 30);
}

#[tokio::test]
async fn purchase_views_are_owner_scoped() {
    let state = test_state();
    state.config_store.set_pix_key("chave@pix.com").await.unwrap();
    let uid = login(&state, "user@demo.com").await;
    let other = login(&state, "test@demo.com").await;

    let charge = state
        .gateway
        .start_pix_purchase(&uid, 10, "10,00")
        .await
        .unwrap();
    state.gateway.cancel(&charge.id, &uid).await;

    assert!(state.gateway.purchase_view(&charge.id, &uid).await.is_some());
    assert!(state.gateway.purchase_view(&charge.id, &other).await.is_none());
}

#[tokio::test]
async fn admin_grant_is_visible_on_next_profile_fetch() {
    let state = test_state();

    // user-4 holds 20 credits
    let granted = state.identity.grant_credits("user-4", 100).await.unwrap();
    assert_eq!(granted.credits, 120);

    let uid = login(&state, "affiliate@demo.com").await;
    let profile = state.sessions.refresh(&uid).await.unwrap();
    assert_eq!(profile.credits, 120);
}

#[tokio::test]
async fn referral_code_consumed_by_first_registration_only() {
    let state = test_state();

    // ?ref=aff-42 captured on load under the browser session key
    state.referrals.capture("sid-1", "aff-42").await;

    let code = state.referrals.take("sid-1").await;
    let user_a = state
        .identity
        .register("a@demo.test", "hunter2", code)
        .await
        .unwrap();
    assert_eq!(user_a.referred_by.as_deref(), Some("aff-42"));

    // Same session registers again without reloading: the code is gone
    let code = state.referrals.take("sid-1").await;
    assert_eq!(code, None);
    let user_b = state
        .identity
        .register("b@demo.test", "hunter2", code)
        .await
        .unwrap();
    assert!(user_b.referred_by.is_none());
}
