//! API routes.

use axum::middleware;
use axum::routing::{get, patch, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::admin::{
    clear_announcement, grant_credits, list_transactions, list_users, publish_announcement,
    set_pix_key, total_revenue, update_commission_rate, update_role,
};
use crate::handlers::announcements::{dismiss_announcement, get_announcement};
use crate::handlers::auth::{capture_referral, login, logout, me, register};
use crate::handlers::credits::get_credits;
use crate::handlers::generation::{
    check_consistency, generate_image, generate_influencer_prompt, generate_product_ad_prompt,
    generate_scene_image, generate_speech, generate_storyboard, generate_video,
    generate_video_prompt,
};
use crate::handlers::payments::{
    cancel_purchase, create_card_payment, create_pix_charge, get_purchase_status,
};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let auth_routes = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/referral/capture", get(capture_referral));

    let credit_routes = Router::new().route("/credits", get(get_credits));

    let payment_routes = Router::new()
        .route("/payments/pix", post(create_pix_charge))
        .route("/payments/card", post(create_card_payment))
        .route("/payments/:charge_id/status", get(get_purchase_status))
        .route("/payments/:charge_id/cancel", post(cancel_purchase));

    let generation_routes = Router::new()
        .route("/generate/video-prompt", post(generate_video_prompt))
        .route("/generate/product-ad-prompt", post(generate_product_ad_prompt))
        .route("/generate/influencer-prompt", post(generate_influencer_prompt))
        .route("/generate/consistency", post(check_consistency))
        .route("/generate/image", post(generate_image))
        .route("/generate/video", post(generate_video))
        .route("/generate/speech", post(generate_speech))
        .route("/generate/storyboard", post(generate_storyboard))
        .route("/generate/storyboard/scene-image", post(generate_scene_image));

    let announcement_routes = Router::new()
        .route("/announcement", get(get_announcement))
        .route("/announcement/dismiss", post(dismiss_announcement));

    let admin_routes = Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:user_id/role", patch(update_role))
        .route("/admin/users/:user_id/commission", patch(update_commission_rate))
        .route("/admin/users/:user_id/credits", post(grant_credits))
        .route("/admin/transactions", get(list_transactions))
        .route("/admin/revenue", get(total_revenue))
        .route("/admin/pix-key", put(set_pix_key))
        .route(
            "/admin/announcement",
            put(publish_announcement).delete(clear_announcement),
        );

    let rate_limiter = std::sync::Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(auth_routes)
        .merge(credit_routes)
        .merge(payment_routes)
        .merge(generation_routes)
        .merge(announcement_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
