//! Axum HTTP API server.
//!
//! This crate provides:
//! - Email/password authentication with HS256 session tokens
//! - The session/credit store with optimistic spend and rollback
//! - The payment gateway state machine and status poller
//! - Credit-gated generation endpoints
//! - Admin management, rate limiting, and Prometheus metrics

pub mod auth;
pub mod backends;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{GenerationService, PaymentGateway, ReferralStore, SessionStore};
pub use state::AppState;
