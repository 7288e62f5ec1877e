//! Firestore REST API client for the PromptGen backend.
//!
//! This crate provides:
//! - A typed user repository (profiles, credentials, affiliate updates)
//! - A transaction repository for settled purchases
//! - An admin config repository (merchant PIX key, announcement banner)
//! - Service account authentication via gcp_auth
//! - Field-mask updates and retry logic

pub mod client;
pub mod config_repo;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod transaction_repo;
pub mod types;
pub mod user_repo;

pub use client::{FirestoreClient, FirestoreConfig};
pub use config_repo::AdminConfigRepository;
pub use error::{FirestoreError, FirestoreResult};
pub use transaction_repo::TransactionRepository;
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};
pub use user_repo::{StoredCredentials, UserRepository};
