//! Injected backend interfaces.
//!
//! The identity, payment, transaction, and admin-config backends are trait
//! objects constructed once per process and shared through [`crate::state::AppState`],
//! so the in-memory demo set and the Firestore-backed set are interchangeable
//! (and so tests can swap in failure-injecting doubles).

pub mod credentials;
pub mod firestore;
pub mod memory;

use async_trait::async_trait;

use promptgen_models::{
    Announcement, CardPaymentResult, ChargeStatus, PixCharge, Transaction, UserProfile, UserRole,
};

use crate::error::ApiResult;

pub use firestore::{FirestoreConfigStore, FirestoreIdentity, FirestoreTransactionLog};
pub use memory::{MemoryConfigStore, MemoryIdentity, MemoryTransactionLog, PixPaymentBackend};

/// Identity backend: the system of record for user profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Authenticate by email and password.
    async fn login(&self, email: &str, password: &str) -> ApiResult<UserProfile>;

    /// Create an account. Fails on duplicate email.
    async fn register(
        &self,
        email: &str,
        password: &str,
        referred_by: Option<String>,
    ) -> ApiResult<UserProfile>;

    /// Fetch a profile by id.
    async fn get_profile(&self, user_id: &str) -> ApiResult<Option<UserProfile>>;

    /// Write the post-operation credit balance.
    ///
    /// The write is absolute (not a delta): callers compute the new balance
    /// from their in-memory snapshot, so interleaved writers can lose an
    /// update. See the session store docs for why this stays as-is.
    async fn update_credits(&self, user_id: &str, credits_after: u32) -> ApiResult<()>;

    /// Add credits directly at the backend (admin grants).
    async fn grant_credits(&self, user_id: &str, amount: u32) -> ApiResult<UserProfile>;

    /// List every profile.
    async fn list_users(&self) -> ApiResult<Vec<UserProfile>>;

    /// Assign a role, provisioning affiliate attributes on promotion.
    async fn set_role(&self, user_id: &str, role: UserRole) -> ApiResult<UserProfile>;

    /// Set an affiliate's commission rate. Fails for non-affiliates.
    async fn set_commission_rate(&self, user_id: &str, rate: f64) -> ApiResult<UserProfile>;

    /// Add to an affiliate's cumulative earned commission; returns the new total.
    async fn add_commission(&self, user_id: &str, amount: f64) -> ApiResult<f64>;

    /// Find the affiliate owning a referral code.
    async fn find_affiliate(&self, code: &str) -> ApiResult<Option<UserProfile>>;

    /// Record the last announcement a user dismissed.
    async fn set_dismissed_announcement(
        &self,
        user_id: &str,
        announcement_id: i64,
    ) -> ApiResult<()>;
}

/// Payment backend: mints charges and reports their status.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    /// Mint a PIX charge for a credit package.
    ///
    /// Returns the `not-configured` sentinel charge when no merchant PIX key
    /// is on file.
    async fn create_pix_charge(
        &self,
        amount_display: &str,
        credits: u32,
        user_id: &str,
    ) -> ApiResult<PixCharge>;

    /// Process a card payment synchronously.
    async fn create_card_payment(
        &self,
        amount_display: &str,
        credits: u32,
        user_id: &str,
        card_token: &str,
    ) -> ApiResult<CardPaymentResult>;

    /// Query the status of a pending charge.
    async fn get_status(&self, charge_id: &str) -> ApiResult<ChargeStatus>;
}

/// Transaction log: the durable record of settled purchases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionLog: Send + Sync {
    /// Persist a settled transaction.
    async fn record(&self, tx: &Transaction) -> ApiResult<()>;

    /// List every transaction, newest first.
    async fn list(&self) -> ApiResult<Vec<Transaction>>;

    /// Sum of `amount_paid` across all transactions.
    async fn total_revenue(&self) -> ApiResult<f64>;
}

/// Admin-scoped configuration: merchant PIX key and the announcement banner.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn pix_key(&self) -> ApiResult<Option<String>>;
    async fn set_pix_key(&self, key: &str) -> ApiResult<()>;
    async fn announcement(&self) -> ApiResult<Option<Announcement>>;
    async fn set_announcement(&self, announcement: &Announcement) -> ApiResult<()>;
    async fn clear_announcement(&self) -> ApiResult<()>;
}
