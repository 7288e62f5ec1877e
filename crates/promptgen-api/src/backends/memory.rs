//! In-memory backends.
//!
//! `MemoryIdentity` is an injected, instance-scoped stand-in for the real
//! identity service; `PixPaymentBackend` simulates the PIX processor
//! (charges auto-confirm a fixed delay after creation). These power the
//! demo deployment and the test suite.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use promptgen_models::{
    Announcement, BrCodeBuilder, CardPaymentResult, CardStatus, ChargeStatus, PaymentStatus,
    PixCharge, Transaction, UserProfile, UserRole, NOT_CONFIGURED_CHARGE_ID,
};

use crate::backends::credentials::{generate_salt, hash_password, verify_password};
use crate::backends::{ConfigStore, IdentityBackend, PaymentBackend, TransactionLog};
use crate::error::{ApiError, ApiResult};

/// Merchant name embedded in generated BR Codes.
const MERCHANT_NAME: &str = "PROMPTGEN";

// =============================================================================
// Identity
// =============================================================================

struct StoredUser {
    profile: UserProfile,
    password_hash: String,
    salt: String,
}

/// In-memory identity backend.
pub struct MemoryIdentity {
    users: RwLock<HashMap<String, StoredUser>>,
}

impl MemoryIdentity {
    /// Create an empty identity backend.
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Create a backend seeded with the demo accounts.
    ///
    /// Every demo account authenticates with the password `password`.
    pub fn with_demo_users() -> Self {
        let mut user1 = UserProfile::new("user-1", "user@demo.com");
        user1.credits = 10;

        let mut user2 = UserProfile::new("user-2", "admin@demo.com");
        user2.role = UserRole::Admin;
        user2.credits = 999;

        let mut user3 = UserProfile::new("user-3", "test@demo.com");
        user3.credits = 5;
        user3.referred_by = Some("aff-user-4".to_string());

        let mut user4 = UserProfile::new("user-4", "affiliate@demo.com");
        user4.role = UserRole::Affiliate;
        user4.credits = 20;
        user4.affiliate_id = Some("aff-user-4".to_string());
        user4.commission_rate = Some(0.15);
        user4.commission_earned = Some(6.75);

        let mut user5 = UserProfile::new("user-5", "influencer@demo.com");
        user5.role = UserRole::Influencer;
        user5.credits = 500;

        [user1, user2, user3, user4, user5]
            .into_iter()
            .fold(Self::new(), |backend, profile| {
                backend.with_user(profile, "password")
            })
    }

    /// Add a profile with the given password, bypassing registration checks.
    pub fn with_user(self, profile: UserProfile, password: &str) -> Self {
        let mut users = self.users.into_inner();
        let salt = generate_salt();
        users.insert(
            profile.id.clone(),
            StoredUser {
                password_hash: hash_password(password, &salt),
                salt,
                profile,
            },
        );
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl IdentityBackend for MemoryIdentity {
    async fn login(&self, email: &str, password: &str) -> ApiResult<UserProfile> {
        let users = self.users.read().await;
        let user = users
            .values()
            .find(|u| u.profile.email == email)
            .filter(|u| verify_password(password, &u.salt, &u.password_hash))
            .ok_or_else(|| ApiError::unauthorized("Invalid email or password."))?;
        Ok(user.profile.clone())
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        referred_by: Option<String>,
    ) -> ApiResult<UserProfile> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.profile.email == email) {
            return Err(ApiError::conflict(
                "An account with this email already exists.",
            ));
        }

        let id = format!("user-{}", Uuid::new_v4().simple());
        let profile = UserProfile::new(id.clone(), email).with_referred_by(referred_by);

        let salt = generate_salt();
        users.insert(
            id,
            StoredUser {
                password_hash: hash_password(password, &salt),
                salt,
                profile: profile.clone(),
            },
        );

        Ok(profile)
    }

    async fn get_profile(&self, user_id: &str) -> ApiResult<Option<UserProfile>> {
        let users = self.users.read().await;
        Ok(users.get(user_id).map(|u| u.profile.clone()))
    }

    async fn update_credits(&self, user_id: &str, credits_after: u32) -> ApiResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        user.profile.credits = credits_after;
        Ok(())
    }

    async fn grant_credits(&self, user_id: &str, amount: u32) -> ApiResult<UserProfile> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        user.profile.credits = user.profile.credits.saturating_add(amount);
        Ok(user.profile.clone())
    }

    async fn list_users(&self) -> ApiResult<Vec<UserProfile>> {
        let users = self.users.read().await;
        let mut profiles: Vec<UserProfile> = users.values().map(|u| u.profile.clone()).collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(profiles)
    }

    async fn set_role(&self, user_id: &str, role: UserRole) -> ApiResult<UserProfile> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        user.profile.set_role(role);
        Ok(user.profile.clone())
    }

    async fn set_commission_rate(&self, user_id: &str, rate: f64) -> ApiResult<UserProfile> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        if user.profile.role != UserRole::Affiliate {
            return Err(ApiError::bad_request("User is not an affiliate"));
        }
        user.profile.commission_rate = Some(rate);
        Ok(user.profile.clone())
    }

    async fn add_commission(&self, user_id: &str, amount: f64) -> ApiResult<f64> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        let total = user.profile.commission_earned.unwrap_or(0.0) + amount;
        user.profile.commission_earned = Some(total);
        Ok(total)
    }

    async fn find_affiliate(&self, code: &str) -> ApiResult<Option<UserProfile>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.profile.affiliate_id.as_deref() == Some(code))
            .map(|u| u.profile.clone()))
    }

    async fn set_dismissed_announcement(
        &self,
        user_id: &str,
        announcement_id: i64,
    ) -> ApiResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        user.profile.dismissed_announcement = Some(announcement_id);
        Ok(())
    }
}

// =============================================================================
// Payments
// =============================================================================

struct PendingCharge {
    charge: PixCharge,
    confirm_at: Instant,
}

/// Simulated PIX processor.
///
/// Charges are minted locally from the admin-configured PIX key and
/// auto-confirm `confirm_delay` after creation, the way a sandbox
/// processor would.
pub struct PixPaymentBackend {
    config: Arc<dyn ConfigStore>,
    pending: RwLock<HashMap<String, PendingCharge>>,
    confirm_delay: Duration,
    /// HTTP client for rendering QR images; `None` uses an inline placeholder.
    http: Option<reqwest::Client>,
}

impl PixPaymentBackend {
    /// Create a payment backend over the given config store.
    pub fn new(config: Arc<dyn ConfigStore>, confirm_delay: Duration) -> Self {
        Self {
            config,
            pending: RwLock::new(HashMap::new()),
            confirm_delay,
            http: Some(reqwest::Client::new()),
        }
    }

    /// Disable the QR image fetch (tests).
    pub fn without_qr_fetch(mut self) -> Self {
        self.http = None;
        self
    }

    async fn render_qr(&self, payload: &str) -> String {
        if let Some(http) = &self.http {
            let url = format!(
                "https://api.qrserver.com/v1/create-qr-code/?size=200x200&data={}",
                urlencoding::encode(payload)
            );
            match http.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    if let Ok(bytes) = response.bytes().await {
                        return format!("data:image/png;base64,{}", BASE64.encode(&bytes));
                    }
                }
                Ok(response) => {
                    warn!(status = %response.status(), "QR render service error");
                }
                Err(e) => {
                    warn!("QR render request failed: {}", e);
                }
            }
        }
        svg_data_url("Scan unavailable - use the copy-paste code.")
    }
}

/// Inline SVG placeholder as a data URL.
fn svg_data_url(text: &str) -> String {
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100"><text x="50" y="50" font-size="6" text-anchor="middle">{text}</text></svg>"#
    );
    format!("data:image/svg+xml;base64,{}", BASE64.encode(svg))
}

#[async_trait]
impl PaymentBackend for PixPaymentBackend {
    async fn create_pix_charge(
        &self,
        amount_display: &str,
        credits: u32,
        user_id: &str,
    ) -> ApiResult<PixCharge> {
        let Some(pix_key) = self.config.pix_key().await? else {
            return Ok(PixCharge {
                id: NOT_CONFIGURED_CHARGE_ID.to_string(),
                status: PaymentStatus::Pending,
                qr_code: "PIX key is not configured in the admin panel.".to_string(),
                qr_code_base64: svg_data_url("PIX not configured by admin."),
                credit_amount: credits,
                user_id: user_id.to_string(),
            });
        };

        let qr_code = BrCodeBuilder::new(pix_key, amount_display, MERCHANT_NAME).build();
        let qr_code_base64 = self.render_qr(&qr_code).await;

        let charge = PixCharge {
            id: format!("pix_{}", Uuid::new_v4().simple()),
            status: PaymentStatus::Pending,
            qr_code,
            qr_code_base64,
            credit_amount: credits,
            user_id: user_id.to_string(),
        };

        self.pending.write().await.insert(
            charge.id.clone(),
            PendingCharge {
                charge: charge.clone(),
                confirm_at: Instant::now() + self.confirm_delay,
            },
        );

        Ok(charge)
    }

    async fn create_card_payment(
        &self,
        _amount_display: &str,
        _credits: u32,
        _user_id: &str,
        card_token: &str,
    ) -> ApiResult<CardPaymentResult> {
        let id = format!("card_{}", Uuid::new_v4().simple());
        if card_token.trim().is_empty() {
            return Ok(CardPaymentResult {
                id,
                status: CardStatus::Rejected,
                message: "Card was rejected by the processor.".to_string(),
            });
        }
        Ok(CardPaymentResult {
            id,
            status: CardStatus::Approved,
            message: "Payment approved.".to_string(),
        })
    }

    async fn get_status(&self, charge_id: &str) -> ApiResult<ChargeStatus> {
        let mut pending = self.pending.write().await;
        let entry = pending
            .get_mut(charge_id)
            .ok_or_else(|| ApiError::not_found("Transaction not found."))?;

        if entry.charge.status == PaymentStatus::Pending && Instant::now() >= entry.confirm_at {
            entry.charge.status = PaymentStatus::Paid;
        }

        Ok(ChargeStatus {
            status: entry.charge.status,
            credits: entry.charge.credit_amount,
        })
    }
}

// =============================================================================
// Transaction log
// =============================================================================

/// In-memory transaction log.
pub struct MemoryTransactionLog {
    transactions: RwLock<Vec<Transaction>>,
}

impl MemoryTransactionLog {
    pub fn new() -> Self {
        Self {
            transactions: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TransactionLog for MemoryTransactionLog {
    async fn record(&self, tx: &Transaction) -> ApiResult<()> {
        let mut transactions = self.transactions.write().await;
        if transactions.iter().any(|t| t.id == tx.id) {
            // One record per charge id
            return Ok(());
        }
        transactions.push(tx.clone());
        Ok(())
    }

    async fn list(&self) -> ApiResult<Vec<Transaction>> {
        let mut transactions = self.transactions.read().await.clone();
        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(transactions)
    }

    async fn total_revenue(&self) -> ApiResult<f64> {
        let transactions = self.transactions.read().await;
        Ok(transactions.iter().map(|tx| tx.amount_paid).sum())
    }
}

// =============================================================================
// Config store
// =============================================================================

#[derive(Default)]
struct MemoryConfig {
    pix_key: Option<String>,
    announcement: Option<Announcement>,
}

/// In-memory admin config store.
pub struct MemoryConfigStore {
    config: RwLock<MemoryConfig>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self {
            config: RwLock::new(MemoryConfig::default()),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn pix_key(&self) -> ApiResult<Option<String>> {
        Ok(self.config.read().await.pix_key.clone())
    }

    async fn set_pix_key(&self, key: &str) -> ApiResult<()> {
        self.config.write().await.pix_key = Some(key.to_string());
        Ok(())
    }

    async fn announcement(&self) -> ApiResult<Option<Announcement>> {
        Ok(self.config.read().await.announcement.clone())
    }

    async fn set_announcement(&self, announcement: &Announcement) -> ApiResult<()> {
        self.config.write().await.announcement = Some(announcement.clone());
        Ok(())
    }

    async fn clear_announcement(&self) -> ApiResult<()> {
        self.config.write().await.announcement = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptgen_models::pix;

    #[tokio::test]
    async fn test_demo_login() {
        let identity = MemoryIdentity::with_demo_users();
        let profile = identity.login("user@demo.com", "password").await.unwrap();
        assert_eq!(profile.id, "user-1");
        assert_eq!(profile.credits, 10);

        let err = identity.login("user@demo.com", "wrong").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let identity = MemoryIdentity::with_demo_users();
        let err = identity
            .register("user@demo.com", "hunter2", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_seeds_welcome_credits_and_referrer() {
        let identity = MemoryIdentity::new();
        let profile = identity
            .register("new@demo.com", "hunter2", Some("aff-42".to_string()))
            .await
            .unwrap();
        assert_eq!(profile.credits, promptgen_models::WELCOME_CREDITS);
        assert_eq!(profile.referred_by.as_deref(), Some("aff-42"));
    }

    #[tokio::test]
    async fn test_find_affiliate() {
        let identity = MemoryIdentity::with_demo_users();
        let affiliate = identity.find_affiliate("aff-user-4").await.unwrap().unwrap();
        assert_eq!(affiliate.id, "user-4");
        assert!(identity.find_affiliate("aff-nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_admin_grant_adds_to_balance() {
        let identity = MemoryIdentity::with_demo_users();
        let profile = identity.grant_credits("user-4", 100).await.unwrap();
        assert_eq!(profile.credits, 120);

        // Visible on the next profile fetch
        let fetched = identity.get_profile("user-4").await.unwrap().unwrap();
        assert_eq!(fetched.credits, 120);
    }

    #[tokio::test]
    async fn test_commission_accumulates() {
        let identity = MemoryIdentity::with_demo_users();
        let total = identity.add_commission("user-4", 4.5).await.unwrap();
        assert_eq!(total, 11.25);
    }

    #[tokio::test]
    async fn test_set_commission_rate_requires_affiliate() {
        let identity = MemoryIdentity::with_demo_users();
        let err = identity.set_commission_rate("user-1", 0.2).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let profile = identity.set_commission_rate("user-4", 0.2).await.unwrap();
        assert_eq!(profile.commission_rate, Some(0.2));
    }

    fn memory_payments(confirm_delay: Duration) -> (Arc<MemoryConfigStore>, PixPaymentBackend) {
        let config = Arc::new(MemoryConfigStore::new());
        let payments =
            PixPaymentBackend::new(config.clone(), confirm_delay).without_qr_fetch();
        (config, payments)
    }

    #[tokio::test]
    async fn test_pix_charge_without_key_is_not_configured() {
        let (_config, payments) = memory_payments(Duration::ZERO);
        let charge = payments
            .create_pix_charge("45,00", 50, "user-1")
            .await
            .unwrap();
        assert!(!charge.is_configured());
        assert_eq!(charge.id, NOT_CONFIGURED_CHARGE_ID);
        assert!(charge.qr_code.contains("not configured"));
    }

    #[tokio::test]
    async fn test_pix_charge_carries_payable_br_code() {
        let (config, payments) = memory_payments(Duration::from_secs(3600));
        config.set_pix_key("chave@pix.com").await.unwrap();

        let charge = payments
            .create_pix_charge("45,00", 50, "user-1")
            .await
            .unwrap();
        assert!(charge.is_configured());
        assert_eq!(pix::decode_amount(&charge.qr_code), Ok(45.0));

        // Still pending while the confirm delay has not elapsed
        let status = payments.get_status(&charge.id).await.unwrap();
        assert_eq!(status.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_pix_charge_confirms_after_delay() {
        let (config, payments) = memory_payments(Duration::ZERO);
        config.set_pix_key("chave@pix.com").await.unwrap();

        let charge = payments
            .create_pix_charge("10,00", 10, "user-1")
            .await
            .unwrap();

        let status = payments.get_status(&charge.id).await.unwrap();
        assert_eq!(status.status, PaymentStatus::Paid);
        assert_eq!(status.credits, 10);

        // Repeated polls keep reporting paid
        let again = payments.get_status(&charge.id).await.unwrap();
        assert_eq!(again.status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_unknown_charge_is_not_found() {
        let (_config, payments) = memory_payments(Duration::ZERO);
        let err = payments.get_status("pix_missing").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_transaction_log_dedupes_by_charge_id() {
        let log = MemoryTransactionLog::new();
        let tx = Transaction::new("pix_1", "user-1", 45.0, 50);
        log.record(&tx).await.unwrap();
        log.record(&tx).await.unwrap();
        assert_eq!(log.list().await.unwrap().len(), 1);
        assert_eq!(log.total_revenue().await.unwrap(), 45.0);
    }
}
