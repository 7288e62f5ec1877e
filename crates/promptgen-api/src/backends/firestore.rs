//! Firestore-backed backends.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use promptgen_firestore::{
    AdminConfigRepository, FirestoreError, StoredCredentials, TransactionRepository,
    UserRepository,
};
use promptgen_models::{Announcement, Transaction, UserProfile, UserRole};

use crate::backends::credentials::{generate_salt, hash_password, verify_password};
use crate::backends::{ConfigStore, IdentityBackend, TransactionLog};
use crate::error::{ApiError, ApiResult};

/// Identity backend persisted in the Firestore `users` collection.
pub struct FirestoreIdentity {
    repo: UserRepository,
}

impl FirestoreIdentity {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    async fn require_profile(&self, user_id: &str) -> ApiResult<UserProfile> {
        self.repo
            .get(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }
}

#[async_trait]
impl IdentityBackend for FirestoreIdentity {
    async fn login(&self, email: &str, password: &str) -> ApiResult<UserProfile> {
        let (profile, credentials) = self
            .repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid email or password."))?;

        if !verify_password(password, &credentials.salt, &credentials.password_hash) {
            return Err(ApiError::unauthorized("Invalid email or password."));
        }
        Ok(profile)
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        referred_by: Option<String>,
    ) -> ApiResult<UserProfile> {
        if self.repo.find_by_email(email).await?.is_some() {
            return Err(ApiError::conflict(
                "An account with this email already exists.",
            ));
        }

        let id = format!("user-{}", Uuid::new_v4().simple());
        let profile = UserProfile::new(id, email).with_referred_by(referred_by);

        let salt = generate_salt();
        let credentials = StoredCredentials {
            password_hash: hash_password(password, &salt),
            salt,
        };

        self.repo.create(&profile, &credentials).await?;
        info!(user_id = %profile.id, "Registered user");
        Ok(profile)
    }

    async fn get_profile(&self, user_id: &str) -> ApiResult<Option<UserProfile>> {
        Ok(self.repo.get(user_id).await?)
    }

    async fn update_credits(&self, user_id: &str, credits_after: u32) -> ApiResult<()> {
        Ok(self.repo.set_credits(user_id, credits_after).await?)
    }

    async fn grant_credits(&self, user_id: &str, amount: u32) -> ApiResult<UserProfile> {
        let mut profile = self.require_profile(user_id).await?;
        profile.credits = profile.credits.saturating_add(amount);
        self.repo.set_credits(user_id, profile.credits).await?;
        Ok(profile)
    }

    async fn list_users(&self) -> ApiResult<Vec<UserProfile>> {
        Ok(self.repo.list().await?)
    }

    async fn set_role(&self, user_id: &str, role: UserRole) -> ApiResult<UserProfile> {
        let mut profile = self.require_profile(user_id).await?;
        profile.set_role(role);
        self.repo.set_role(&profile).await?;
        Ok(profile)
    }

    async fn set_commission_rate(&self, user_id: &str, rate: f64) -> ApiResult<UserProfile> {
        let mut profile = self.require_profile(user_id).await?;
        if profile.role != UserRole::Affiliate {
            return Err(ApiError::bad_request("User is not an affiliate"));
        }
        profile.commission_rate = Some(rate);
        self.repo.set_commission_rate(user_id, rate).await?;
        Ok(profile)
    }

    async fn add_commission(&self, user_id: &str, amount: f64) -> ApiResult<f64> {
        let profile = self.require_profile(user_id).await?;
        let total = profile.commission_earned.unwrap_or(0.0) + amount;
        self.repo.set_commission_earned(user_id, total).await?;
        Ok(total)
    }

    async fn find_affiliate(&self, code: &str) -> ApiResult<Option<UserProfile>> {
        Ok(self.repo.find_by_affiliate(code).await?)
    }

    async fn set_dismissed_announcement(
        &self,
        user_id: &str,
        announcement_id: i64,
    ) -> ApiResult<()> {
        Ok(self
            .repo
            .set_dismissed_announcement(user_id, announcement_id)
            .await?)
    }
}

/// Transaction log persisted in the Firestore `transactions` collection.
pub struct FirestoreTransactionLog {
    repo: TransactionRepository,
}

impl FirestoreTransactionLog {
    pub fn new(repo: TransactionRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl TransactionLog for FirestoreTransactionLog {
    async fn record(&self, tx: &Transaction) -> ApiResult<()> {
        match self.repo.create(tx).await {
            Ok(()) => Ok(()),
            // One record per charge id; a duplicate write is a no-op.
            Err(FirestoreError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> ApiResult<Vec<Transaction>> {
        Ok(self.repo.list().await?)
    }

    async fn total_revenue(&self) -> ApiResult<f64> {
        Ok(self.repo.total_revenue().await?)
    }
}

/// Admin config store persisted in the Firestore `admin/config` document.
pub struct FirestoreConfigStore {
    repo: AdminConfigRepository,
}

impl FirestoreConfigStore {
    pub fn new(repo: AdminConfigRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ConfigStore for FirestoreConfigStore {
    async fn pix_key(&self) -> ApiResult<Option<String>> {
        Ok(self.repo.pix_key().await?)
    }

    async fn set_pix_key(&self, key: &str) -> ApiResult<()> {
        Ok(self.repo.set_pix_key(key).await?)
    }

    async fn announcement(&self) -> ApiResult<Option<Announcement>> {
        Ok(self.repo.announcement().await?)
    }

    async fn set_announcement(&self, announcement: &Announcement) -> ApiResult<()> {
        Ok(self.repo.set_announcement(announcement).await?)
    }

    async fn clear_announcement(&self) -> ApiResult<()> {
        Ok(self.repo.clear_announcement().await?)
    }
}
