//! Session/credit store.
//!
//! Holds the authenticated users' live profiles in memory and owns the two
//! credit mutations. Both are optimistic: the in-memory balance changes
//! first (readers observe it immediately), then the identity backend is
//! written through; a failed write reverts the balance to the last
//! known-good value.
//!
//! No transaction spans the local mutation and the remote write. The remote
//! write is absolute, computed from the snapshot at call time, so rapid
//! interleaved spends can lose an update at the backend. Tests pin this
//! behavior; it is deliberate, not an oversight.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use promptgen_models::UserProfile;

use crate::backends::IdentityBackend;
use crate::error::{ApiError, ApiResult};
use crate::metrics;

struct SessionEntry {
    profile: UserProfile,
    /// Balance as last confirmed by the identity backend.
    last_synced_credits: u32,
}

/// In-memory store of authenticated sessions.
pub struct SessionStore {
    identity: Arc<dyn IdentityBackend>,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    /// Create a store over the given identity backend.
    pub fn new(identity: Arc<dyn IdentityBackend>) -> Self {
        Self {
            identity,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session for a freshly authenticated profile.
    pub async fn insert(&self, profile: UserProfile) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            profile.id.clone(),
            SessionEntry {
                last_synced_credits: profile.credits,
                profile,
            },
        );
    }

    /// End a session.
    pub async fn remove(&self, user_id: &str) {
        self.sessions.write().await.remove(user_id);
    }

    /// The live profile for an active session.
    pub async fn profile(&self, user_id: &str) -> Option<UserProfile> {
        let sessions = self.sessions.read().await;
        sessions.get(user_id).map(|e| e.profile.clone())
    }

    /// Re-fetch the profile from the identity backend and update the session.
    ///
    /// Backend-side changes (admin grants, role changes) become visible here.
    pub async fn refresh(&self, user_id: &str) -> ApiResult<UserProfile> {
        let profile = self
            .identity
            .get_profile(user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("No such user"))?;

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            user_id.to_string(),
            SessionEntry {
                last_synced_credits: profile.credits,
                profile: profile.clone(),
            },
        );
        Ok(profile)
    }

    /// Spend credits optimistically.
    ///
    /// Precondition: an active session with `credits >= amount`. On an
    /// insufficient balance nothing changes and the typed error is returned;
    /// the remote call is never attempted. Returns the balance after the
    /// spend.
    pub async fn spend_credits(&self, user_id: &str, amount: u32) -> ApiResult<u32> {
        let credits_after = {
            let mut sessions = self.sessions.write().await;
            let entry = sessions
                .get_mut(user_id)
                .ok_or_else(|| ApiError::unauthorized("No active session"))?;

            if entry.profile.credits < amount {
                return Err(ApiError::insufficient_credits(format!(
                    "Insufficient credits. You need {} credit{} but have {}. Please buy more credits.",
                    amount,
                    if amount == 1 { "" } else { "s" },
                    entry.profile.credits
                )));
            }

            entry.profile.credits -= amount;
            entry.profile.credits
        };

        debug!(user_id, amount, credits_after, "Spent credits");
        metrics::record_credits_spent(amount);
        self.write_through(user_id, credits_after).await
    }

    /// Add credits optimistically. Returns the balance after the grant.
    pub async fn add_credits(&self, user_id: &str, amount: u32) -> ApiResult<u32> {
        let credits_after = {
            let mut sessions = self.sessions.write().await;
            let entry = sessions
                .get_mut(user_id)
                .ok_or_else(|| ApiError::unauthorized("No active session"))?;
            entry.profile.credits = entry.profile.credits.saturating_add(amount);
            entry.profile.credits
        };

        debug!(user_id, amount, credits_after, "Added credits");
        metrics::record_credits_granted(amount);
        self.write_through(user_id, credits_after).await
    }

    /// Write the new balance to the identity backend; revert on failure.
    async fn write_through(&self, user_id: &str, credits_after: u32) -> ApiResult<u32> {
        match self.identity.update_credits(user_id, credits_after).await {
            Ok(()) => {
                let mut sessions = self.sessions.write().await;
                if let Some(entry) = sessions.get_mut(user_id) {
                    entry.last_synced_credits = credits_after;
                }
                Ok(credits_after)
            }
            Err(e) => {
                warn!(user_id, error = %e, "Credit write-through failed, reverting");
                let mut sessions = self.sessions.write().await;
                if let Some(entry) = sessions.get_mut(user_id) {
                    entry.profile.credits = entry.last_synced_credits;
                }
                Err(e)
            }
        }
    }
}

/// Session-scoped referral codes captured from `?ref=` query parameters.
///
/// A code is stored under the caller's session key and consumed exactly once
/// at registration: the first registration in a session gets the referrer,
/// a second one gets none.
pub struct ReferralStore {
    codes: RwLock<HashMap<String, String>>,
}

impl ReferralStore {
    pub fn new() -> Self {
        Self {
            codes: RwLock::new(HashMap::new()),
        }
    }

    /// Capture a referral code for a session.
    pub async fn capture(&self, session_key: &str, code: &str) {
        let mut codes = self.codes.write().await;
        codes.insert(session_key.to_string(), code.to_string());
    }

    /// Consume the captured code, removing it.
    pub async fn take(&self, session_key: &str) -> Option<String> {
        let mut codes = self.codes.write().await;
        codes.remove(session_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockIdentityBackend;

    async fn store_with_user(credits: u32, identity: MockIdentityBackend) -> SessionStore {
        let store = SessionStore::new(Arc::new(identity));
        let mut profile = UserProfile::new("user-1", "user@demo.com");
        profile.credits = credits;
        store.insert(profile).await;
        store
    }

    #[tokio::test]
    async fn test_spend_decrements_and_writes_through() {
        let mut identity = MockIdentityBackend::new();
        identity
            .expect_update_credits()
            .withf(|uid, credits| uid == "user-1" && *credits == 7)
            .times(1)
            .returning(|_, _| Ok(()));

        let store = store_with_user(10, identity).await;
        let after = store.spend_credits("user-1", 3).await.unwrap();
        assert_eq!(after, 7);
        assert_eq!(store.profile("user-1").await.unwrap().credits, 7);
    }

    #[tokio::test]
    async fn test_insufficient_credits_is_a_noop() {
        // No update_credits expectation: the backend must not be called.
        let identity = MockIdentityBackend::new();
        let store = store_with_user(1, identity).await;

        let err = store.spend_credits("user-1", 5).await.unwrap_err();
        assert!(matches!(err, ApiError::InsufficientCredits(_)));
        assert_eq!(store.profile("user-1").await.unwrap().credits, 1);
    }

    #[tokio::test]
    async fn test_failed_write_through_reverts() {
        let mut identity = MockIdentityBackend::new();
        identity
            .expect_update_credits()
            .times(1)
            .returning(|_, _| Err(ApiError::internal("backend down")));

        let store = store_with_user(10, identity).await;
        let err = store.spend_credits("user-1", 4).await.unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));

        // Reverted to the last known-good value
        assert_eq!(store.profile("user-1").await.unwrap().credits, 10);
    }

    #[tokio::test]
    async fn test_add_credits() {
        let mut identity = MockIdentityBackend::new();
        identity
            .expect_update_credits()
            .withf(|_, credits| *credits == 60)
            .times(1)
            .returning(|_, _| Ok(()));

        let store = store_with_user(10, identity).await;
        assert_eq!(store.add_credits("user-1", 50).await.unwrap(), 60);
    }

    #[tokio::test]
    async fn test_spend_without_session_is_unauthorized() {
        let store = SessionStore::new(Arc::new(MockIdentityBackend::new()));
        let err = store.spend_credits("ghost", 1).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_referral_code_is_consumed_once() {
        let referrals = ReferralStore::new();
        referrals.capture("sid-1", "aff-42").await;

        assert_eq!(referrals.take("sid-1").await.as_deref(), Some("aff-42"));
        // Second registration in the same session finds nothing
        assert_eq!(referrals.take("sid-1").await, None);
    }

    #[tokio::test]
    async fn test_refresh_picks_up_backend_changes() {
        let mut identity = MockIdentityBackend::new();
        identity.expect_get_profile().returning(|_| {
            let mut profile = UserProfile::new("user-1", "user@demo.com");
            profile.credits = 120;
            Ok(Some(profile))
        });

        let store = store_with_user(20, identity).await;
        let refreshed = store.refresh("user-1").await.unwrap();
        assert_eq!(refreshed.credits, 120);
        assert_eq!(store.profile("user-1").await.unwrap().credits, 120);
    }
}
