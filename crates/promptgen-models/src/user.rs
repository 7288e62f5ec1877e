//! User profile and role models.
//!
//! A profile carries the integer credit balance debited by generation
//! operations, plus the affiliate attributes used by commission accrual.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Credits granted to every newly registered account.
pub const WELCOME_CREDITS: u32 = 5;

/// Commission rate applied when an affiliate has no explicit rate set.
pub const DEFAULT_COMMISSION_RATE: f64 = 0.10;

/// Role assigned to a user account.
///
/// Matched exhaustively at the few decision points that care about it
/// (admin gating, commission eligibility, view routing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Standard account
    User,
    /// Full administrative access
    Admin,
    /// Content-provider account with influencer tooling
    Influencer,
    /// Referral partner earning commission on referred purchases
    Affiliate,
}

impl UserRole {
    /// Returns the role as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Influencer => "influencer",
            Self::Affiliate => "affiliate",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            "influencer" => Some(Self::Influencer),
            "affiliate" => Some(Self::Affiliate),
            _ => None,
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

/// A user profile.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UserProfile {
    /// Opaque user id
    pub id: String,

    /// Login email
    pub email: String,

    /// Account role
    #[serde(default)]
    pub role: UserRole,

    /// Current credit balance
    pub credits: u32,

    /// Referral code handed out by this user (affiliates only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliate_id: Option<String>,

    /// Commission rate in [0, 1] (affiliates only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,

    /// Cumulative commission earned in currency units (affiliates only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_earned: Option<f64>,

    /// Referral code of whoever referred this user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<String>,

    /// Id of the last site-wide announcement this user dismissed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismissed_announcement: Option<i64>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create a new standard profile with the welcome credit grant.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role: UserRole::User,
            credits: WELCOME_CREDITS,
            affiliate_id: None,
            commission_rate: None,
            commission_earned: None,
            referred_by: None,
            dismissed_announcement: None,
            created_at: Utc::now(),
        }
    }

    /// Set the referring affiliate code.
    pub fn with_referred_by(mut self, code: Option<String>) -> Self {
        self.referred_by = code;
        self
    }

    /// True for admin accounts.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Effective commission rate for an affiliate profile.
    pub fn effective_commission_rate(&self) -> f64 {
        self.commission_rate.unwrap_or(DEFAULT_COMMISSION_RATE)
    }

    /// Assign a role, provisioning affiliate attributes on first promotion.
    ///
    /// Promoting to `Affiliate` assigns `aff-{id}` as the referral code and
    /// seeds the commission rate/earnings when they were never set. Demoting
    /// leaves the affiliate attributes in place so earned commission survives.
    pub fn set_role(&mut self, role: UserRole) {
        self.role = role;
        if role == UserRole::Affiliate && self.affiliate_id.is_none() {
            self.affiliate_id = Some(format!("aff-{}", self.id));
            self.commission_rate = Some(self.commission_rate.unwrap_or(DEFAULT_COMMISSION_RATE));
            self.commission_earned = Some(self.commission_earned.unwrap_or(0.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [
            UserRole::User,
            UserRole::Admin,
            UserRole::Influencer,
            UserRole::Affiliate,
        ] {
            assert_eq!(UserRole::from_str(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::from_str("superuser"), None);
    }

    #[test]
    fn test_new_profile_gets_welcome_credits() {
        let profile = UserProfile::new("user-1", "a@b.com");
        assert_eq!(profile.credits, WELCOME_CREDITS);
        assert_eq!(profile.role, UserRole::User);
        assert!(profile.referred_by.is_none());
    }

    #[test]
    fn test_promote_to_affiliate_provisions_attributes() {
        let mut profile = UserProfile::new("user-7", "a@b.com");
        profile.set_role(UserRole::Affiliate);

        assert_eq!(profile.affiliate_id.as_deref(), Some("aff-user-7"));
        assert_eq!(profile.commission_rate, Some(DEFAULT_COMMISSION_RATE));
        assert_eq!(profile.commission_earned, Some(0.0));
    }

    #[test]
    fn test_promote_keeps_existing_rate() {
        let mut profile = UserProfile::new("user-7", "a@b.com");
        profile.commission_rate = Some(0.15);
        profile.set_role(UserRole::Affiliate);
        assert_eq!(profile.commission_rate, Some(0.15));
    }

    #[test]
    fn test_demotion_keeps_earnings() {
        let mut profile = UserProfile::new("user-7", "a@b.com");
        profile.set_role(UserRole::Affiliate);
        profile.commission_earned = Some(12.5);
        profile.set_role(UserRole::User);
        assert_eq!(profile.commission_earned, Some(12.5));
        assert!(profile.affiliate_id.is_some());
    }
}
