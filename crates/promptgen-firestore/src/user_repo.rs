//! Typed repository for user profiles.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use promptgen_models::{UserProfile, UserRole};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};

const COLLECTION: &str = "users";

/// Password verifier material stored alongside a profile.
///
/// The hash scheme itself lives with the identity backend; this repository
/// only persists the opaque digest and salt.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub password_hash: String,
    pub salt: String,
}

/// Repository for the `users` collection.
#[derive(Clone)]
pub struct UserRepository {
    client: FirestoreClient,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Get a profile by user id.
    pub async fn get(&self, user_id: &str) -> FirestoreResult<Option<UserProfile>> {
        let doc = self.client.get_document(COLLECTION, user_id).await?;
        doc.map(|d| document_to_profile(&d)).transpose()
    }

    /// Look up a profile and its stored credentials by email.
    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> FirestoreResult<Option<(UserProfile, StoredCredentials)>> {
        let query = StructuredQuery::field_equals(
            COLLECTION,
            "email",
            email.to_firestore_value(),
            1,
        );
        let docs = self.client.run_query(query).await?;

        match docs.first() {
            Some(doc) => {
                let profile = document_to_profile(doc)?;
                let credentials = StoredCredentials {
                    password_hash: doc.field::<String>("password_hash").unwrap_or_default(),
                    salt: doc.field::<String>("password_salt").unwrap_or_default(),
                };
                Ok(Some((profile, credentials)))
            }
            None => Ok(None),
        }
    }

    /// Look up the affiliate owning a referral code.
    pub async fn find_by_affiliate(&self, code: &str) -> FirestoreResult<Option<UserProfile>> {
        let query = StructuredQuery::field_equals(
            COLLECTION,
            "affiliate_id",
            code.to_firestore_value(),
            1,
        );
        let docs = self.client.run_query(query).await?;
        docs.first().map(document_to_profile).transpose()
    }

    /// Create a profile with its credentials.
    pub async fn create(
        &self,
        profile: &UserProfile,
        credentials: &StoredCredentials,
    ) -> FirestoreResult<()> {
        let mut fields = profile_to_fields(profile);
        fields.insert(
            "password_hash".to_string(),
            credentials.password_hash.to_firestore_value(),
        );
        fields.insert(
            "password_salt".to_string(),
            credentials.salt.to_firestore_value(),
        );

        self.client
            .create_document(COLLECTION, &profile.id, fields)
            .await?;
        info!(user_id = %profile.id, "Created user record");
        Ok(())
    }

    /// Write the credit balance.
    pub async fn set_credits(&self, user_id: &str, credits: u32) -> FirestoreResult<()> {
        self.patch(
            user_id,
            [("credits".to_string(), credits.to_firestore_value())],
        )
        .await
    }

    /// Write role and affiliate attributes from the given profile.
    pub async fn set_role(&self, profile: &UserProfile) -> FirestoreResult<()> {
        self.patch(
            &profile.id,
            [
                (
                    "role".to_string(),
                    profile.role.as_str().to_firestore_value(),
                ),
                (
                    "affiliate_id".to_string(),
                    profile.affiliate_id.to_firestore_value(),
                ),
                (
                    "commission_rate".to_string(),
                    profile.commission_rate.to_firestore_value(),
                ),
                (
                    "commission_earned".to_string(),
                    profile.commission_earned.to_firestore_value(),
                ),
            ],
        )
        .await
    }

    /// Write the commission rate.
    pub async fn set_commission_rate(&self, user_id: &str, rate: f64) -> FirestoreResult<()> {
        self.patch(
            user_id,
            [("commission_rate".to_string(), rate.to_firestore_value())],
        )
        .await
    }

    /// Write the cumulative earned commission.
    pub async fn set_commission_earned(&self, user_id: &str, total: f64) -> FirestoreResult<()> {
        self.patch(
            user_id,
            [("commission_earned".to_string(), total.to_firestore_value())],
        )
        .await
    }

    /// Record the last dismissed announcement id.
    pub async fn set_dismissed_announcement(
        &self,
        user_id: &str,
        announcement_id: i64,
    ) -> FirestoreResult<()> {
        self.patch(
            user_id,
            [(
                "dismissed_announcement".to_string(),
                announcement_id.to_firestore_value(),
            )],
        )
        .await
    }

    /// List every profile.
    pub async fn list(&self) -> FirestoreResult<Vec<UserProfile>> {
        let docs = self.client.list_documents(COLLECTION).await?;
        docs.iter().map(document_to_profile).collect()
    }

    async fn patch<const N: usize>(
        &self,
        user_id: &str,
        entries: [(String, Value); N],
    ) -> FirestoreResult<()> {
        let mut fields: HashMap<String, Value> = entries.into_iter().collect();
        fields.insert("updated_at".to_string(), Utc::now().to_firestore_value());

        let mask = fields.keys().cloned().collect();
        self.client
            .update_document(COLLECTION, user_id, fields, Some(mask))
            .await?;
        Ok(())
    }
}

/// Parse a Firestore document into a profile.
fn document_to_profile(doc: &Document) -> FirestoreResult<UserProfile> {
    let id = doc
        .doc_id()
        .ok_or_else(|| FirestoreError::invalid_response("user document has no name"))?
        .to_string();

    let role = doc
        .field::<String>("role")
        .and_then(|r| UserRole::from_str(&r))
        .unwrap_or_default();

    Ok(UserProfile {
        id,
        email: doc.field("email").unwrap_or_default(),
        role,
        credits: doc.field("credits").unwrap_or(0),
        affiliate_id: doc.field("affiliate_id"),
        commission_rate: doc.field("commission_rate"),
        commission_earned: doc.field("commission_earned"),
        referred_by: doc.field("referred_by"),
        dismissed_announcement: doc.field("dismissed_announcement"),
        created_at: doc.field("created_at").unwrap_or_else(Utc::now),
    })
}

/// Serialize a profile to Firestore fields.
fn profile_to_fields(profile: &UserProfile) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("email".to_string(), profile.email.to_firestore_value());
    fields.insert(
        "role".to_string(),
        profile.role.as_str().to_firestore_value(),
    );
    fields.insert("credits".to_string(), profile.credits.to_firestore_value());
    fields.insert(
        "created_at".to_string(),
        profile.created_at.to_firestore_value(),
    );
    if let Some(affiliate_id) = &profile.affiliate_id {
        fields.insert(
            "affiliate_id".to_string(),
            affiliate_id.to_firestore_value(),
        );
    }
    if let Some(rate) = profile.commission_rate {
        fields.insert("commission_rate".to_string(), rate.to_firestore_value());
    }
    if let Some(earned) = profile.commission_earned {
        fields.insert("commission_earned".to_string(), earned.to_firestore_value());
    }
    if let Some(referred_by) = &profile.referred_by {
        fields.insert("referred_by".to_string(), referred_by.to_firestore_value());
    }
    if let Some(dismissed) = profile.dismissed_announcement {
        fields.insert(
            "dismissed_announcement".to_string(),
            dismissed.to_firestore_value(),
        );
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> Document {
        let mut fields = HashMap::new();
        fields.insert("email".to_string(), "a@b.com".to_firestore_value());
        fields.insert("role".to_string(), "affiliate".to_firestore_value());
        fields.insert("credits".to_string(), 20u32.to_firestore_value());
        fields.insert("affiliate_id".to_string(), "aff-user-4".to_firestore_value());
        fields.insert("commission_rate".to_string(), 0.15f64.to_firestore_value());
        Document {
            name: Some("projects/p/databases/(default)/documents/users/user-4".to_string()),
            fields: Some(fields),
            create_time: None,
            update_time: None,
        }
    }

    #[test]
    fn test_document_to_profile() {
        let profile = document_to_profile(&sample_document()).unwrap();
        assert_eq!(profile.id, "user-4");
        assert_eq!(profile.role, UserRole::Affiliate);
        assert_eq!(profile.credits, 20);
        assert_eq!(profile.affiliate_id.as_deref(), Some("aff-user-4"));
        assert_eq!(profile.commission_rate, Some(0.15));
        assert!(profile.referred_by.is_none());
    }

    #[test]
    fn test_profile_round_trip() {
        let original = document_to_profile(&sample_document()).unwrap();
        let fields = profile_to_fields(&original);
        let doc = Document {
            name: Some("x/users/user-4".to_string()),
            fields: Some(fields),
            create_time: None,
            update_time: None,
        };
        let parsed = document_to_profile(&doc).unwrap();
        assert_eq!(parsed.email, original.email);
        assert_eq!(parsed.credits, original.credits);
        assert_eq!(parsed.role, original.role);
    }

    #[test]
    fn test_unknown_role_falls_back_to_user() {
        let mut doc = sample_document();
        doc.fields
            .as_mut()
            .unwrap()
            .insert("role".to_string(), "root".to_firestore_value());
        let profile = document_to_profile(&doc).unwrap();
        assert_eq!(profile.role, UserRole::User);
    }
}
