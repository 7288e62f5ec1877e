//! Admin configuration document.
//!
//! A single `admin/config` document holds the merchant PIX key and the
//! current site-wide announcement.

use std::collections::HashMap;

use promptgen_models::Announcement;

use crate::client::FirestoreClient;
use crate::error::FirestoreResult;
use crate::types::{ToFirestoreValue, Value};

const COLLECTION: &str = "admin";
const DOC_ID: &str = "config";

/// Repository for the admin config document.
#[derive(Clone)]
pub struct AdminConfigRepository {
    client: FirestoreClient,
}

impl AdminConfigRepository {
    /// Create a new admin config repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// The configured merchant PIX key, if any.
    pub async fn pix_key(&self) -> FirestoreResult<Option<String>> {
        let doc = self.client.get_document(COLLECTION, DOC_ID).await?;
        Ok(doc.and_then(|d| d.field::<String>("pix_key")).filter(|k| !k.is_empty()))
    }

    /// Store the merchant PIX key.
    pub async fn set_pix_key(&self, key: &str) -> FirestoreResult<()> {
        self.patch([("pix_key".to_string(), key.to_firestore_value())])
            .await
    }

    /// The current announcement, if one is published.
    pub async fn announcement(&self) -> FirestoreResult<Option<Announcement>> {
        let doc = self.client.get_document(COLLECTION, DOC_ID).await?;
        Ok(doc.and_then(|d| {
            let id = d.field::<i64>("announcement_id")?;
            let message = d.field::<String>("announcement_message")?;
            Some(Announcement { id, message })
        }))
    }

    /// Publish an announcement, replacing any previous one.
    pub async fn set_announcement(&self, announcement: &Announcement) -> FirestoreResult<()> {
        self.patch([
            (
                "announcement_id".to_string(),
                announcement.id.to_firestore_value(),
            ),
            (
                "announcement_message".to_string(),
                announcement.message.to_firestore_value(),
            ),
        ])
        .await
    }

    /// Clear the published announcement.
    pub async fn clear_announcement(&self) -> FirestoreResult<()> {
        self.patch([
            ("announcement_id".to_string(), Value::NullValue(())),
            ("announcement_message".to_string(), Value::NullValue(())),
        ])
        .await
    }

    async fn patch<const N: usize>(&self, entries: [(String, Value); N]) -> FirestoreResult<()> {
        let fields: HashMap<String, Value> = entries.into_iter().collect();
        let mask = fields.keys().cloned().collect();
        self.client
            .update_document(COLLECTION, DOC_ID, fields, Some(mask))
            .await?;
        Ok(())
    }
}
