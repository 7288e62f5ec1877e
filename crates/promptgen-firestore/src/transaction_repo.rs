//! Typed repository for settled purchase transactions.

use std::collections::HashMap;

use tracing::info;

use promptgen_models::Transaction;

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, ToFirestoreValue, Value};

const COLLECTION: &str = "transactions";

/// Repository for the `transactions` collection.
#[derive(Clone)]
pub struct TransactionRepository {
    client: FirestoreClient,
}

impl TransactionRepository {
    /// Create a new transaction repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Persist a settled transaction. The charge id is the document id, so a
    /// second write for the same charge fails with `AlreadyExists`.
    pub async fn create(&self, tx: &Transaction) -> FirestoreResult<()> {
        let fields = transaction_to_fields(tx);
        self.client.create_document(COLLECTION, &tx.id, fields).await?;
        info!(transaction_id = %tx.id, user_id = %tx.user_id, "Recorded transaction");
        Ok(())
    }

    /// List every transaction, newest first.
    pub async fn list(&self) -> FirestoreResult<Vec<Transaction>> {
        let docs = self.client.list_documents(COLLECTION).await?;
        let mut txs: Vec<Transaction> = docs
            .iter()
            .map(document_to_transaction)
            .collect::<FirestoreResult<_>>()?;
        txs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(txs)
    }

    /// Sum of `amount_paid` across all transactions.
    pub async fn total_revenue(&self) -> FirestoreResult<f64> {
        let txs = self.list().await?;
        Ok(txs.iter().map(|tx| tx.amount_paid).sum())
    }
}

fn transaction_to_fields(tx: &Transaction) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("user_id".to_string(), tx.user_id.to_firestore_value());
    fields.insert("amount_paid".to_string(), tx.amount_paid.to_firestore_value());
    fields.insert(
        "credits_purchased".to_string(),
        tx.credits_purchased.to_firestore_value(),
    );
    fields.insert("timestamp".to_string(), tx.timestamp.to_firestore_value());
    if let Some(affiliate_id) = &tx.affiliate_id {
        fields.insert("affiliate_id".to_string(), affiliate_id.to_firestore_value());
    }
    if let Some(commission) = tx.commission_paid {
        fields.insert("commission_paid".to_string(), commission.to_firestore_value());
    }
    fields
}

fn document_to_transaction(doc: &Document) -> FirestoreResult<Transaction> {
    let id = doc
        .doc_id()
        .ok_or_else(|| FirestoreError::invalid_response("transaction document has no name"))?
        .to_string();

    Ok(Transaction {
        id,
        user_id: doc.field("user_id").unwrap_or_default(),
        amount_paid: doc.field("amount_paid").unwrap_or(0.0),
        credits_purchased: doc.field("credits_purchased").unwrap_or(0),
        timestamp: doc.field("timestamp").unwrap_or_else(chrono::Utc::now),
        affiliate_id: doc.field("affiliate_id"),
        commission_paid: doc.field("commission_paid"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_round_trip() {
        let tx = Transaction::new("pix_1", "user-3", 45.0, 50).with_commission("aff-user-4", 6.75);
        let fields = transaction_to_fields(&tx);
        let doc = Document {
            name: Some("x/transactions/pix_1".to_string()),
            fields: Some(fields),
            create_time: None,
            update_time: None,
        };
        let parsed = document_to_transaction(&doc).unwrap();
        assert_eq!(parsed.id, "pix_1");
        assert_eq!(parsed.amount_paid, 45.0);
        assert_eq!(parsed.credits_purchased, 50);
        assert_eq!(parsed.affiliate_id.as_deref(), Some("aff-user-4"));
        assert_eq!(parsed.commission_paid, Some(6.75));
    }

    #[test]
    fn test_plain_transaction_omits_affiliate_fields() {
        let tx = Transaction::new("pix_2", "user-1", 10.0, 10);
        let fields = transaction_to_fields(&tx);
        assert!(!fields.contains_key("affiliate_id"));
        assert!(!fields.contains_key("commission_paid"));
    }
}
