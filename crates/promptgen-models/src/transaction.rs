//! Purchase transaction records.
//!
//! Exactly one transaction is persisted per charge that reaches `paid`.
//! Purchases by referred users additionally carry the referring affiliate
//! and the commission paid out to them.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A settled credit purchase.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Transaction {
    /// Charge id this transaction settles
    pub id: String,

    /// Paying user
    pub user_id: String,

    /// Amount paid in currency units
    pub amount_paid: f64,

    /// Credits granted by the purchase
    pub credits_purchased: u32,

    /// When the payment was confirmed
    pub timestamp: DateTime<Utc>,

    /// Affiliate credited for this purchase (if the payer was referred)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliate_id: Option<String>,

    /// Commission paid to the affiliate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_paid: Option<f64>,
}

impl Transaction {
    /// Create a transaction record for a plain (unreferred) purchase.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        amount_paid: f64,
        credits_purchased: u32,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            amount_paid,
            credits_purchased,
            timestamp: Utc::now(),
            affiliate_id: None,
            commission_paid: None,
        }
    }

    /// Attach the referring affiliate and their commission.
    pub fn with_commission(mut self, affiliate_id: impl Into<String>, commission: f64) -> Self {
        self.affiliate_id = Some(affiliate_id.into());
        self.commission_paid = Some(commission);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_transaction_has_no_affiliate_fields() {
        let tx = Transaction::new("pix_1", "user-1", 45.0, 50);
        assert!(tx.affiliate_id.is_none());
        assert!(tx.commission_paid.is_none());
    }

    #[test]
    fn test_with_commission() {
        let tx = Transaction::new("pix_1", "user-3", 45.0, 50).with_commission("aff-user-4", 6.75);
        assert_eq!(tx.affiliate_id.as_deref(), Some("aff-user-4"));
        assert_eq!(tx.commission_paid, Some(6.75));
    }
}
