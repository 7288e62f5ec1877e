//! Payment charge models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Sentinel charge id returned when no merchant PIX key is configured.
///
/// A charge carrying this id is a terminal informational state, not a
/// payable charge; it must never be polled.
pub const NOT_CONFIGURED_CHARGE_ID: &str = "not-configured";

/// Lifecycle status of a charge. `Paid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }
}

/// One PIX payment attempt for a credit package.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PixCharge {
    /// Charge id assigned by the payment backend
    pub id: String,

    /// Current status
    pub status: PaymentStatus,

    /// Copy-paste BR Code payload
    pub qr_code: String,

    /// QR image as a data URL
    pub qr_code_base64: String,

    /// Credits granted when this charge is paid
    pub credit_amount: u32,

    /// Owning user
    pub user_id: String,
}

impl PixCharge {
    /// False for the `not-configured` sentinel charge.
    pub fn is_configured(&self) -> bool {
        self.id != NOT_CONFIGURED_CHARGE_ID
    }
}

/// Outcome of a synchronous card payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Approved,
    Rejected,
}

/// Result of a card payment request. No polling; the status is final.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CardPaymentResult {
    pub id: String,
    pub status: CardStatus,
    pub message: String,
}

/// Snapshot returned by a charge status poll.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChargeStatus {
    pub status: PaymentStatus,
    /// Credits the charge grants; meaningful once `status` is `Paid`.
    pub credits: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_round_trip() {
        assert_eq!(PaymentStatus::from_str("pending"), Some(PaymentStatus::Pending));
        assert_eq!(PaymentStatus::from_str("paid"), Some(PaymentStatus::Paid));
        assert_eq!(PaymentStatus::from_str("refunded"), None);
    }

    #[test]
    fn test_not_configured_sentinel() {
        let charge = PixCharge {
            id: NOT_CONFIGURED_CHARGE_ID.to_string(),
            status: PaymentStatus::Pending,
            qr_code: String::new(),
            qr_code_base64: String::new(),
            credit_amount: 0,
            user_id: "user-1".to_string(),
        };
        assert!(!charge.is_configured());
    }
}
