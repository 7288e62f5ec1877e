//! Payment gateway.
//!
//! Drives one purchase attempt through its state machine:
//!
//! ```text
//! SelectingPackage -> CreatingCharge -> AwaitingConfirmation -> Confirmed
//!                          |                    |
//!                          v                    v
//!                        Failed  <-------------/        (retry: back to SelectingPackage)
//! ```
//!
//! `NotConfigured` is a terminal informational state entered when the
//! backend has no merchant key; it is rendered as a dead-end, never polled.
//!
//! A charge in `AwaitingConfirmation` is polled on a fixed interval by a
//! cancellable background task. The first `paid` observation finalizes the
//! purchase exactly once: credits are granted, commission is accrued for
//! referred payers, a transaction is recorded, and an auto-close signal is
//! raised after a fixed delay. Repeated polls after confirmation have no
//! further side effects.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use promptgen_models::{
    pix, CardPaymentResult, CardStatus, PaymentStatus, PixCharge, Transaction,
};

use crate::backends::{IdentityBackend, PaymentBackend, TransactionLog};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::session::SessionStore;

/// Timeout for background transaction recording.
const TRANSACTION_RECORD_TIMEOUT: Duration = Duration::from_secs(5);

/// State of one purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseState {
    /// No charge yet; also the reset state after a failure.
    SelectingPackage,
    /// Charge creation in flight.
    CreatingCharge,
    /// Charge minted, waiting for the processor to report `paid`.
    AwaitingConfirmation,
    /// Terminal success; credits granted.
    Confirmed,
    /// Terminal informational: no merchant key configured.
    NotConfigured,
    /// Terminal failure; the user may retry from package selection.
    Failed,
}

struct Purchase {
    user_id: String,
    credits: u32,
    amount_paid: f64,
    state: PurchaseState,
    message: Option<String>,
    auto_close: bool,
    finalized: bool,
}

/// Serializable snapshot of a purchase for status polling.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseView {
    pub charge_id: String,
    pub state: PurchaseState,
    pub status: PaymentStatus,
    pub credits: u32,
    /// Set a fixed delay after confirmation; tells the UI to close itself.
    pub auto_close: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Gateway coordinating charges, polling, and settlement.
pub struct PaymentGateway {
    payments: Arc<dyn PaymentBackend>,
    transactions: Arc<dyn TransactionLog>,
    identity: Arc<dyn IdentityBackend>,
    sessions: Arc<SessionStore>,
    purchases: RwLock<HashMap<String, Purchase>>,
    pollers: RwLock<HashMap<String, watch::Sender<bool>>>,
    poll_interval: Duration,
    auto_close_delay: Duration,
}

impl PaymentGateway {
    /// Create a gateway over the given backends.
    pub fn new(
        payments: Arc<dyn PaymentBackend>,
        transactions: Arc<dyn TransactionLog>,
        identity: Arc<dyn IdentityBackend>,
        sessions: Arc<SessionStore>,
        poll_interval: Duration,
        auto_close_delay: Duration,
    ) -> Self {
        Self {
            payments,
            transactions,
            identity,
            sessions,
            purchases: RwLock::new(HashMap::new()),
            pollers: RwLock::new(HashMap::new()),
            poll_interval,
            auto_close_delay,
        }
    }

    // =========================================================================
    // Purchase entry points
    // =========================================================================

    /// Create a PIX charge and start polling it.
    ///
    /// Returns the charge for the UI to render. A `not-configured` sentinel
    /// charge is returned as-is and never tracked or polled.
    pub async fn start_pix_purchase(
        self: &Arc<Self>,
        user_id: &str,
        credits: u32,
        amount_display: &str,
    ) -> ApiResult<PixCharge> {
        let fallback_amount = parse_amount(amount_display)?;

        let charge = self
            .payments
            .create_pix_charge(amount_display, credits, user_id)
            .await
            .map_err(|e| {
                warn!(user_id, error = %e, "Charge creation failed");
                e
            })?;

        if !charge.is_configured() {
            return Ok(charge);
        }

        // The settled amount comes from the charge payload itself
        let amount_paid = pix::decode_amount(&charge.qr_code).unwrap_or(fallback_amount);

        self.purchases.write().await.insert(
            charge.id.clone(),
            Purchase {
                user_id: user_id.to_string(),
                credits,
                amount_paid,
                state: PurchaseState::AwaitingConfirmation,
                message: None,
                auto_close: false,
                finalized: false,
            },
        );

        self.spawn_poller(charge.id.clone()).await;
        info!(user_id, charge_id = %charge.id, credits, "Created PIX charge");
        Ok(charge)
    }

    /// Process a card payment. No polling; settlement happens inline on
    /// approval.
    pub async fn start_card_purchase(
        self: &Arc<Self>,
        user_id: &str,
        credits: u32,
        amount_display: &str,
        card_token: &str,
    ) -> ApiResult<CardPaymentResult> {
        let amount_paid = parse_amount(amount_display)?;

        let result = self
            .payments
            .create_card_payment(amount_display, credits, user_id, card_token)
            .await?;

        if result.status == CardStatus::Approved {
            self.purchases.write().await.insert(
                result.id.clone(),
                Purchase {
                    user_id: user_id.to_string(),
                    credits,
                    amount_paid,
                    state: PurchaseState::AwaitingConfirmation,
                    message: None,
                    auto_close: false,
                    finalized: false,
                },
            );
            self.finalize(&result.id).await;
        }

        Ok(result)
    }

    // =========================================================================
    // Status polling
    // =========================================================================

    /// Current view of a tracked purchase, scoped to its owner.
    pub async fn purchase_view(&self, charge_id: &str, user_id: &str) -> Option<PurchaseView> {
        let purchases = self.purchases.read().await;
        purchases
            .get(charge_id)
            .filter(|p| p.user_id == user_id)
            .map(|p| PurchaseView {
                charge_id: charge_id.to_string(),
                state: p.state,
                status: if p.state == PurchaseState::Confirmed {
                    PaymentStatus::Paid
                } else {
                    PaymentStatus::Pending
                },
                credits: p.credits,
                auto_close: p.auto_close,
                message: p.message.clone(),
            })
    }

    /// Cancel polling for a purchase (view teardown), scoped to its owner.
    ///
    /// The purchase record stays pending; there is no expiry on an unpaid
    /// charge.
    pub async fn cancel(&self, charge_id: &str, user_id: &str) {
        {
            let purchases = self.purchases.read().await;
            match purchases.get(charge_id) {
                Some(p) if p.user_id == user_id => {}
                _ => return,
            }
        }
        if let Some(cancel) = self.pollers.write().await.remove(charge_id) {
            let _ = cancel.send(true);
            debug!(charge_id, "Cancelled status polling");
        }
    }

    /// Poll the backend once. Returns `true` when polling should stop.
    pub async fn check_once(self: &Arc<Self>, charge_id: &str) -> bool {
        match self.payments.get_status(charge_id).await {
            Ok(snapshot) if snapshot.status == PaymentStatus::Paid => {
                self.finalize(charge_id).await;
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(charge_id, error = %e, "Status poll failed");
                let mut purchases = self.purchases.write().await;
                if let Some(p) = purchases.get_mut(charge_id) {
                    if p.state == PurchaseState::AwaitingConfirmation {
                        p.state = PurchaseState::Failed;
                        p.message = Some(e.to_string());
                    }
                }
                true
            }
        }
    }

    async fn spawn_poller(self: &Arc<Self>, charge_id: String) {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        self.pollers
            .write()
            .await
            .insert(charge_id.clone(), cancel_tx);

        let gateway = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(gateway.poll_interval);
            // The first tick completes immediately; polls start one interval in.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if gateway.check_once(&charge_id).await {
                            break;
                        }
                    }
                    _ = cancel_rx.changed() => {
                        break;
                    }
                }
            }

            gateway.pollers.write().await.remove(&charge_id);
        });
    }

    // =========================================================================
    // Settlement
    // =========================================================================

    /// Finalize a paid purchase exactly once.
    async fn finalize(self: &Arc<Self>, charge_id: &str) {
        let (user_id, credits, amount_paid) = {
            let mut purchases = self.purchases.write().await;
            let Some(p) = purchases.get_mut(charge_id) else {
                return;
            };
            if p.finalized {
                return;
            }
            p.finalized = true;
            p.state = PurchaseState::Confirmed;
            (p.user_id.clone(), p.credits, p.amount_paid)
        };

        info!(charge_id, user_id = %user_id, credits, "Purchase confirmed");
        metrics::record_purchase_confirmed(credits);

        if let Err(e) = self.sessions.add_credits(&user_id, credits).await {
            warn!(charge_id, error = %e, "Failed to grant purchased credits");
        }

        self.settle(charge_id, &user_id, credits, amount_paid).await;

        // Raise the auto-close signal a fixed delay after confirmation
        let gateway = Arc::clone(self);
        let charge_id = charge_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(gateway.auto_close_delay).await;
            let mut purchases = gateway.purchases.write().await;
            if let Some(p) = purchases.get_mut(&charge_id) {
                p.auto_close = true;
            }
        });
    }

    /// Accrue commission for referred payers and record the transaction.
    async fn settle(&self, charge_id: &str, user_id: &str, credits: u32, amount_paid: f64) {
        let payer = match self.identity.get_profile(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!(charge_id, user_id, "Paying user not found; skipping settlement");
                return;
            }
            Err(e) => {
                warn!(charge_id, error = %e, "Failed to load paying user");
                return;
            }
        };

        let mut tx = Transaction::new(charge_id, user_id, amount_paid, credits);

        if let Some(code) = payer.referred_by.as_deref() {
            match self.identity.find_affiliate(code).await {
                Ok(Some(affiliate)) => {
                    let commission = amount_paid * affiliate.effective_commission_rate();
                    match self.identity.add_commission(&affiliate.id, commission).await {
                        Ok(total) => {
                            info!(
                                charge_id,
                                affiliate_id = %affiliate.id,
                                commission,
                                total,
                                "Accrued commission"
                            );
                            let affiliate_code = affiliate
                                .affiliate_id
                                .unwrap_or_else(|| code.to_string());
                            tx = tx.with_commission(affiliate_code, commission);
                        }
                        Err(e) => {
                            warn!(charge_id, error = %e, "Failed to accrue commission");
                        }
                    }
                }
                Ok(None) => {
                    debug!(charge_id, code, "Referrer code has no matching affiliate");
                }
                Err(e) => {
                    warn!(charge_id, error = %e, "Affiliate lookup failed");
                }
            }
        }

        // Record off the confirmation path; failures are logged, not retried
        let transactions = Arc::clone(&self.transactions);
        tokio::spawn(async move {
            match tokio::time::timeout(TRANSACTION_RECORD_TIMEOUT, transactions.record(&tx)).await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(transaction_id = %tx.id, error = %e, "Failed to record transaction"),
                Err(_) => warn!(transaction_id = %tx.id, "Transaction recording timed out"),
            }
        });
    }
}

fn parse_amount(amount_display: &str) -> ApiResult<f64> {
    amount_display
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|a| *a > 0.0 && a.is_finite())
        .ok_or_else(|| ApiError::bad_request("Invalid amount"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("45,00").unwrap(), 45.0);
        assert_eq!(parse_amount("9.90").unwrap(), 9.9);
        assert!(parse_amount("free").is_err());
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("0").is_err());
    }
}
