//! Application state.

use std::sync::Arc;

use tracing::info;

use promptgen_firestore::{
    AdminConfigRepository, FirestoreClient, TransactionRepository, UserRepository,
};

use crate::backends::{
    ConfigStore, FirestoreConfigStore, FirestoreIdentity, FirestoreTransactionLog,
    IdentityBackend, MemoryConfigStore, MemoryIdentity, MemoryTransactionLog, PaymentBackend,
    PixPaymentBackend, TransactionLog,
};
use crate::config::ApiConfig;
use crate::services::{GenerationService, PaymentGateway, ReferralStore, SessionStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub identity: Arc<dyn IdentityBackend>,
    pub transactions: Arc<dyn TransactionLog>,
    pub config_store: Arc<dyn ConfigStore>,
    pub sessions: Arc<SessionStore>,
    pub referrals: Arc<ReferralStore>,
    pub gateway: Arc<PaymentGateway>,
    pub generation: Arc<GenerationService>,
}

impl AppState {
    /// Create application state, wiring the backend set named by the config.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let (identity, transactions, config_store): (
            Arc<dyn IdentityBackend>,
            Arc<dyn TransactionLog>,
            Arc<dyn ConfigStore>,
        ) = match config.backend.as_str() {
            "firestore" => {
                info!("Using Firestore backends");
                let client = FirestoreClient::from_env().await?;
                (
                    Arc::new(FirestoreIdentity::new(UserRepository::new(client.clone()))),
                    Arc::new(FirestoreTransactionLog::new(TransactionRepository::new(
                        client.clone(),
                    ))),
                    Arc::new(FirestoreConfigStore::new(AdminConfigRepository::new(client))),
                )
            }
            _ => {
                info!("Using in-memory backends with demo users");
                (
                    Arc::new(MemoryIdentity::with_demo_users()),
                    Arc::new(MemoryTransactionLog::new()),
                    Arc::new(MemoryConfigStore::new()),
                )
            }
        };

        let payments: Arc<dyn PaymentBackend> = Arc::new(PixPaymentBackend::new(
            Arc::clone(&config_store),
            config.payment_confirm_delay,
        ));

        Ok(Self::with_backends(
            config,
            identity,
            payments,
            transactions,
            config_store,
        ))
    }

    /// Assemble state from explicit backends (also used by tests).
    pub fn with_backends(
        config: ApiConfig,
        identity: Arc<dyn IdentityBackend>,
        payments: Arc<dyn PaymentBackend>,
        transactions: Arc<dyn TransactionLog>,
        config_store: Arc<dyn ConfigStore>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(Arc::clone(&identity)));
        let gateway = Arc::new(PaymentGateway::new(
            payments,
            Arc::clone(&transactions),
            Arc::clone(&identity),
            Arc::clone(&sessions),
            config.payment_poll_interval,
            config.payment_auto_close_delay,
        ));
        let generation = Arc::new(GenerationService::new(Arc::clone(&sessions)));

        Self {
            config,
            identity,
            transactions,
            config_store,
            sessions,
            referrals: Arc::new(ReferralStore::new()),
            gateway,
            generation,
        }
    }
}
