use crate::config::AppConfig;
use crate::payments::processor::{PaymentProcessor, StripeClient};
use crate::store::{DocumentStore, MemoryStore, PgDocumentStore};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub payments: Arc<dyn PaymentProcessor>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.database_url {
            Some(url) => Arc::new(PgDocumentStore::connect(url).await?) as Arc<dyn DocumentStore>,
            None => {
                warn!("DATABASE_URL not set; using in-memory document store");
                Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>
            }
        };

        let payments = Arc::new(StripeClient::new(&config.payments)?) as Arc<dyn PaymentProcessor>;

        Ok(Self::from_parts(config, store, payments))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn DocumentStore>,
        payments: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            config,
            store,
            payments,
        }
    }
}
