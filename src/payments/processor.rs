use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::PaymentsConfig;

/// External card processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a charge intent for `amount` minor units and return its client secret.
    async fn create_payment_intent(&self, amount: i64, currency: &str) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    id: String,
    client_secret: String,
}

impl StripeClient {
    pub fn new(cfg: &PaymentsConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            secret_key: cfg.secret_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_payment_intent(&self, amount: i64, currency: &str) -> anyhow::Result<String> {
        let intent = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&[
                ("amount", amount.to_string()),
                ("currency", currency.to_string()),
                ("payment_method_types[]", "card".to_string()),
            ])
            .send()
            .await
            .context("stripe create payment intent")?
            .error_for_status()
            .context("stripe rejected payment intent")?
            .json::<PaymentIntent>()
            .await
            .context("decode payment intent")?;
        debug!(intent_id = %intent.id, amount, currency, "payment intent created");
        Ok(intent.client_secret)
    }
}
