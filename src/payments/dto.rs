use serde::{Deserialize, Serialize};

use crate::store::Document;

#[derive(Debug, Deserialize)]
pub struct PaymentIntentRequest {
    pub price: f64, // major currency units, e.g. 12.50
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Body of `PATCH /purchase/:id` sent after the client confirms the charge.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub transaction_id: String,
    #[serde(flatten)]
    pub details: Document,
}
