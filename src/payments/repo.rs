use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{
    filter, from_document, to_document, Collection, Document, DocumentStore, UpdateOptions,
    UpdateOutcome, ID_FIELD,
};

/// A confirmed charge, keyed by the processor's transaction id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub transaction_id: String,
    pub purchase_id: String,
    pub email: String,
    #[serde(flatten)]
    pub details: Document,
}

fn by_transaction(transaction_id: &str) -> crate::store::Filter {
    filter([("transactionId", Value::String(transaction_id.to_string()))])
}

pub async fn find_by_transaction(
    db: &dyn DocumentStore,
    transaction_id: &str,
) -> anyhow::Result<Option<PaymentRecord>> {
    db.find_one(Collection::Payments, by_transaction(transaction_id))
        .await?
        .map(from_document)
        .transpose()
}

/// Write the record; repeating it with the same transaction id rewrites the same row.
pub async fn record(db: &dyn DocumentStore, payment: &PaymentRecord) -> anyhow::Result<UpdateOutcome> {
    let mut doc = to_document(payment)?;
    doc.remove(ID_FIELD);
    db.update(
        Collection::Payments,
        by_transaction(&payment.transaction_id),
        doc,
        UpdateOptions { upsert: true },
    )
    .await
}
