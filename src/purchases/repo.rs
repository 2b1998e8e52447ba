use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{
    by_id, filter, from_document, Collection, Document, DocumentStore, Filter, UpdateOptions,
    UpdateOutcome, ID_FIELD,
};

/// Fields owned by the server, never taken from a request body.
const RESERVED: [&str; 4] = [ID_FIELD, "email", "paid", "transactionId"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String, // owner
    #[serde(default)]
    pub paid: bool,
    #[serde(
        rename = "transactionId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transaction_id: Option<String>,
    #[serde(flatten)]
    pub details: Document,
}

fn by_owner(email: &str) -> Filter {
    filter([("email", Value::String(email.to_string()))])
}

/// Store a new unpaid purchase owned by `owner`.
pub async fn create(
    db: &dyn DocumentStore,
    owner: &str,
    mut details: Document,
) -> anyhow::Result<String> {
    for key in RESERVED {
        details.remove(key);
    }
    details.insert("email".into(), Value::String(owner.to_string()));
    details.insert("paid".into(), Value::Bool(false));
    db.insert(Collection::Purchases, details).await
}

pub async fn list_all(db: &dyn DocumentStore) -> anyhow::Result<Vec<Purchase>> {
    collect(db.find(Collection::Purchases, Filter::new()).await?)
}

pub async fn list_by_owner(db: &dyn DocumentStore, email: &str) -> anyhow::Result<Vec<Purchase>> {
    collect(db.find(Collection::Purchases, by_owner(email)).await?)
}

pub async fn get(db: &dyn DocumentStore, id: &str) -> anyhow::Result<Option<Purchase>> {
    db.find_one(Collection::Purchases, by_id(id))
        .await?
        .map(from_document)
        .transpose()
}

pub async fn delete_by_owner(db: &dyn DocumentStore, email: &str) -> anyhow::Result<u64> {
    db.delete(Collection::Purchases, by_owner(email)).await
}

/// Flip `paid` from false to true. Matches nothing if the purchase is already paid.
pub async fn mark_paid(
    db: &dyn DocumentStore,
    id: &str,
    transaction_id: &str,
) -> anyhow::Result<UpdateOutcome> {
    let mut unpaid = by_id(id);
    unpaid.insert("paid".into(), Value::Bool(false));
    db.update(
        Collection::Purchases,
        unpaid,
        filter([
            ("paid", Value::Bool(true)),
            ("transactionId", Value::String(transaction_id.to_string())),
        ]),
        UpdateOptions::default(),
    )
    .await
}

fn collect(docs: Vec<Document>) -> anyhow::Result<Vec<Purchase>> {
    docs.into_iter().map(from_document).collect()
}
