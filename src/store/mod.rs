//! Document store collaborator.
//!
//! Every resource lives in a named collection of JSON objects keyed by a
//! string `_id`. Filters match on top-level field equality and updates merge
//! top-level fields into each matching document. There are no multi-document
//! transactions: callers that issue two writes must cope with the first one
//! landing and the second one failing.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

pub type Document = Map<String, Value>;
pub type Filter = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Parts,
    Reviews,
    Purchases,
    Payments,
    Users,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Parts => "parts",
            Collection::Reviews => "reviews",
            Collection::Purchases => "purchases",
            Collection::Payments => "payments",
            Collection::Users => "users",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    pub upsert: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub inserted_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub matched_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upserted_id: Option<String>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert `doc`, assigning a fresh `_id` when it has none. Returns the id.
    async fn insert(&self, coll: Collection, doc: Document) -> anyhow::Result<String>;
    async fn find(&self, coll: Collection, filter: Filter) -> anyhow::Result<Vec<Document>>;
    async fn find_one(&self, coll: Collection, filter: Filter) -> anyhow::Result<Option<Document>>;
    /// Merge `patch` into every document matching `filter`.
    async fn update(
        &self,
        coll: Collection,
        filter: Filter,
        patch: Document,
        opts: UpdateOptions,
    ) -> anyhow::Result<UpdateOutcome>;
    /// Remove every document matching `filter`. Returns how many went away.
    async fn delete(&self, coll: Collection, filter: Filter) -> anyhow::Result<u64>;
}

/// Build a filter (or patch) from field/value pairs.
pub fn filter<const N: usize>(pairs: [(&str, Value); N]) -> Filter {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

pub fn by_id(id: &str) -> Filter {
    filter([(ID_FIELD, Value::String(id.to_string()))])
}

pub(crate) fn ensure_id(doc: &mut Document) -> String {
    match doc.get(ID_FIELD).and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => {
            let id = Uuid::new_v4().to_string();
            doc.insert(ID_FIELD.into(), Value::String(id.clone()));
            id
        }
    }
}

pub(crate) fn matches(doc: &Document, filter: &Filter) -> bool {
    filter.iter().all(|(k, v)| doc.get(k) == Some(v))
}

/// Document produced by an upsert that matched nothing.
pub(crate) fn upsert_seed(filter: Filter, patch: Document) -> Document {
    let mut doc = filter;
    doc.extend(patch);
    doc
}

pub fn to_document<T: Serialize>(value: &T) -> anyhow::Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("expected a JSON object, got {other}"),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> anyhow::Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}
