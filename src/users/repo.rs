use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    auth::role::Role,
    store::{
        filter, from_document, Collection, Document, DocumentStore, Filter, UpdateOptions,
        UpdateOutcome, ID_FIELD,
    },
};

/// Fields a client may never write through a profile body.
const RESERVED: [&str; 3] = [ID_FIELD, "email", "role"];

/// User record in the store, keyed by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Value>,
    #[serde(flatten)]
    pub profile: Document,
}

impl User {
    pub fn role(&self) -> Role {
        Role::from_stored(self.role.as_ref().and_then(Value::as_str))
    }
}

fn by_email(email: &str) -> Filter {
    filter([("email", Value::String(email.to_string()))])
}

pub async fn find_by_email(db: &dyn DocumentStore, email: &str) -> anyhow::Result<Option<User>> {
    db.find_one(Collection::Users, by_email(email))
        .await?
        .map(from_document)
        .transpose()
}

pub async fn list(db: &dyn DocumentStore) -> anyhow::Result<Vec<User>> {
    db.find(Collection::Users, Filter::new())
        .await?
        .into_iter()
        .map(from_document)
        .collect()
}

/// Create or update the user `email` with `profile`, ignoring reserved fields.
pub async fn upsert_profile(
    db: &dyn DocumentStore,
    email: &str,
    mut profile: Document,
) -> anyhow::Result<UpdateOutcome> {
    for key in RESERVED {
        profile.remove(key);
    }
    profile.insert("email".into(), Value::String(email.to_string()));
    db.update(
        Collection::Users,
        by_email(email),
        profile,
        UpdateOptions { upsert: true },
    )
    .await
}

pub async fn set_role(
    db: &dyn DocumentStore,
    email: &str,
    role: Role,
) -> anyhow::Result<UpdateOutcome> {
    db.update(
        Collection::Users,
        by_email(email),
        filter([("role", Value::String(role.as_str().to_string()))]),
        UpdateOptions::default(),
    )
    .await
}
