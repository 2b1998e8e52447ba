use serde::Serialize;
use tracing::debug;

use crate::{store::DocumentStore, users::repo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    /// Anything other than the exact string `admin` is a customer.
    pub fn from_stored(raw: Option<&str>) -> Self {
        match raw {
            Some("admin") => Role::Admin,
            _ => Role::Customer,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

/// Look up the stored role for `email`. A missing user is not an admin.
pub async fn resolve(store: &dyn DocumentStore, email: &str) -> anyhow::Result<Role> {
    let role = match repo::find_by_email(store, email).await? {
        Some(user) => user.role(),
        None => Role::Customer,
    };
    debug!(%email, role = role.as_str(), "role resolved");
    Ok(role)
}

pub async fn is_admin(store: &dyn DocumentStore, email: &str) -> anyhow::Result<bool> {
    Ok(resolve(store, email).await? == Role::Admin)
}
