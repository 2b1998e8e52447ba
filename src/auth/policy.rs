//! Route access policy.
//!
//! Every route is tagged with one [`Access`] level in [`ROUTE_POLICIES`] and
//! the [`enforce`] middleware evaluates that tag before the handler runs.
//! Ownership is a verbatim string comparison between the verified email and
//! the email the request names: `Bob@x.com` and `bob@x.com` are different
//! owners.

use axum::{
    extract::{FromRef, MatchedPath, Query, Request, State},
    http::{Method, Uri},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{
    claims::Claims,
    extractors::{authenticate, AuthUser},
    jwt::JwtKeys,
    role,
};
use crate::{error::AppError, state::AppState, store::DocumentStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No credential needed.
    Public,
    /// Any verified identity.
    Authenticated,
    /// Caller must own the named resource or be an admin.
    SelfOrAdmin,
    AdminOnly,
}

#[derive(Debug)]
pub struct RoutePolicy {
    pub method: &'static str,
    pub path: &'static str,
    pub access: Access,
}

const fn rule(method: &'static str, path: &'static str, access: Access) -> RoutePolicy {
    RoutePolicy {
        method,
        path,
        access,
    }
}

pub static ROUTE_POLICIES: &[RoutePolicy] = &[
    rule("GET", "/", Access::Public),
    rule("GET", "/health", Access::Public),
    // parts
    rule("GET", "/parts", Access::Public),
    rule("POST", "/parts", Access::AdminOnly),
    rule("GET", "/parts/:id", Access::SelfOrAdmin),
    // reviews
    rule("POST", "/reviews", Access::Authenticated),
    rule("GET", "/review", Access::Public),
    // purchases
    rule("POST", "/purchase", Access::Authenticated),
    rule("GET", "/purchase", Access::AdminOnly),
    rule("GET", "/mypurchse", Access::SelfOrAdmin),
    rule("GET", "/mypurchase", Access::SelfOrAdmin),
    rule("GET", "/purchase/:id", Access::Authenticated),
    rule("DELETE", "/purchase/:id", Access::AdminOnly),
    // payments
    rule("POST", "/create-payment-intent", Access::Authenticated),
    rule("PATCH", "/purchase/:id", Access::Authenticated),
    // users
    rule("GET", "/admin/:email", Access::Public),
    rule("PUT", "/user/:email", Access::Public),
    rule("POST", "/user/:email", Access::Public),
    rule("PUT", "/user/admin/:email", Access::AdminOnly),
    rule("PUT", "/profile", Access::SelfOrAdmin),
    rule("GET", "/user", Access::AdminOnly),
];

/// Access level for a matched route. Unlisted routes are admin-only.
pub fn access_for(method: &Method, path: &str) -> Access {
    ROUTE_POLICIES
        .iter()
        .find(|p| p.method == method.as_str() && p.path == path)
        .map(|p| p.access)
        .unwrap_or(Access::AdminOnly)
}

/// `?email=` on self-or-admin routes. Omitted means the caller's own email.
#[derive(Debug, Default, Deserialize)]
pub struct OwnerQuery {
    pub email: Option<String>,
}

impl OwnerQuery {
    pub fn target<'a>(&'a self, claims: &'a Claims) -> &'a str {
        self.email.as_deref().unwrap_or(&claims.email)
    }
}

/// Allow when `owner` is the caller verbatim, or when the caller is an admin.
pub async fn ensure_owner_or_admin(
    store: &dyn DocumentStore,
    claims: &Claims,
    owner: &str,
) -> Result<(), AppError> {
    if claims.email == owner {
        return Ok(());
    }
    if role::is_admin(store, &claims.email).await? {
        return Ok(());
    }
    warn!(caller = %claims.email, %owner, "ownership check denied");
    Err(AppError::Forbidden)
}

pub async fn authorize(
    store: &dyn DocumentStore,
    access: Access,
    claims: &Claims,
    owner: Option<&str>,
) -> Result<(), AppError> {
    match access {
        Access::Public | Access::Authenticated => Ok(()),
        Access::SelfOrAdmin => {
            ensure_owner_or_admin(store, claims, owner.unwrap_or(&claims.email)).await
        }
        Access::AdminOnly => {
            if role::is_admin(store, &claims.email).await? {
                Ok(())
            } else {
                warn!(caller = %claims.email, "admin route denied");
                Err(AppError::Forbidden)
            }
        }
    }
}

fn requested_owner(uri: &Uri) -> Result<OwnerQuery, AppError> {
    if uri.query().is_none() {
        return Ok(OwnerQuery::default());
    }
    Query::<OwnerQuery>::try_from_uri(uri)
        .map(|Query(q)| q)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// Gate applied to every routed request.
pub async fn enforce(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let access = match req.extensions().get::<MatchedPath>() {
        Some(path) => access_for(req.method(), path.as_str()),
        None => Access::AdminOnly,
    };
    if access == Access::Public {
        return Ok(next.run(req).await);
    }

    let keys = JwtKeys::from_ref(&state);
    let claims = authenticate(&keys, req.headers())?;
    let owner = match access {
        Access::SelfOrAdmin => requested_owner(req.uri())?,
        _ => OwnerQuery::default(),
    };
    authorize(state.store.as_ref(), access, &claims, owner.email.as_deref()).await?;

    debug!(caller = %claims.email, ?access, "request authorized");
    req.extensions_mut().insert(AuthUser(claims));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{filter, Collection, MemoryStore};
    use serde_json::json;
    use std::collections::HashSet;

    fn claims(email: &str) -> Claims {
        Claims {
            email: email.into(),
            iat: 0,
            exp: usize::MAX,
            iss: "t".into(),
            aud: "t".into(),
        }
    }

    async fn store_with_admin() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert(
                Collection::Users,
                filter([("email", json!("root@x.com")), ("role", json!("admin"))]),
            )
            .await
            .unwrap();
        store
    }

    #[test]
    fn table_has_no_duplicate_rules() {
        let mut seen = HashSet::new();
        for p in ROUTE_POLICIES {
            assert!(seen.insert((p.method, p.path)), "duplicate rule {p:?}");
        }
    }

    #[test]
    fn lookup_by_method_and_pattern() {
        assert_eq!(access_for(&Method::GET, "/parts"), Access::Public);
        assert_eq!(access_for(&Method::POST, "/parts"), Access::AdminOnly);
        assert_eq!(access_for(&Method::GET, "/purchase/:id"), Access::Authenticated);
        assert_eq!(access_for(&Method::DELETE, "/purchase/:id"), Access::AdminOnly);
        assert_eq!(access_for(&Method::GET, "/mypurchse"), Access::SelfOrAdmin);
    }

    #[test]
    fn unknown_route_fails_closed() {
        assert_eq!(access_for(&Method::GET, "/secret"), Access::AdminOnly);
        assert_eq!(access_for(&Method::DELETE, "/parts"), Access::AdminOnly);
    }

    #[test]
    fn owner_query_defaults_to_caller() {
        let c = claims("bob@x.com");
        assert_eq!(OwnerQuery::default().target(&c), "bob@x.com");
        let q = OwnerQuery {
            email: Some("eve@x.com".into()),
        };
        assert_eq!(q.target(&c), "eve@x.com");
    }

    #[tokio::test]
    async fn self_or_admin() {
        let store = store_with_admin().await;
        let bob = claims("bob@x.com");
        let root = claims("root@x.com");

        assert!(authorize(&store, Access::SelfOrAdmin, &bob, Some("bob@x.com"))
            .await
            .is_ok());
        assert!(authorize(&store, Access::SelfOrAdmin, &bob, None).await.is_ok());
        assert!(matches!(
            authorize(&store, Access::SelfOrAdmin, &bob, Some("carol@x.com")).await,
            Err(AppError::Forbidden)
        ));
        assert!(authorize(&store, Access::SelfOrAdmin, &root, Some("carol@x.com"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn ownership_is_case_sensitive() {
        let store = MemoryStore::new();
        let bob = claims("bob@x.com");
        assert!(matches!(
            ensure_owner_or_admin(&store, &bob, "Bob@x.com").await,
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn admin_only() {
        let store = store_with_admin().await;
        assert!(authorize(&store, Access::AdminOnly, &claims("root@x.com"), None)
            .await
            .is_ok());
        assert!(matches!(
            authorize(&store, Access::AdminOnly, &claims("bob@x.com"), None).await,
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn authenticated_skips_role_lookup() {
        let store = MemoryStore::new();
        authorize(&store, Access::Authenticated, &claims("bob@x.com"), None)
            .await
            .unwrap();
        assert_eq!(store.op_counts(), (0, 0));
    }
}
