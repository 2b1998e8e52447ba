use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::{claims::Claims, jwt::JwtKeys};
use crate::error::AppError;

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthenticated)?;

    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
        .ok_or(AppError::Unauthenticated)?;

    if token.is_empty() {
        return Err(AppError::Unauthenticated);
    }
    Ok(token)
}

/// Verify the request credential: 401 when absent, 403 when it does not verify.
pub fn authenticate(keys: &JwtKeys, headers: &HeaderMap) -> Result<Claims, AppError> {
    let token = bearer_token(headers)?;
    keys.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::Forbidden
    })
}

/// Identity verified by the policy gate for this request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing;
    use axum::extract::FromRef;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn missing_or_malformed_header_is_unauthenticated() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            bearer_token(&headers("Basic abc")),
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            bearer_token(&headers("Bearer ")),
            Err(AppError::Unauthenticated)
        ));
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn bad_token_is_forbidden() {
        let (state, _) = testing::fake();
        let keys = JwtKeys::from_ref(&state);
        assert!(matches!(
            authenticate(&keys, &headers("Bearer abc.def.ghi")),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn good_token_yields_claims() {
        let (state, _) = testing::fake();
        let keys = JwtKeys::from_ref(&state);
        let h = headers(&testing::bearer(&state, "carol@x.com"));
        assert_eq!(authenticate(&keys, &h).unwrap().email, "carol@x.com");
    }
}
