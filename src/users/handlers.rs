use axum::{
    extract::{FromRef, Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::{
    dto::{AdminStatus, UpdateResponse, UpsertUserResponse},
    repo::{self, User},
};
use crate::{
    auth::{jwt::JwtKeys, role, role::Role, AuthUser, OwnerQuery},
    error::AppError,
    state::AppState,
    store::Document,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(list_users))
        .route("/user/:email", put(upsert_user).post(upsert_user))
        .route("/user/admin/:email", put(make_admin))
        .route("/admin/:email", get(admin_status))
        .route("/profile", put(update_profile))
}

/// Login/register: upsert the profile and hand back a fresh token.
#[instrument(skip(state, body))]
pub async fn upsert_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(body): Json<Document>,
) -> Result<Json<UpsertUserResponse>, AppError> {
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::BadRequest("Invalid email".into()));
    }

    let result = repo::upsert_profile(state.store.as_ref(), &email, body).await?;
    let token = JwtKeys::from_ref(&state).sign(&email)?;

    info!(%email, created = result.upserted_id.is_some(), "user signed in");
    Ok(Json(UpsertUserResponse { result, token }))
}

#[instrument(skip(state))]
pub async fn admin_status(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<AdminStatus>, AppError> {
    let admin = role::is_admin(state.store.as_ref(), &email).await?;
    Ok(Json(AdminStatus { admin }))
}

#[instrument(skip(state))]
pub async fn make_admin(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(email): Path<String>,
) -> Result<Json<UpdateResponse>, AppError> {
    let result = repo::set_role(state.store.as_ref(), &email, Role::Admin).await?;
    if result.matched_count == 0 {
        return Err(AppError::NotFound("user"));
    }
    info!(by = %caller.email, %email, "user promoted to admin");
    Ok(Json(UpdateResponse { result }))
}

#[instrument(skip(state, body))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Query(owner): Query<OwnerQuery>,
    Json(body): Json<Document>,
) -> Result<Json<UpdateResponse>, AppError> {
    let target = owner.target(&caller);
    let result = repo::upsert_profile(state.store.as_ref(), target, body).await?;
    info!(by = %caller.email, email = %target, "profile updated");
    Ok(Json(UpdateResponse { result }))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(repo::list(state.store.as_ref()).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("alice@x.com"));
        assert!(is_valid_email("Alice.Smith@Example.co.uk"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@x"));
        assert!(!is_valid_email("al ice@x.com"));
    }
}
