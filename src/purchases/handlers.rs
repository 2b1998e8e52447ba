use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::DeletedResponse,
    repo::{self, Purchase},
};
use crate::{
    auth::{policy::ensure_owner_or_admin, AuthUser, OwnerQuery},
    error::AppError,
    state::AppState,
    store::{Document, InsertOutcome},
};

pub fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/purchase", get(list_purchases).post(create_purchase))
        .route("/purchase/:id", get(get_purchase).delete(delete_purchases))
        // Historical spelling kept for existing clients.
        .route("/mypurchse", get(my_purchases))
        .route("/mypurchase", get(my_purchases))
}

#[instrument(skip(state, body))]
pub async fn create_purchase(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(body): Json<Document>,
) -> Result<(StatusCode, Json<InsertOutcome>), AppError> {
    let inserted_id = repo::create(state.store.as_ref(), &caller.email, body).await?;
    info!(owner = %caller.email, %inserted_id, "purchase created");
    Ok((StatusCode::CREATED, Json(InsertOutcome { inserted_id })))
}

#[instrument(skip(state))]
pub async fn list_purchases(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
) -> Result<Json<Vec<Purchase>>, AppError> {
    Ok(Json(repo::list_all(state.store.as_ref()).await?))
}

#[instrument(skip(state))]
pub async fn my_purchases(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<Vec<Purchase>>, AppError> {
    let purchases = repo::list_by_owner(state.store.as_ref(), owner.target(&caller)).await?;
    Ok(Json(purchases))
}

#[instrument(skip(state))]
pub async fn get_purchase(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Purchase>, AppError> {
    let purchase = repo::get(state.store.as_ref(), &id)
        .await?
        .ok_or(AppError::NotFound("purchase"))?;
    ensure_owner_or_admin(state.store.as_ref(), &caller, &purchase.email).await?;
    Ok(Json(purchase))
}

/// `DELETE /purchase/:id` where the segment is the owner's email.
#[instrument(skip(state))]
pub async fn delete_purchases(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(email): Path<String>,
) -> Result<Json<DeletedResponse>, AppError> {
    let deleted_count = repo::delete_by_owner(state.store.as_ref(), &email).await?;
    info!(by = %caller.email, owner = %email, deleted_count, "purchases deleted");
    Ok(Json(DeletedResponse { deleted_count }))
}
