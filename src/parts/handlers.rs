use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::repo;
use crate::{
    auth::AuthUser,
    error::AppError,
    state::AppState,
    store::{Document, InsertOutcome, ID_FIELD},
};

pub fn part_routes() -> Router<AppState> {
    Router::new()
        .route("/parts", get(list_parts).post(create_part))
        .route("/parts/:id", get(get_part))
}

#[instrument(skip(state))]
pub async fn list_parts(State(state): State<AppState>) -> Result<Json<Vec<Document>>, AppError> {
    Ok(Json(repo::list(state.store.as_ref()).await?))
}

/// Ownership of `?email=` is settled by the gate before this runs.
#[instrument(skip(state))]
pub async fn get_part(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    repo::get(state.store.as_ref(), &id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("part"))
}

#[instrument(skip(state, part))]
pub async fn create_part(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(mut part): Json<Document>,
) -> Result<(StatusCode, Json<InsertOutcome>), AppError> {
    part.remove(ID_FIELD);
    let inserted_id = repo::create(state.store.as_ref(), part).await?;
    info!(by = %caller.email, %inserted_id, "part created");
    Ok((StatusCode::CREATED, Json(InsertOutcome { inserted_id })))
}
