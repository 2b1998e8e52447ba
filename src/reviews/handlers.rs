use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use serde_json::Value;
use tracing::{info, instrument};

use crate::{
    auth::AuthUser,
    error::AppError,
    state::AppState,
    store::{Collection, Document, Filter, InsertOutcome, ID_FIELD},
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/review", get(list_reviews))
        .route("/reviews", post(create_review))
}

#[instrument(skip(state))]
pub async fn list_reviews(State(state): State<AppState>) -> Result<Json<Vec<Document>>, AppError> {
    let reviews = state.store.find(Collection::Reviews, Filter::new()).await?;
    Ok(Json(reviews))
}

/// The reviewer is always the verified caller, whatever the body says.
#[instrument(skip(state, review))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(mut review): Json<Document>,
) -> Result<(StatusCode, Json<InsertOutcome>), AppError> {
    review.remove(ID_FIELD);
    review.insert("email".into(), Value::String(caller.email.clone()));
    let inserted_id = state.store.insert(Collection::Reviews, review).await?;
    info!(by = %caller.email, %inserted_id, "review created");
    Ok((StatusCode::CREATED, Json(InsertOutcome { inserted_id })))
}
