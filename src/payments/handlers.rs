use axum::{
    extract::{Path, State},
    routing::{patch, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{PaymentConfirmation, PaymentIntentRequest, PaymentIntentResponse},
    services,
};
use crate::{
    auth::AuthUser, error::AppError, purchases::repo::Purchase, state::AppState,
};

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/purchase/:id", patch(confirm_payment))
}

#[instrument(skip(state))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Json(body): Json<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, AppError> {
    let client_secret = services::create_intent(
        state.payments.as_ref(),
        body.price,
        &state.config.payments.currency,
    )
    .await?;
    Ok(Json(PaymentIntentResponse { client_secret }))
}

#[instrument(skip(state, body))]
pub async fn confirm_payment(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<PaymentConfirmation>,
) -> Result<Json<Purchase>, AppError> {
    let purchase = services::settle_purchase(state.store.as_ref(), &caller, &id, body).await?;
    Ok(Json(purchase))
}
