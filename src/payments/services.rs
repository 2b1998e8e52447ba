//! Charge intents and settling a purchase once its charge is confirmed.
//!
//! Settling writes twice: the payment record first, then the purchase flag.
//! The store offers no transaction spanning both, so a failure between them
//! leaves a recorded payment next to an unpaid purchase. The transaction id
//! is the idempotency key for both writes, and replaying the same
//! confirmation finishes the job.

use tracing::{info, warn};

use super::{
    dto::PaymentConfirmation,
    processor::PaymentProcessor,
    repo::{self, PaymentRecord},
};
use crate::{
    auth::{claims::Claims, policy::ensure_owner_or_admin},
    error::AppError,
    purchases::repo::{self as purchases, Purchase},
    store::{DocumentStore, ID_FIELD},
};

/// Largest amount accepted by the processor, in minor units.
const MAX_AMOUNT: i64 = 99_999_999;

/// Convert a price in major units to whole minor units (cents).
pub fn to_minor_units(price: f64) -> Option<i64> {
    if !price.is_finite() || price <= 0.0 {
        return None;
    }
    let cents = (price * 100.0).round();
    if cents < 1.0 || cents > MAX_AMOUNT as f64 {
        return None;
    }
    Some(cents as i64)
}

pub async fn create_intent(
    processor: &dyn PaymentProcessor,
    price: f64,
    currency: &str,
) -> Result<String, AppError> {
    let amount = to_minor_units(price)
        .ok_or_else(|| AppError::BadRequest("price must be a positive amount".into()))?;
    Ok(processor.create_payment_intent(amount, currency).await?)
}

/// Record the payment for `purchase_id` and mark the purchase paid.
pub async fn settle_purchase(
    db: &dyn DocumentStore,
    caller: &Claims,
    purchase_id: &str,
    confirmation: PaymentConfirmation,
) -> Result<Purchase, AppError> {
    let PaymentConfirmation {
        transaction_id,
        mut details,
    } = confirmation;
    if transaction_id.trim().is_empty() {
        return Err(AppError::BadRequest("transactionId is required".into()));
    }

    let mut purchase = purchases::get(db, purchase_id)
        .await?
        .ok_or(AppError::NotFound("purchase"))?;
    ensure_owner_or_admin(db, caller, &purchase.email).await?;

    if purchase.paid {
        if purchase.transaction_id.as_deref() == Some(transaction_id.as_str()) {
            return Ok(purchase);
        }
        warn!(%purchase_id, "purchase already paid with another transaction");
        return Err(AppError::Conflict("purchase is already paid".into()));
    }

    if let Some(existing) = repo::find_by_transaction(db, &transaction_id).await? {
        if existing.purchase_id != purchase.id {
            warn!(%purchase_id, other = %existing.purchase_id, "transaction reused");
            return Err(AppError::Conflict(
                "transaction belongs to another purchase".into(),
            ));
        }
    }

    for key in [ID_FIELD, "email", "purchaseId", "transactionId"] {
        details.remove(key);
    }
    let payment = PaymentRecord {
        transaction_id: transaction_id.clone(),
        purchase_id: purchase.id.clone(),
        email: purchase.email.clone(),
        details,
    };
    repo::record(db, &payment).await?;

    let outcome = purchases::mark_paid(db, &purchase.id, &transaction_id).await?;
    if outcome.matched_count == 0 {
        return Err(AppError::Conflict("purchase is already paid".into()));
    }

    info!(%purchase_id, %transaction_id, by = %caller.email, "purchase paid");
    purchase.paid = true;
    purchase.transaction_id = Some(transaction_id);
    Ok(purchase)
}
