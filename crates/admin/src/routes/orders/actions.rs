//! Order lifecycle actions.
//!
//! Each action loads the order, asks the state machine whether the move is
//! allowed, then writes it with a compare-and-set on the statuses it read.
//! A concurrent change surfaces as 409 rather than a lost update.

use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::{info, instrument};

use moonlit_core::{DeliveryStatus, PaymentStatus};

use super::{load_order, order_path};
use crate::db::{AdminOrderRepository, DeliveryUpdate};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::routes::non_empty;
use crate::services::notify;
use crate::state::AppState;

const MAX_REFERENCE_LEN: usize = 64;
const MAX_REASON_LEN: usize = 500;
const MAX_TRACKING_LEN: usize = 100;
const MAX_NOTE_LEN: usize = 500;

/// Verify payment form input.
#[derive(Debug, Deserialize)]
pub struct VerifyFormInput {
    pub transaction_ref: Option<String>,
}

/// Reject payment form input.
#[derive(Debug, Deserialize)]
pub struct RejectFormInput {
    pub reason: Option<String>,
}

/// Delivery update form input.
#[derive(Debug, Deserialize)]
pub struct DeliveryFormInput {
    pub status: String,
    pub tracking_id: Option<String>,
    pub courier: Option<String>,
    pub note: Option<String>,
}

fn bounded(value: Option<String>, max: usize, field: &str) -> Result<Option<String>> {
    match non_empty(value) {
        Some(v) if v.chars().count() > max => Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        ))),
        other => Ok(other),
    }
}

impl DeliveryFormInput {
    /// Parse and bound the submitted fields.
    fn into_update(self) -> Result<DeliveryUpdate> {
        let status: DeliveryStatus = self
            .status
            .trim()
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Unknown delivery status: {}", self.status)))?;

        Ok(DeliveryUpdate {
            status,
            tracking_id: bounded(self.tracking_id, MAX_TRACKING_LEN, "Tracking ID")?,
            courier: bounded(self.courier, MAX_TRACKING_LEN, "Courier")?,
            note: bounded(self.note, MAX_NOTE_LEN, "Note")?,
        })
    }
}

/// Mark a manual payment as completed.
///
/// # Route
///
/// `POST /orders/{id}/payment/verify`
///
/// # Errors
///
/// Returns 409 if the payment cannot be verified in the order's current
/// state or the order changed concurrently.
#[instrument(skip(admin, state, input), fields(actor = %admin.id))]
pub async fn verify_payment(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(input): Form<VerifyFormInput>,
) -> Result<Redirect> {
    let transaction_ref = bounded(input.transaction_ref, MAX_REFERENCE_LEN, "Transaction reference")?;

    let repo = AdminOrderRepository::new(state.pool());
    let order = load_order(&repo, id).await?;
    order.state().check_payment(PaymentStatus::Completed)?;

    let updated = repo
        .set_payment(
            &order,
            PaymentStatus::Completed,
            &admin.id,
            transaction_ref.as_deref(),
            None,
        )
        .await?;

    info!(order_number = %updated.order_number, "Payment verified");
    notify::payment_verified(state.notifier(), &updated, transaction_ref.as_deref(), &admin);

    Ok(Redirect::to(&order_path(&updated)))
}

/// Mark a payment as failed, with a reason.
///
/// # Route
///
/// `POST /orders/{id}/payment/reject`
///
/// # Errors
///
/// Returns `AppError::BadRequest` without a reason, and 409 if the order
/// has shipped or changed concurrently.
#[instrument(skip(admin, state, input), fields(actor = %admin.id))]
pub async fn reject_payment(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(input): Form<RejectFormInput>,
) -> Result<Redirect> {
    let reason = bounded(input.reason, MAX_REASON_LEN, "Reason")?
        .ok_or_else(|| AppError::BadRequest("A rejection reason is required".to_string()))?;

    let repo = AdminOrderRepository::new(state.pool());
    let order = load_order(&repo, id).await?;
    order.state().check_payment(PaymentStatus::Failed)?;

    let updated = repo
        .set_payment(&order, PaymentStatus::Failed, &admin.id, None, Some(&reason))
        .await?;

    info!(order_number = %updated.order_number, "Payment rejected");
    notify::payment_rejected(state.notifier(), &updated, &admin, &reason);

    Ok(Redirect::to(&order_path(&updated)))
}

/// Move the delivery status forward.
///
/// Delivering a cash-on-delivery order also completes its payment.
///
/// # Route
///
/// `POST /orders/{id}/delivery`
///
/// # Errors
///
/// Returns `AppError::BadRequest` for malformed input and 409 when the
/// transition is not allowed.
#[instrument(skip(admin, state, input), fields(actor = %admin.id))]
pub async fn update_delivery(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(input): Form<DeliveryFormInput>,
) -> Result<Redirect> {
    let update = input.into_update()?;

    let repo = AdminOrderRepository::new(state.pool());
    let order = load_order(&repo, id).await?;
    let outcome = order.state().apply_delivery(update.status)?;

    let updated = repo
        .apply_delivery(&order, &outcome, &update, &admin.id)
        .await?;

    info!(
        order_number = %updated.order_number,
        status = %update.status,
        payment_completed = outcome.payment_completed,
        "Delivery updated"
    );
    notify::delivery_updated(
        state.notifier(),
        &updated,
        &update,
        outcome.payment_completed,
        &admin,
    );

    Ok(Redirect::to(&order_path(&updated)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_form_parses_status_and_trims() {
        let input = DeliveryFormInput {
            status: " shipped ".to_string(),
            tracking_id: Some(" DTDC123 ".to_string()),
            courier: Some(String::new()),
            note: None,
        };
        let update = input.into_update().unwrap();
        assert_eq!(update.status, DeliveryStatus::Shipped);
        assert_eq!(update.tracking_id.as_deref(), Some("DTDC123"));
        assert!(update.courier.is_none());
        assert!(update.note.is_none());
    }

    #[test]
    fn test_delivery_form_rejects_unknown_status() {
        let input = DeliveryFormInput {
            status: "lost".to_string(),
            tracking_id: None,
            courier: None,
            note: None,
        };
        assert!(matches!(input.into_update(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_bounded_rejects_long_values() {
        let long = "x".repeat(MAX_REFERENCE_LEN + 1);
        assert!(bounded(Some(long), MAX_REFERENCE_LEN, "Ref").is_err());
        let ok = "x".repeat(MAX_REFERENCE_LEN);
        assert_eq!(
            bounded(Some(ok.clone()), MAX_REFERENCE_LEN, "Ref").unwrap(),
            Some(ok)
        );
    }
}
