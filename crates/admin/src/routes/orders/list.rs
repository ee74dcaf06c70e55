//! Order list with status filters.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use moonlit_core::{DeliveryStatus, Order, PaymentStatus};

use crate::db::AdminOrderRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::{AdminUserView, non_empty};
use crate::state::AppState;

/// Query parameters for the order list.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub payment: Option<String>,
    pub delivery: Option<String>,
}

/// A choice in a status filter select.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Order list page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub orders: Vec<Order>,
    pub payment_options: Vec<StatusOption>,
    pub delivery_options: Vec<StatusOption>,
    pub filtered: bool,
}

fn parse_filter<S: std::str::FromStr>(value: Option<String>, what: &str) -> Result<Option<S>> {
    non_empty(value)
        .map(|v| {
            v.parse::<S>()
                .map_err(|_| AppError::BadRequest(format!("Unknown {what} status: {v}")))
        })
        .transpose()
}

/// Order list page handler.
///
/// # Route
///
/// `GET /orders?payment=&delivery=`
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an unknown status filter.
#[instrument(skip(admin, state), fields(actor = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<OrdersIndexTemplate> {
    let payment: Option<PaymentStatus> = parse_filter(query.payment, "payment")?;
    let delivery: Option<DeliveryStatus> = parse_filter(query.delivery, "delivery")?;

    let orders = AdminOrderRepository::new(state.pool())
        .list(payment, delivery)
        .await?;

    let payment_options = PaymentStatus::ALL
        .iter()
        .map(|s| StatusOption {
            value: s.as_str(),
            label: s.label(),
            selected: payment == Some(*s),
        })
        .collect();
    let delivery_options = DeliveryStatus::ALL
        .iter()
        .map(|s| StatusOption {
            value: s.as_str(),
            label: s.label(),
            selected: delivery == Some(*s),
        })
        .collect();

    Ok(OrdersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        orders,
        payment_options,
        delivery_options,
        filtered: payment.is_some() || delivery.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_blank_is_none() {
        let parsed: Option<PaymentStatus> = parse_filter(Some("  ".into()), "payment").unwrap();
        assert!(parsed.is_none());
        let parsed: Option<PaymentStatus> = parse_filter(None, "payment").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_parse_filter_known_status() {
        let parsed: Option<DeliveryStatus> =
            parse_filter(Some("out_for_delivery".into()), "delivery").unwrap();
        assert_eq!(parsed, Some(DeliveryStatus::OutForDelivery));
    }

    #[test]
    fn test_parse_filter_unknown_status() {
        let parsed: Result<Option<PaymentStatus>> = parse_filter(Some("refunded".into()), "payment");
        assert!(matches!(parsed, Err(AppError::BadRequest(_))));
    }
}
