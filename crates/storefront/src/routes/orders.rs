//! Order history, order detail, and public tracking.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use tracing::instrument;

use moonlit_core::{
    DeliveryLog, DeliveryStatus, Order, OrderItem, OrderNumber, Payment, PaymentStatus,
};

use super::Nav;
use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub nav: Nav,
    pub orders: Vec<Order>,
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderTemplate {
    pub nav: Nav,
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<Payment>,
    pub logs: Vec<DeliveryLog>,
}

/// One entry of the public timeline. Carries no notes or actor names.
#[derive(Debug, Clone)]
pub struct TrackingEvent {
    pub status: DeliveryStatus,
    pub tracking_id: Option<String>,
    pub courier: Option<String>,
    pub at: DateTime<Utc>,
}

impl From<DeliveryLog> for TrackingEvent {
    fn from(log: DeliveryLog) -> Self {
        Self {
            status: log.status,
            tracking_id: log.tracking_id,
            courier: log.courier,
            at: log.created_at,
        }
    }
}

/// What anyone holding an order number may see.
#[derive(Debug, Clone)]
pub struct Tracking {
    pub order_number: String,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    pub tracking_id: Option<String>,
    pub courier: Option<String>,
    pub placed_at: DateTime<Utc>,
    pub events: Vec<TrackingEvent>,
}

impl Tracking {
    fn new(order: Order, logs: Vec<DeliveryLog>) -> Self {
        Self {
            order_number: order.order_number,
            payment_status: order.payment_status,
            delivery_status: order.delivery_status,
            tracking_id: order.tracking_id,
            courier: order.courier,
            placed_at: order.created_at,
            events: logs.into_iter().map(TrackingEvent::from).collect(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/track.html")]
pub struct TrackTemplate {
    pub nav: Nav,
    pub tracking: Tracking,
}

fn parse_number(number: &str) -> Result<OrderNumber> {
    OrderNumber::parse(number).map_err(|_| AppError::NotFound("Order not found".into()))
}

/// The signed-in customer's orders.
///
/// # Errors
///
/// Returns an error if the order query fails.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<OrdersTemplate> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(&user.id)
        .await?;

    Ok(OrdersTemplate {
        nav: Nav::load(&state, Some(user)).await,
        orders,
    })
}

/// Order detail for its owner. Anyone else gets 404.
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown or foreign orders.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(number): Path<String>,
) -> Result<OrderTemplate> {
    let number = parse_number(&number)?;
    let repo = OrderRepository::new(state.pool());

    let order = repo
        .get_by_number_for_user(&number, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    let items = repo.items(&order).await?;
    let payment = repo.payment(&order).await?;
    let logs = repo.delivery_logs(&order).await?;

    Ok(OrderTemplate {
        nav: Nav::load(&state, Some(user)).await,
        order,
        items,
        payment,
        logs,
    })
}

/// Public tracking page.
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown order numbers.
#[instrument(skip(state, user))]
pub async fn track(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(number): Path<String>,
) -> Result<TrackTemplate> {
    let number = parse_number(&number)?;
    let repo = OrderRepository::new(state.pool());

    let order = repo
        .get_by_number(&number)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;
    let logs = repo.delivery_logs(&order).await?;

    Ok(TrackTemplate {
        nav: Nav::load(&state, user).await,
        tracking: Tracking::new(order, logs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use moonlit_core::{DeliveryLogId, DiscordId, OrderId, PaymentMethod};
    use rust_decimal::Decimal;

    fn order() -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(7),
            order_number: "MP-20240601-ABC123".into(),
            user_id: DiscordId::parse("123456789012345678").unwrap_or_else(|e| panic!("{e}")),
            full_name: "Asha Rao".into(),
            phone: "9876543210".into(),
            address: "12 MG Road".into(),
            pincode: "560001".into(),
            total_amount: Decimal::new(29999, 2),
            payment_method: PaymentMethod::Cod,
            payment_status: PaymentStatus::Pending,
            delivery_status: DeliveryStatus::Shipped,
            phone_verified: true,
            tracking_id: Some("TRK1".into()),
            courier: Some("Delhivery".into()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_tracking_drops_personal_details() {
        let log = DeliveryLog {
            id: DeliveryLogId::new(1),
            order_id: OrderId::new(7),
            status: DeliveryStatus::Shipped,
            tracking_id: Some("TRK1".into()),
            courier: Some("Delhivery".into()),
            note: Some("Left with neighbour".into()),
            changed_by: "admin".into(),
            created_at: Utc::now(),
        };

        let tracking = Tracking::new(order(), vec![log]);
        let rendered = format!("{tracking:?}");

        assert_eq!(tracking.order_number, "MP-20240601-ABC123");
        assert_eq!(tracking.events.len(), 1);
        for secret in ["Asha", "9876543210", "MG Road", "560001", "neighbour"] {
            assert!(!rendered.contains(secret), "leaked {secret}");
        }
    }

    #[test]
    fn test_bad_order_number_is_not_found() {
        assert!(matches!(parse_number("nope"), Err(AppError::NotFound(_))));
        assert!(parse_number("MP-20240601-ABC123").is_ok());
    }
}
