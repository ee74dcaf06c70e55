//! Order detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use moonlit_core::{Customer, DeliveryLog, DeliveryStatus, Order, OrderItem, Payment};

use super::load_order;
use crate::db::{AdminOrderRepository, CustomerRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::AdminUserView;
use crate::state::AppState;

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub customer: Option<Customer>,
    pub payment: Option<Payment>,
    pub logs: Vec<DeliveryLog>,
    /// Delivery statuses the order may move to now.
    pub next_deliveries: Vec<DeliveryStatus>,
    pub can_verify: bool,
    pub can_reject: bool,
    pub is_open: bool,
}

/// Order detail page handler.
///
/// # Route
///
/// `GET /orders/{id}`
///
/// # Errors
///
/// Returns `AppError::NotFound` if the order does not exist.
#[instrument(skip(admin, state), fields(actor = %admin.id))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<OrderShowTemplate> {
    let repo = AdminOrderRepository::new(state.pool());
    let order = load_order(&repo, id).await?;

    let items = repo.items(order.id).await?;
    let payment = repo.payment(order.id).await?;
    let logs = repo.logs(order.id).await?;
    let customer = CustomerRepository::new(state.pool())
        .get(&order.user_id)
        .await?;

    let lifecycle = order.state();

    Ok(OrderShowTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        next_deliveries: lifecycle.allowed_deliveries(),
        can_verify: lifecycle.can_verify_payment(),
        can_reject: lifecycle.can_reject_payment(),
        is_open: lifecycle.is_open(),
        order,
        items,
        customer,
        payment,
        logs,
    })
}
