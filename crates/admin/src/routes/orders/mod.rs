//! Order management route handlers.
//!
//! This module contains handlers for the order list, the order detail view,
//! and the lifecycle actions (verify or reject a payment, move delivery).

mod actions;
mod detail;
mod list;

use crate::db::AdminOrderRepository;
use crate::error::{AppError, Result};
use moonlit_core::{Order, OrderId};

pub use actions::{
    DeliveryFormInput, RejectFormInput, VerifyFormInput, reject_payment, update_delivery,
    verify_payment,
};
pub use detail::{OrderShowTemplate, show};
pub use list::{OrdersIndexTemplate, OrdersQuery, StatusOption, index};

/// Load an order or fail with 404.
async fn load_order(repo: &AdminOrderRepository<'_>, id: i32) -> Result<Order> {
    repo.get(OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id} not found")))
}

fn order_path(order: &Order) -> String {
    format!("/orders/{}", order.id)
}
