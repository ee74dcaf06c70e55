//! Order lifecycle records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lifecycle::OrderState;
use crate::types::{
    DeliveryLogId, DeliveryStatus, DiscordId, OrderId, OrderItemId, PaymentId, PaymentMethod,
    PaymentStatus, Price, ProductId,
};

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: DiscordId,
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub pincode: String,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    pub phone_verified: bool,
    pub tracking_id: Option<String>,
    pub courier: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The lifecycle fields, for validating transitions.
    #[must_use]
    pub const fn state(&self) -> OrderState {
        OrderState {
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            delivery_status: self.delivery_status,
            phone_verified: self.phone_verified,
        }
    }

    #[must_use]
    pub fn total(&self) -> Price {
        Price::inr(self.total_amount)
    }
}

/// A product line frozen at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl OrderItem {
    #[must_use]
    pub fn price(&self) -> Price {
        Price::inr(self.unit_price)
    }

    #[must_use]
    pub fn line_total(&self) -> Price {
        Price::inr(self.unit_price).line_total(self.quantity)
    }
}

/// The payment attached to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub status: PaymentStatus,
    /// Stored file name of the uploaded proof (manual payments).
    pub proof_path: Option<String>,
    /// UPI transaction reference (UTR).
    pub transaction_ref: Option<String>,
    /// Discord ID of the admin who reviewed it, whether they completed or
    /// failed it.
    pub verified_by: Option<String>,
    /// When the review decision was made.
    pub verified_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One entry of an order's delivery history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct DeliveryLog {
    pub id: DeliveryLogId,
    pub order_id: OrderId,
    pub status: DeliveryStatus,
    pub tracking_id: Option<String>,
    pub courier: Option<String>,
    pub note: Option<String>,
    /// `system` or the Discord ID of the admin.
    pub changed_by: String,
    pub created_at: DateTime<Utc>,
}
