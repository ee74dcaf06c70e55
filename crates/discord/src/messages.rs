//! Embed builders for the audit channels.
//!
//! Each builder returns a ready-to-post [`CreateMessage`] for:
//! - Customer logins
//! - New orders
//! - Payment submissions, verifications, and rejections
//! - Delivery status changes
//! - Admin actions (including refused admin sign-ins)

use moonlit_core::{DeliveryStatus, Order, OrderItem, PaymentMethod, PaymentStatus};

use crate::types::{CreateMessage, Embed};

pub const COLOR_PURPLE: u32 = 0x009b_59b6;
pub const COLOR_BLUE: u32 = 0x0034_98db;
pub const COLOR_GREEN: u32 = 0x002e_cc71;
pub const COLOR_YELLOW: u32 = 0x00f1_c40f;
pub const COLOR_ORANGE: u32 = 0x00f3_9c12;
pub const COLOR_RED: u32 = 0x00e7_4c3c;
pub const COLOR_GREY: u32 = 0x0095_a5a6;

const FOOTER: &str = "Moonlit Promise";

/// Order fields shown in order, payment, and delivery embeds.
#[derive(Debug, Clone)]
pub struct OrderSummary<'a> {
    pub order_number: &'a str,
    pub customer_id: &'a str,
    pub full_name: &'a str,
    pub phone: &'a str,
    /// Formatted total, e.g. `₹299.99`.
    pub total: String,
    pub payment_method: PaymentMethod,
    pub address: &'a str,
    pub pincode: &'a str,
}

/// One ordered product.
#[derive(Debug, Clone)]
pub struct LineSummary {
    pub name: String,
    pub quantity: i32,
    /// Formatted line total.
    pub line_total: String,
}

impl<'a> From<&'a Order> for OrderSummary<'a> {
    fn from(order: &'a Order) -> Self {
        Self {
            order_number: &order.order_number,
            customer_id: order.user_id.as_str(),
            full_name: &order.full_name,
            phone: &order.phone,
            total: order.total().display(),
            payment_method: order.payment_method,
            address: &order.address,
            pincode: &order.pincode,
        }
    }
}

impl From<&OrderItem> for LineSummary {
    fn from(item: &OrderItem) -> Self {
        Self {
            name: item.product_name.clone(),
            quantity: item.quantity,
            line_total: item.line_total().display(),
        }
    }
}

fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

/// A customer signed in.
#[must_use]
pub fn login_message(user_id: &str, username: &str, avatar_url: Option<&str>) -> CreateMessage {
    let mut embed = Embed::new("🌙 New Login", COLOR_PURPLE)
        .description(format!("{} signed in to the shop", mention(user_id)))
        .field("Username", username, true)
        .field("Discord ID", user_id, true)
        .footer(FOOTER);

    if let Some(url) = avatar_url {
        embed = embed.thumbnail(url);
    }

    CreateMessage::embed(embed)
}

/// A new order was placed.
#[must_use]
pub fn order_placed_message(
    order: &OrderSummary<'_>,
    items: &[LineSummary],
    track_url: &str,
) -> CreateMessage {
    let items_list = items
        .iter()
        .map(|item| format!("{} × {} ({})", item.name, item.quantity, item.line_total))
        .collect::<Vec<_>>()
        .join("\n");

    let embed = Embed::new("📦 New Order Placed", COLOR_BLUE)
        .field("Order Number", order.order_number, true)
        .field("Customer", mention(order.customer_id), true)
        .field("Full Name", order.full_name, true)
        .field("Phone", order.phone, true)
        .field("Amount", &order.total, true)
        .field("Payment Method", order.payment_method.label(), true)
        .field(
            "Address",
            format!("{}, {}", order.address, order.pincode),
            false,
        )
        .field("Items", items_list, false)
        .field("Track Order", format!("[Click Here]({track_url})"), true)
        .footer(FOOTER);

    CreateMessage::embed(embed)
}

/// A payment was submitted, verified, or rejected.
///
/// `reference` is the UTR / transaction reference, `note` the rejection
/// reason or proof location.
#[must_use]
pub fn payment_message(
    order: &OrderSummary<'_>,
    status: PaymentStatus,
    reference: Option<&str>,
    note: Option<&str>,
) -> CreateMessage {
    let (title, color) = match status {
        PaymentStatus::Pending => ("💳 Payment Submitted", COLOR_YELLOW),
        PaymentStatus::Completed => ("✅ Payment Verified", COLOR_GREEN),
        PaymentStatus::Failed => ("❌ Payment Rejected", COLOR_RED),
    };

    let mut embed = Embed::new(title, color)
        .field("Order Number", order.order_number, true)
        .field("Customer", mention(order.customer_id), true)
        .field("Amount", &order.total, true)
        .field("Payment Method", order.payment_method.label(), true)
        .field("Status", status.label(), true)
        .field("Transaction Ref", reference.unwrap_or_default(), true)
        .footer(FOOTER);

    if let Some(note) = note {
        embed = embed.field("Note", note, false);
    }

    CreateMessage::embed(embed)
}

/// Title, colour, and emoji for a delivery status.
#[must_use]
pub const fn delivery_style(status: DeliveryStatus) -> (&'static str, u32, &'static str) {
    match status {
        DeliveryStatus::Pending => ("Order Processing", COLOR_GREY, "📋"),
        DeliveryStatus::Shipped => ("Order Shipped", COLOR_BLUE, "📦"),
        DeliveryStatus::OutForDelivery => ("Out for Delivery", COLOR_ORANGE, "🛵"),
        DeliveryStatus::Delivered => ("Order Delivered", COLOR_GREEN, "🎉"),
        DeliveryStatus::Failed => ("Delivery Failed", COLOR_RED, "⚠️"),
    }
}

/// Delivery status changed.
#[must_use]
pub fn delivery_message(
    order: &OrderSummary<'_>,
    status: DeliveryStatus,
    tracking_id: Option<&str>,
    courier: Option<&str>,
    note: Option<&str>,
) -> CreateMessage {
    let (title, color, emoji) = delivery_style(status);

    let mut embed = Embed::new(format!("{emoji} {title}"), color)
        .field("Order Number", order.order_number, true)
        .field("Customer", mention(order.customer_id), true)
        .field("Full Name", order.full_name, true)
        .field("Phone", order.phone, true)
        .field("Delivery Status", status.label(), true)
        .field(
            "Address",
            format!("{}, {}", order.address, order.pincode),
            false,
        )
        .footer(FOOTER);

    if let Some(tracking_id) = tracking_id {
        embed = embed.field("Tracking ID", tracking_id, true);
    }
    if let Some(courier) = courier {
        embed = embed.field("Courier", courier, true);
    }
    if let Some(note) = note {
        embed = embed.field("Note", note, false);
    }

    CreateMessage::embed(embed).with_content(format!(
        "{emoji} **Delivery update for order {}**",
        order.order_number
    ))
}

/// An admin changed something.
#[must_use]
pub fn admin_action_message(
    admin_id: &str,
    action: &str,
    details: &str,
    target_user: Option<&str>,
) -> CreateMessage {
    let mut embed = Embed::new("🔧 Admin Action", COLOR_RED)
        .field("Admin", mention(admin_id), true)
        .field("Action", action, true)
        .field("Details", details, false)
        .footer(FOOTER);

    if let Some(target) = target_user {
        embed = embed.field("Target User", mention(target), true);
    }

    CreateMessage::embed(embed)
}

/// Someone outside the allow-list tried to sign in to the admin panel.
#[must_use]
pub fn admin_denied_message(user_id: &str, username: &str) -> CreateMessage {
    let embed = Embed::new("🚫 Admin Sign-in Refused", COLOR_ORANGE)
        .field("User", mention(user_id), true)
        .field("Username", username, true)
        .field("Discord ID", user_id, true)
        .footer(FOOTER);

    CreateMessage::embed(embed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn order() -> OrderSummary<'static> {
        OrderSummary {
            order_number: "MP-20240115-7K2QZD",
            customer_id: "80351110224678912",
            full_name: "Asha Rao",
            phone: "9876543210",
            total: "₹299.99".to_string(),
            payment_method: PaymentMethod::Cod,
            address: "12 MG Road, Bengaluru",
            pincode: "560001",
        }
    }

    fn field<'a>(message: &'a CreateMessage, name: &str) -> &'a str {
        &message.embeds[0]
            .fields
            .iter()
            .find(|f| f.name == name)
            .unwrap()
            .value
    }

    #[test]
    fn test_order_placed_lists_items_and_track_link() {
        let items = vec![
            LineSummary {
                name: "Midnight Enchantment Gown".into(),
                quantity: 1,
                line_total: "₹299.99".into(),
            },
            LineSummary {
                name: "Starlight Promise Dress".into(),
                quantity: 2,
                line_total: "₹799.98".into(),
            },
        ];
        let message = order_placed_message(&order(), &items, "https://shop.example/track/MP-1");

        assert_eq!(field(&message, "Customer"), "<@80351110224678912>");
        assert_eq!(field(&message, "Address"), "12 MG Road, Bengaluru, 560001");
        assert!(field(&message, "Items").contains("Starlight Promise Dress × 2 (₹799.98)"));
        assert_eq!(
            field(&message, "Track Order"),
            "[Click Here](https://shop.example/track/MP-1)"
        );
    }

    #[test]
    fn test_payment_colors_follow_status() {
        let pending = payment_message(&order(), PaymentStatus::Pending, Some("123456789012"), None);
        assert_eq!(pending.embeds[0].color, Some(COLOR_YELLOW));
        assert_eq!(field(&pending, "Transaction Ref"), "123456789012");

        let rejected = payment_message(&order(), PaymentStatus::Failed, None, Some("blurry"));
        assert_eq!(rejected.embeds[0].color, Some(COLOR_RED));
        assert_eq!(field(&rejected, "Transaction Ref"), "N/A");
        assert_eq!(field(&rejected, "Note"), "blurry");
    }

    #[test]
    fn test_delivery_message_optional_fields() {
        let message = delivery_message(
            &order(),
            DeliveryStatus::Shipped,
            Some("DTDC123"),
            None,
            None,
        );
        assert_eq!(message.embeds[0].title.as_deref(), Some("📦 Order Shipped"));
        assert_eq!(field(&message, "Tracking ID"), "DTDC123");
        assert!(message.embeds[0].fields.iter().all(|f| f.name != "Courier"));
        assert!(message.content.unwrap().contains("MP-20240115-7K2QZD"));
    }

    #[test]
    fn test_admin_action_mentions_target() {
        let message = admin_action_message("1", "Payment Verified", "Order MP-1", Some("2"));
        assert_eq!(field(&message, "Target User"), "<@2>");
    }
}
