//! Audit messages for admin events.
//!
//! Every lifecycle change goes to its own channel (payment or delivery) and
//! is echoed to the admin channel with the acting admin's ID.

use moonlit_core::{Order, PaymentStatus};
use moonlit_discord::{Channel, Notifier, OrderSummary, messages};

use crate::db::DeliveryUpdate;
use crate::models::CurrentAdmin;

/// An admin signed in.
pub fn admin_login(notifier: &Notifier, admin: &CurrentAdmin) {
    notifier.notify(
        Channel::Admin,
        messages::admin_action_message(
            admin.id.as_str(),
            "Sign In",
            &format!("{} signed in to the admin panel", admin.username),
            None,
        ),
    );
}

/// Someone outside the allow-list tried to sign in.
pub fn admin_denied(notifier: &Notifier, user_id: &str, username: &str) {
    notifier.notify(
        Channel::Admin,
        messages::admin_denied_message(user_id, username),
    );
}

/// A manual payment was verified. The customer gets the customer role.
pub fn payment_verified(
    notifier: &Notifier,
    order: &Order,
    transaction_ref: Option<&str>,
    admin: &CurrentAdmin,
) {
    let summary = OrderSummary::from(order);

    notifier.notify(
        Channel::Payment,
        messages::payment_message(&summary, PaymentStatus::Completed, transaction_ref, None),
    );
    notifier.notify(
        Channel::Admin,
        messages::admin_action_message(
            admin.id.as_str(),
            "Verify Payment",
            &format!("Payment verified for order {}", order.order_number),
            Some(order.user_id.as_str()),
        ),
    );
    notifier.grant_customer_role(order.user_id.as_str());
}

/// A payment was rejected.
pub fn payment_rejected(notifier: &Notifier, order: &Order, admin: &CurrentAdmin, reason: &str) {
    let summary = OrderSummary::from(order);

    notifier.notify(
        Channel::Payment,
        messages::payment_message(&summary, PaymentStatus::Failed, None, Some(reason)),
    );
    notifier.notify(
        Channel::Admin,
        messages::admin_action_message(
            admin.id.as_str(),
            "Reject Payment",
            &format!("Payment rejected for order {}: {reason}", order.order_number),
            Some(order.user_id.as_str()),
        ),
    );
}

/// The delivery status changed. `payment_completed` is set when delivering
/// a COD order collected its cash.
pub fn delivery_updated(
    notifier: &Notifier,
    order: &Order,
    update: &DeliveryUpdate,
    payment_completed: bool,
    admin: &CurrentAdmin,
) {
    let summary = OrderSummary::from(order);

    notifier.notify(
        Channel::Delivery,
        messages::delivery_message(
            &summary,
            update.status,
            order.tracking_id.as_deref(),
            order.courier.as_deref(),
            update.note.as_deref(),
        ),
    );
    notifier.notify(
        Channel::Admin,
        messages::admin_action_message(
            admin.id.as_str(),
            "Update Delivery",
            &format!(
                "Order {} marked {}",
                order.order_number,
                update.status.label()
            ),
            Some(order.user_id.as_str()),
        ),
    );

    if payment_completed {
        notifier.notify(
            Channel::Payment,
            messages::payment_message(
                &summary,
                PaymentStatus::Completed,
                None,
                Some("Cash collected on delivery"),
            ),
        );
        notifier.grant_customer_role(order.user_id.as_str());
    }
}

/// A catalog change (product or category).
pub fn catalog_changed(notifier: &Notifier, admin: &CurrentAdmin, action: &str, details: &str) {
    notifier.notify(
        Channel::Admin,
        messages::admin_action_message(admin.id.as_str(), action, details, None),
    );
}
