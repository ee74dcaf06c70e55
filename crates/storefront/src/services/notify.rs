//! Audit messages for storefront events.
//!
//! Thin glue between storefront records and the Discord message builders.

use moonlit_core::{Order, OrderItem, PaymentStatus};
use moonlit_discord::{Channel, LineSummary, Notifier, OrderSummary, messages};

use crate::models::CurrentUser;

/// A customer signed in.
pub fn login(notifier: &Notifier, user: &CurrentUser) {
    notifier.notify(
        Channel::Login,
        messages::login_message(user.id.as_str(), &user.username, user.avatar_url.as_deref()),
    );
}

/// A new order was placed. Manual orders also announce the submitted proof.
pub fn order_placed(
    notifier: &Notifier,
    order: &Order,
    items: &[OrderItem],
    track_url: &str,
    transaction_ref: Option<&str>,
) {
    let summary = OrderSummary::from(order);
    let lines: Vec<LineSummary> = items.iter().map(LineSummary::from).collect();

    notifier.notify(
        Channel::Order,
        messages::order_placed_message(&summary, &lines, track_url),
    );

    if order.payment_method == moonlit_core::PaymentMethod::Manual {
        notifier.notify(
            Channel::Payment,
            messages::payment_message(
                &summary,
                PaymentStatus::Pending,
                transaction_ref,
                Some("Proof uploaded, awaiting verification"),
            ),
        );
    }
}
