//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Badge class for a payment or delivery status.
///
/// Usage in templates: `<span class="badge {{ order.payment_status|badge }}">`
#[askama::filter_fn]
pub fn badge(value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(badge_class(&value.to_string()))
}

fn badge_class(status: &str) -> &'static str {
    match status {
        "completed" | "delivered" => "badge-success",
        "failed" => "badge-danger",
        "shipped" | "out_for_delivery" => "badge-info",
        _ => "badge-pending",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moonlit_core::{DeliveryStatus, PaymentStatus};

    #[test]
    fn test_badge_class_follows_status_strings() {
        assert_eq!(badge_class(&PaymentStatus::Completed.to_string()), "badge-success");
        assert_eq!(badge_class(&PaymentStatus::Pending.to_string()), "badge-pending");
        assert_eq!(badge_class(&DeliveryStatus::OutForDelivery.to_string()), "badge-info");
        assert_eq!(badge_class(&DeliveryStatus::Failed.to_string()), "badge-danger");
    }
}
