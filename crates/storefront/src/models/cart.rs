//! Cart view model.

use rust_decimal::Decimal;
use serde::Serialize;

use moonlit_core::{CartItemId, Price, ProductId};

/// A cart row joined with its (active) product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl CartLine {
    #[must_use]
    pub fn price(&self) -> Price {
        Price::inr(self.unit_price)
    }

    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price().line_total(self.quantity)
    }
}

/// Sum of all line totals.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Price {
    Price::inr(
        lines
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: &str, quantity: i32) -> CartLine {
        CartLine {
            id: CartItemId::new(1),
            product_id: ProductId::new(1),
            name: "Starlight Promise Dress".to_string(),
            image_url: None,
            unit_price: price.parse().unwrap_or_default(),
            quantity,
        }
    }

    #[test]
    fn test_cart_total_sums_lines() {
        let lines = vec![line("299.99", 1), line("399.99", 2)];
        assert_eq!(cart_total(&lines).display(), "₹1099.97");
    }

    #[test]
    fn test_empty_cart_total_is_zero() {
        assert_eq!(cart_total(&[]).plain(), "0.00");
    }
}
