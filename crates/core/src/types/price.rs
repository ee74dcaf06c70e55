//! Prices and money formatting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
///
/// Amounts are stored in the currency's standard unit (rupees, not paise)
/// and always rendered with two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the default shop currency.
    #[must_use]
    pub fn inr(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::INR)
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn line_total(&self, quantity: i32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Format for display, e.g. `₹299.99`.
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "{}{:.2}",
            self.currency_code.symbol(),
            self.amount.round_dp(2)
        )
    }

    /// Amount formatted without a symbol, as used in payment links.
    #[must_use]
    pub fn plain(&self) -> String {
        format!("{:.2}", self.amount.round_dp(2))
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_display_pads_to_two_places() {
        assert_eq!(Price::inr(Decimal::new(2999, 1)).display(), "₹299.90");
        assert_eq!(Price::inr(Decimal::from(450)).display(), "₹450.00");
    }

    #[test]
    fn test_line_total() {
        let price = Price::inr(Decimal::new(29999, 2));
        assert_eq!(price.line_total(3).amount, Decimal::new(89997, 2));
    }

    #[test]
    fn test_plain_has_no_symbol() {
        assert_eq!(Price::inr(Decimal::new(59999, 2)).plain(), "599.99");
    }

    #[test]
    fn test_default_currency_is_inr() {
        assert_eq!(CurrencyCode::default(), CurrencyCode::INR);
        assert_eq!(CurrencyCode::INR.code(), "INR");
    }
}
