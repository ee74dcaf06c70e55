//! Human-facing order numbers.

use core::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Errors that can occur when building or parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    #[error("order number must look like MP-YYYYMMDD-XXXXXX")]
    Malformed,
    #[error("order number suffix must be {len} uppercase letters or digits")]
    InvalidSuffix { len: usize },
}

/// An order number such as `MP-20240115-7K2QZD`.
///
/// The date segment is the order's creation date. The suffix is six random
/// uppercase alphanumerics, chosen by the caller so this crate stays free
/// of randomness and I/O.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub const PREFIX: &'static str = "MP";
    pub const SUFFIX_LEN: usize = 6;
    /// Alphabet the suffix is drawn from.
    pub const SUFFIX_ALPHABET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    /// Build an order number for `date` with the given random suffix.
    ///
    /// # Errors
    ///
    /// Returns [`OrderNumberError::InvalidSuffix`] if the suffix has the wrong
    /// length or contains characters other than uppercase ASCII letters and
    /// digits.
    pub fn new(date: NaiveDate, suffix: &str) -> Result<Self, OrderNumberError> {
        if !is_valid_suffix(suffix) {
            return Err(OrderNumberError::InvalidSuffix {
                len: Self::SUFFIX_LEN,
            });
        }
        Ok(Self(format!(
            "{}-{}-{suffix}",
            Self::PREFIX,
            date.format("%Y%m%d")
        )))
    }

    /// Parse an order number from user input (URLs, search boxes).
    ///
    /// # Errors
    ///
    /// Returns [`OrderNumberError::Malformed`] if the input does not have the
    /// `MP-YYYYMMDD-XXXXXX` shape.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let s = s.trim().to_ascii_uppercase();
        let mut parts = s.splitn(3, '-');
        let (Some(prefix), Some(date), Some(suffix)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(OrderNumberError::Malformed);
        };

        if prefix != Self::PREFIX
            || NaiveDate::parse_from_str(date, "%Y%m%d").is_err()
            || date.len() != 8
            || !is_valid_suffix(suffix)
        {
            return Err(OrderNumberError::Malformed);
        }

        Ok(Self(s))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn is_valid_suffix(suffix: &str) -> bool {
    suffix.len() == OrderNumber::SUFFIX_LEN
        && suffix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_new_formats_date_and_suffix() {
        let number = OrderNumber::new(date(), "7K2QZD").unwrap();
        assert_eq!(number.as_str(), "MP-20240115-7K2QZD");
    }

    #[test]
    fn test_new_rejects_bad_suffix() {
        assert!(OrderNumber::new(date(), "abc123").is_err());
        assert!(OrderNumber::new(date(), "ABC12").is_err());
    }

    #[test]
    fn test_parse_normalizes_case() {
        let number = OrderNumber::parse(" mp-20240115-7k2qzd ").unwrap();
        assert_eq!(number.as_str(), "MP-20240115-7K2QZD");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in [
            "",
            "MP-20240115",
            "XX-20240115-7K2QZD",
            "MP-20241315-7K2QZD",
            "MP-2024011-7K2QZD",
            "MP-20240115-7K2QZD-1",
        ] {
            assert_eq!(
                OrderNumber::parse(input),
                Err(OrderNumberError::Malformed),
                "{input}"
            );
        }
    }

    #[test]
    fn test_alphabet_is_valid_suffix_material() {
        let suffix: String = OrderNumber::SUFFIX_ALPHABET
            .iter()
            .take(OrderNumber::SUFFIX_LEN)
            .map(|&b| char::from(b))
            .collect();
        assert!(OrderNumber::new(date(), &suffix).is_ok());
    }
}
