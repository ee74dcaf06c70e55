//! Customer contact details: phone numbers and postal codes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`] or [`Pincode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// The phone number is not a 10-digit Indian mobile number.
    #[error("phone number must be a 10-digit mobile number starting with 6-9")]
    InvalidPhone,
    /// The pincode is not a 6-digit postal code.
    #[error("pincode must be 6 digits and cannot start with 0")]
    InvalidPincode,
}

/// An Indian mobile phone number, normalized to its 10 national digits.
///
/// Whitespace and a leading `+91` or `0` are stripped before validation.
///
/// ```
/// use moonlit_core::Phone;
///
/// assert_eq!(Phone::parse("+91 98765 43210").unwrap().as_str(), "9876543210");
/// assert!(Phone::parse("1234567890").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::InvalidPhone`] unless the stripped input is
    /// exactly ten digits with the first in `6..=9`.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let national = compact
            .strip_prefix("+91")
            .or_else(|| compact.strip_prefix('0'))
            .unwrap_or(&compact);

        let valid = national.len() == 10
            && national.chars().all(|c| c.is_ascii_digit())
            && national.starts_with(['6', '7', '8', '9']);
        if !valid {
            return Err(ContactError::InvalidPhone);
        }

        Ok(Self(national.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// The number with all but the last four digits hidden, for public pages
    /// and logs.
    #[must_use]
    pub fn masked(&self) -> String {
        let tail = self.0.get(6..).unwrap_or_default();
        format!("******{tail}")
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A 6-digit Indian postal code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Pincode(String);

impl Pincode {
    /// Parse a pincode, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::InvalidPincode`] for anything other than six
    /// digits not starting with `0`.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.len() == 6 && s.chars().all(|c| c.is_ascii_digit()) && !s.starts_with('0') {
            Ok(Self(s.to_owned()))
        } else {
            Err(ContactError::InvalidPincode)
        }
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

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_phones() {
        assert_eq!(Phone::parse("9876543210").unwrap().as_str(), "9876543210");
        assert_eq!(Phone::parse("6000000000").unwrap().as_str(), "6000000000");
        assert_eq!(
            Phone::parse("+91 98765 43210").unwrap().as_str(),
            "9876543210"
        );
        assert_eq!(Phone::parse("+919876543210").unwrap().as_str(), "9876543210");
        assert_eq!(Phone::parse(" 09876543210 ").unwrap().as_str(), "9876543210");
    }

    #[test]
    fn test_parse_invalid_phones() {
        for input in [
            "",
            "5876543210",
            "98765",
            "98765432100",
            "98765abcde",
            "+1 555 0100",
            "919876543210",
            "98765-43210",
            "(987) 654 3210",
        ] {
            assert_eq!(
                Phone::parse(input),
                Err(ContactError::InvalidPhone),
                "{input}"
            );
        }
    }

    #[test]
    fn test_masked_phone() {
        assert_eq!(Phone::parse("9876543210").unwrap().masked(), "******3210");
    }

    #[test]
    fn test_pincode() {
        assert_eq!(Pincode::parse(" 560001 ").unwrap().as_str(), "560001");
        assert!(Pincode::parse("060001").is_err());
        assert!(Pincode::parse("56001").is_err());
        assert!(Pincode::parse("56000a").is_err());
    }
}
