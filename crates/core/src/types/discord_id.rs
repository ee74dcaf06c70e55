//! Discord user identifiers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a Discord snowflake.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("discord id must be 17-20 digits")]
pub struct DiscordIdError;

/// A Discord user snowflake, kept as a string the way Discord's API sends it.
///
/// Customers and admins are both identified by this value; the admin
/// allow-list is a set of these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct DiscordId(String);

impl DiscordId {
    /// Parse a snowflake.
    ///
    /// # Errors
    ///
    /// Returns [`DiscordIdError`] unless the trimmed input is 17 to 20 ASCII
    /// digits.
    pub fn parse(s: &str) -> Result<Self, DiscordIdError> {
        let s = s.trim();
        if (17..=20).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(s.to_owned()))
        } else {
            Err(DiscordIdError)
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

impl fmt::Display for DiscordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DiscordId {
    type Err = DiscordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for DiscordId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for DiscordId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for DiscordId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_snowflake() {
        let id = DiscordId::parse("80351110224678912").unwrap();
        assert_eq!(id.as_str(), "80351110224678912");
        assert!(DiscordId::parse(" 1234567890123456789 ").is_ok());
    }

    #[test]
    fn test_parse_rejects_non_snowflakes() {
        assert!(DiscordId::parse("").is_err());
        assert!(DiscordId::parse("12345").is_err());
        assert!(DiscordId::parse("8035111022467891a").is_err());
        assert!(DiscordId::parse("123456789012345678901").is_err());
    }
}
