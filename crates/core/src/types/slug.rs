//! URL slugs for categories.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A lowercase, hyphen-separated identifier derived from a display name.
///
/// ```
/// use moonlit_core::Slug;
///
/// assert_eq!(Slug::from_name("Wedding & Bridal").unwrap().as_str(), "wedding-bridal");
/// assert!(Slug::from_name("  !! ").is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a name. Returns `None` if nothing alphanumeric
    /// remains.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let mut slug = String::with_capacity(name.len());
        let mut pending_dash = false;

        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }

        if slug.is_empty() { None } else { Some(Self(slug)) }
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

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Slug::from_name("Dress").unwrap().as_str(), "dress");
        assert_eq!(
            Slug::from_name("  Evening   Gowns 2024 ").unwrap().as_str(),
            "evening-gowns-2024"
        );
        assert_eq!(Slug::from_name("Couple's Sets").unwrap().as_str(), "couple-s-sets");
    }

    #[test]
    fn test_from_name_empty() {
        assert!(Slug::from_name("").is_none());
        assert!(Slug::from_name("---").is_none());
    }
}
