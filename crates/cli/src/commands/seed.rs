//! Seed the shop catalog with sample data.
//!
//! The default data set is `data/catalog.yaml`, compiled into the binary.
//! Pass `--file` to load another file with the same shape. Seeding is skipped
//! entirely when any product already exists.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use moonlit_core::{CategoryId, Slug};

use super::{CommandError, connect};

const DEFAULT_CATALOG: &str = include_str!("../../data/catalog.yaml");

/// A catalog seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    pub price: Decimal,
    /// Slug of the product's category.
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Errors from seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Could not read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid seed data: {0}")]
    Invalid(String),
}

impl CatalogSeed {
    /// Parse and check a seed document.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Yaml` for malformed YAML and `SeedError::Invalid`
    /// for unusable names, negative prices, or unknown category slugs.
    pub fn parse(content: &str) -> Result<Self, SeedError> {
        let seed: Self = serde_yaml::from_str(content)?;
        seed.validate()?;
        Ok(seed)
    }

    fn category_slugs(&self) -> Result<Vec<Slug>, SeedError> {
        self.categories
            .iter()
            .map(|c| {
                Slug::from_name(&c.name).ok_or_else(|| {
                    SeedError::Invalid(format!("category name has no letters: {:?}", c.name))
                })
            })
            .collect()
    }

    fn validate(&self) -> Result<(), SeedError> {
        let slugs = self.category_slugs()?;

        for product in &self.products {
            if product.name.trim().is_empty() {
                return Err(SeedError::Invalid("product with an empty name".into()));
            }
            if product.price.is_sign_negative() {
                return Err(SeedError::Invalid(format!(
                    "{} has a negative price",
                    product.name
                )));
            }
            if let Some(slug) = product
                .category
                .as_ref()
                .filter(|slug| !slugs.iter().any(|s| s.as_str() == slug.as_str()))
            {
                return Err(SeedError::Invalid(format!(
                    "{} refers to unknown category {slug}",
                    product.name
                )));
            }
        }
        Ok(())
    }
}

/// What a seed run inserted.
#[derive(Debug, Default)]
pub struct SeedReport {
    pub categories: usize,
    pub products: usize,
}

/// Seed the catalog from `file`, or from the built-in sample catalog.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the
/// database work fails. Nothing is written on failure.
pub async fn catalog(file: Option<&Path>) -> Result<SeedReport, SeedError> {
    let seed = match file {
        Some(path) => {
            info!(path = %path.display(), "Loading catalog seed");
            CatalogSeed::parse(&tokio::fs::read_to_string(path).await?)?
        }
        None => CatalogSeed::parse(DEFAULT_CATALOG)?,
    };

    let pool = connect("STOREFRONT_DATABASE_URL").await?;
    let mut tx = pool.begin().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.products")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        warn!(existing, "Products already exist; skipping seed");
        return Ok(SeedReport::default());
    }

    let mut ids: HashMap<String, CategoryId> = HashMap::new();
    for (category, slug) in seed.categories.iter().zip(seed.category_slugs()?) {
        let id: CategoryId = sqlx::query_scalar(
            r"
            INSERT INTO shop.categories (slug, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(slug.as_str())
        .bind(category.name.trim())
        .bind(category.description.as_deref())
        .fetch_one(&mut *tx)
        .await?;
        ids.insert(slug.into_inner(), id);
    }

    for product in &seed.products {
        let category_id = product.category.as_ref().and_then(|s| ids.get(s)).copied();
        sqlx::query(
            r"
            INSERT INTO shop.products (category_id, name, description, price, image_url)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(category_id)
        .bind(product.name.trim())
        .bind(product.description.as_deref())
        .bind(product.price)
        .bind(product.image_url.as_deref())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let report = SeedReport {
        categories: ids.len(),
        products: seed.products.len(),
    };
    info!(
        categories = report.categories,
        products = report.products,
        "Catalog seeded"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let seed = CatalogSeed::parse(DEFAULT_CATALOG).unwrap();
        let slugs: Vec<String> = seed
            .category_slugs()
            .unwrap()
            .into_iter()
            .map(Slug::into_inner)
            .collect();
        assert_eq!(slugs, ["dress", "wedding", "couple", "fantasy"]);
        assert_eq!(seed.products.len(), 6);
        assert_eq!(seed.products.first().unwrap().price, Decimal::new(29999, 2));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let yaml = r#"
categories:
  - name: Dress
products:
  - name: Cape
    price: "10"
    category: capes
"#;
        assert!(matches!(
            CatalogSeed::parse(yaml),
            Err(SeedError::Invalid(_))
        ));
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let yaml = r#"
products:
  - name: Cape
    price: "-1"
"#;
        assert!(matches!(
            CatalogSeed::parse(yaml),
            Err(SeedError::Invalid(_))
        ));
    }
}
