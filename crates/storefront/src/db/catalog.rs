//! Catalog queries.
//!
//! The storefront only ever sees active products.

use sqlx::PgPool;

use moonlit_core::{Category, Product, ProductId};

use super::RepositoryError;

/// Product columns joined with the category's slug and name.
pub(crate) const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.category_id, c.slug AS category_slug, c.name AS category_name,
           p.name, p.description, p.price, p.image_url, p.is_active,
           p.created_at, p.updated_at
    FROM shop.products p
    LEFT JOIN shop.categories c ON c.id = p.category_id
";

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, slug, name, description, created_at FROM shop.categories ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Active products, newest first, optionally filtered by category slug.
    ///
    /// An unknown slug yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(
        &self,
        category_slug: Option<&str>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.is_active AND ($1::TEXT IS NULL OR c.slug = $1) \
             ORDER BY p.created_at DESC, p.id DESC"
        ))
        .bind(category_slug)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// The most recently added active products, for the home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.is_active ORDER BY p.created_at DESC, p.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// A single active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.id = $1 AND p.is_active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }
}
