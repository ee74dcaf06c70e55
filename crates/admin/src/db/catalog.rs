//! Product and category management.
//!
//! Unlike the storefront, the panel sees inactive products too. Deleting a
//! product clears it from carts and unlinks it from order items, whose
//! name and price snapshots stay intact.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};

use moonlit_core::{Category, CategoryId, Product, ProductId, Slug};

use super::RepositoryError;

/// Product columns joined with the category's slug and name.
const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.category_id, c.slug AS category_slug, c.name AS category_name,
           p.name, p.description, p.price, p.image_url, p.is_active,
           p.created_at, p.updated_at
    FROM shop.products p
    LEFT JOIN shop.categories c ON c.id = p.category_id
";

const CATEGORY_COLUMNS: &str = "id, slug, name, description, created_at";

const UNKNOWN_CATEGORY: &str = "the selected category no longer exists";

const DUPLICATE_CATEGORY: &str = "a category with this name already exists";

/// Validated product fields from the product form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub is_active: bool,
}

/// Validated category fields from the category form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInput {
    pub slug: Slug,
    pub name: String,
    pub description: Option<String>,
}

/// Repository for catalog management.
pub struct AdminCatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminCatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} ORDER BY p.created_at DESC, p.id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// A product, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(product)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category vanished.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO shop.products (category_id, name, description, price, image_url, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(input.category_id)
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.image_url.as_deref())
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, UNKNOWN_CATEGORY))?;

        info!(product_id = %id, "Product created");
        self.product(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown id and
    /// `RepositoryError::Conflict` if the category vanished.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.products
               SET category_id = $2, name = $3, description = $4, price = $5,
                   image_url = $6, is_active = $7, updated_at = NOW()
             WHERE id = $1
            ",
        )
        .bind(id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.image_url.as_deref())
        .bind(input.is_active)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, UNKNOWN_CATEGORY))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        info!("Product updated");
        self.product(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Returns the deleted product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let product = self.product(id).await?.ok_or(RepositoryError::NotFound)?;

        let result = sqlx::query("DELETE FROM shop.products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        info!(name = %product.name, "Product deleted");
        Ok(product)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All categories, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.categories ORDER BY name"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create_category(
        &self,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            r"
            INSERT INTO shop.categories (slug, name, description)
            VALUES ($1, $2, $3)
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(input.slug.as_str())
        .bind(&input.name)
        .bind(input.description.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, DUPLICATE_CATEGORY))?;

        info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    /// Rename or re-describe a category. The slug follows the name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown id and
    /// `RepositoryError::Conflict` if the new slug is taken.
    #[instrument(skip(self, input), fields(category_id = %id, slug = %input.slug))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            r"
            UPDATE shop.categories SET slug = $2, name = $3, description = $4
             WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(id)
        .bind(input.slug.as_str())
        .bind(&input.name)
        .bind(input.description.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, DUPLICATE_CATEGORY))?
        .ok_or(RepositoryError::NotFound)?;

        info!("Category updated");
        Ok(category)
    }

    /// Delete a category. Its products become uncategorised.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown id.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "DELETE FROM shop.categories WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        info!(slug = %category.slug, "Category deleted");
        Ok(category)
    }
}
