//! Cart repository.
//!
//! One row per (customer, product). Quantities are clamped to
//! [`MAX_QUANTITY`]; lines whose product was deactivated are hidden.

use sqlx::PgPool;
use tracing::instrument;

use moonlit_core::{CartItemId, DiscordId, ProductId};

use super::RepositoryError;
use crate::models::CartLine;

/// Most units of one product a cart may hold.
pub const MAX_QUANTITY: i32 = 10;

pub(crate) const CART_LINES: &str = r"
    SELECT ci.id, ci.product_id, p.name, p.image_url, p.price AS unit_price, ci.quantity
    FROM shop.cart_items ci
    JOIN shop.products p ON p.id = ci.product_id
    WHERE ci.user_id = $1 AND p.is_active
    ORDER BY ci.id
";

/// Repository for cart operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The customer's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: &DiscordId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(CART_LINES)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        Ok(lines)
    }

    /// Add one unit of an active product, or bump the existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is unknown or
    /// inactive.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn add(
        &self,
        user_id: &DiscordId,
        product_id: ProductId,
    ) -> Result<CartItemId, RepositoryError> {
        let id: Option<CartItemId> = sqlx::query_scalar(
            r"
            INSERT INTO shop.cart_items (user_id, product_id, quantity)
            SELECT $1, p.id, 1 FROM shop.products p WHERE p.id = $2 AND p.is_active
            ON CONFLICT (user_id, product_id) DO UPDATE
               SET quantity = LEAST(shop.cart_items.quantity + 1, $3)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(MAX_QUANTITY)
        .fetch_optional(self.pool)
        .await?;

        id.ok_or(RepositoryError::NotFound)
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not belong to
    /// the customer.
    pub async fn set_quantity(
        &self,
        user_id: &DiscordId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        if quantity <= 0 {
            return self.remove(user_id, item_id).await;
        }

        let result = sqlx::query(
            "UPDATE shop.cart_items SET quantity = $3 WHERE id = $1 AND user_id = $2",
        )
        .bind(item_id)
        .bind(user_id)
        .bind(quantity.min(MAX_QUANTITY))
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not belong to
    /// the customer.
    pub async fn remove(
        &self,
        user_id: &DiscordId,
        item_id: CartItemId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Total units in the cart, for the header badge.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user_id: &DiscordId) -> Result<i64, RepositoryError> {
        let count: Option<i64> = sqlx::query_scalar(
            r"
            SELECT SUM(ci.quantity)::BIGINT
            FROM shop.cart_items ci
            JOIN shop.products p ON p.id = ci.product_id
            WHERE ci.user_id = $1 AND p.is_active
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count.unwrap_or(0))
    }
}
