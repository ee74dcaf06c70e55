//! Customer repository.
//!
//! Customers are keyed by Discord ID and created on first sign-in.

use sqlx::PgPool;

use moonlit_core::{Customer, DiscordId};

use super::RepositoryError;

const CUSTOMER_COLUMNS: &str = "id, username, avatar_url, full_name, phone, address, pincode, \
     created_at, last_login_at";

/// Repository for customer database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert the customer on first sign-in, or refresh their Discord profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_from_discord(
        &self,
        id: &DiscordId,
        username: &str,
        avatar_url: Option<&str>,
    ) -> Result<Customer, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r"
            INSERT INTO shop.users (id, username, avatar_url)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
               SET username = EXCLUDED.username,
                   avatar_url = EXCLUDED.avatar_url,
                   last_login_at = NOW()
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(username)
        .bind(avatar_url)
        .fetch_one(self.pool)
        .await?;

        Ok(customer)
    }

    /// Get a customer by Discord ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: &DiscordId) -> Result<Option<Customer>, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM shop.users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(customer)
    }
}
