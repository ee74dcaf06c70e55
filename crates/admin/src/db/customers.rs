//! Customer queries.

use sqlx::PgPool;

use moonlit_core::{Customer, DiscordId};

use super::RepositoryError;

const CUSTOMER_COLUMNS: &str = "u.id, u.username, u.avatar_url, u.full_name, u.phone, \
     u.address, u.pincode, u.created_at, u.last_login_at";

/// A customer with the number of orders they placed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerSummary {
    #[sqlx(flatten)]
    pub customer: Customer,
    pub order_count: i64,
}

/// Repository for customer reads.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every customer with their order count, most recently seen first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<CustomerSummary>, RepositoryError> {
        let customers = sqlx::query_as::<_, CustomerSummary>(&format!(
            r"
            SELECT {CUSTOMER_COLUMNS}, COUNT(o.id) AS order_count
            FROM shop.users u
            LEFT JOIN shop.orders o ON o.user_id = u.id
            GROUP BY u.id
            ORDER BY u.last_login_at DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(customers)
    }

    /// A single customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: &DiscordId) -> Result<Option<Customer>, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM shop.users u WHERE u.id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(customer)
    }
}
