//! Order repository.
//!
//! Orders are created from the customer's cart in a single transaction and
//! are read-only from the storefront afterwards; lifecycle transitions happen
//! in the admin panel.

use chrono::Utc;
use rand::seq::IndexedRandom;
use sqlx::PgPool;
use tracing::{info, instrument};

use moonlit_core::{
    DeliveryLog, DeliveryStatus, DiscordId, Order, OrderItem, OrderNumber, Payment, PaymentMethod,
    Phone, Pincode,
};

use super::RepositoryError;
use super::cart::CART_LINES;
use crate::models::{CartLine, cart_total};

pub(crate) const ORDER_COLUMNS: &str = "id, order_number, user_id, full_name, phone, address, \
     pincode, total_amount, payment_method, payment_status, delivery_status, phone_verified, \
     tracking_id, courier, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, unit_price, quantity";

const PAYMENT_COLUMNS: &str = "id, order_id, method, amount, status, proof_path, \
     transaction_ref, verified_by, verified_at, failure_reason, created_at";

const DELIVERY_LOG_COLUMNS: &str =
    "id, order_id, status, tracking_id, courier, note, changed_by, created_at";

/// Checkout details for a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: DiscordId,
    pub full_name: String,
    pub phone: Phone,
    pub address: String,
    pub pincode: Pincode,
    pub payment_method: PaymentMethod,
    /// Whether the phone was confirmed by OTP (required for COD).
    pub phone_verified: bool,
    /// Stored proof file name (manual payments).
    pub proof_path: Option<String>,
    /// UPI transaction reference (manual payments).
    pub transaction_ref: Option<String>,
}

/// An order together with its lines.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Generate a fresh order number for today.
fn generate_order_number() -> Result<OrderNumber, RepositoryError> {
    let mut rng = rand::rng();
    let suffix: String = (0..OrderNumber::SUFFIX_LEN)
        .filter_map(|_| OrderNumber::SUFFIX_ALPHABET.choose(&mut rng))
        .map(|&b| char::from(b))
        .collect();

    OrderNumber::new(Utc::now().date_naive(), &suffix)
        .map_err(|e| RepositoryError::DataCorruption(format!("generated order number: {e}")))
}

/// Repository for order operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the customer's cart into an order.
    ///
    /// Locks the cart, prices it from current product prices, writes the
    /// order, its items, the payment row and the initial delivery log entry,
    /// saves the contact details on the customer, and empties the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::EmptyCart` if the cart holds no active
    /// products, `RepositoryError::Conflict` if the transaction reference was
    /// already used, and `RepositoryError::Database` for other failures.
    #[instrument(skip(self, new), fields(user_id = %new.user_id, method = %new.payment_method))]
    pub async fn create_from_cart(&self, new: &NewOrder) -> Result<PlacedOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, CartLine>(&format!("{CART_LINES} FOR UPDATE OF ci"))
            .bind(&new.user_id)
            .fetch_all(&mut *tx)
            .await?;

        if lines.is_empty() {
            return Err(RepositoryError::EmptyCart);
        }

        let total = cart_total(&lines).amount;
        let order_number = generate_order_number()?;

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO shop.orders
                (order_number, user_id, full_name, phone, address, pincode,
                 total_amount, payment_method, phone_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order_number.as_str())
        .bind(&new.user_id)
        .bind(&new.full_name)
        .bind(new.phone.as_str())
        .bind(&new.address)
        .bind(new.pincode.as_str())
        .bind(total)
        .bind(new.payment_method)
        .bind(new.phone_verified)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "order number already taken"))?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = sqlx::query_as::<_, OrderItem>(&format!(
                r"
                INSERT INTO shop.order_items (order_id, product_id, product_name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {ORDER_ITEM_COLUMNS}
                "
            ))
            .bind(order.id)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(line.unit_price)
            .bind(line.quantity)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        sqlx::query(
            r"
            INSERT INTO shop.payments (order_id, method, amount, proof_path, transaction_ref)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(order.id)
        .bind(new.payment_method)
        .bind(total)
        .bind(new.proof_path.as_deref())
        .bind(new.transaction_ref.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            RepositoryError::from_unique(e, "transaction reference has already been submitted")
        })?;

        sqlx::query(
            r"
            INSERT INTO shop.delivery_logs (order_id, status, note, changed_by)
            VALUES ($1, $2, 'Order placed', 'system')
            ",
        )
        .bind(order.id)
        .bind(DeliveryStatus::Pending)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            UPDATE shop.users
               SET full_name = $2, phone = $3, address = $4, pincode = $5
             WHERE id = $1
            ",
        )
        .bind(&new.user_id)
        .bind(&new.full_name)
        .bind(new.phone.as_str())
        .bind(&new.address)
        .bind(new.pincode.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM shop.cart_items WHERE user_id = $1")
            .bind(&new.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            order_number = %order.order_number,
            total = %order.total(),
            items = items.len(),
            "Order placed"
        );

        Ok(PlacedOrder { order, items })
    }

    /// The customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: &DiscordId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// An order by number, regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE order_number = $1"
        ))
        .bind(number.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// An order by number, only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number_for_user(
        &self,
        number: &OrderNumber,
        user_id: &DiscordId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE order_number = $1 AND user_id = $2"
        ))
        .bind(number.as_str())
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Lines of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order: &Order) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM shop.order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order.id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// The order's payment row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn payment(&self, order: &Order) -> Result<Option<Payment>, RepositoryError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM shop.payments WHERE order_id = $1"
        ))
        .bind(order.id)
        .fetch_optional(self.pool)
        .await?;

        Ok(payment)
    }

    /// Delivery history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delivery_logs(&self, order: &Order) -> Result<Vec<DeliveryLog>, RepositoryError> {
        let logs = sqlx::query_as::<_, DeliveryLog>(&format!(
            "SELECT {DELIVERY_LOG_COLUMNS} FROM shop.delivery_logs WHERE order_id = $1 \
             ORDER BY created_at, id"
        ))
        .bind(order.id)
        .fetch_all(self.pool)
        .await?;

        Ok(logs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_order_numbers_parse() {
        let number = generate_order_number().unwrap();
        let parsed = OrderNumber::parse(number.as_str());
        assert_eq!(parsed, Ok(number));
    }

    #[test]
    fn test_generated_order_numbers_are_dated_today() {
        let number = generate_order_number().unwrap();
        let today = Utc::now().format("%Y%m%d").to_string();
        assert!(number.as_str().starts_with(&format!("MP-{today}-")));
    }
}
