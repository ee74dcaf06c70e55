//! Order lifecycle repository.
//!
//! Every write is a compare-and-set: the `UPDATE` only matches if the order
//! still has the payment and delivery status it was validated against. A
//! concurrent change makes the update match no rows, which surfaces as
//! `RepositoryError::Conflict` instead of a silent overwrite.

use sqlx::PgPool;
use tracing::{info, instrument};

use moonlit_core::{
    DeliveryLog, DeliveryOutcome, DeliveryStatus, DiscordId, Order, OrderId, OrderItem, Payment,
    PaymentStatus,
};

use super::RepositoryError;

const ORDER_COLUMNS: &str = "id, order_number, user_id, full_name, phone, address, pincode, \
     total_amount, payment_method, payment_status, delivery_status, phone_verified, \
     tracking_id, courier, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, unit_price, quantity";

const PAYMENT_COLUMNS: &str = "id, order_id, method, amount, status, proof_path, \
     transaction_ref, verified_by, verified_at, failure_reason, created_at";

const DELIVERY_LOG_COLUMNS: &str =
    "id, order_id, status, tracking_id, courier, note, changed_by, created_at";

/// Orders shown on one list page.
const LIST_LIMIT: i64 = 200;

/// Orders shown on the dashboard.
const RECENT_LIMIT: i64 = 10;

const STALE_ORDER: &str = "order was changed by someone else; reload and try again";

/// Number of orders in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCount<S> {
    pub status: S,
    pub count: i64,
}

/// Figures for the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardStats {
    pub customers: i64,
    /// One entry per payment status, zero-filled.
    pub by_payment: Vec<StatusCount<PaymentStatus>>,
    /// One entry per delivery status, zero-filled.
    pub by_delivery: Vec<StatusCount<DeliveryStatus>>,
    /// Manual payments waiting for an admin.
    pub awaiting_verification: i64,
    pub recent: Vec<Order>,
}

/// Fill in zero counts for statuses with no orders, in lifecycle order.
fn zero_filled<S: Copy + PartialEq, const N: usize>(
    all: [S; N],
    rows: &[(S, i64)],
) -> Vec<StatusCount<S>> {
    all.into_iter()
        .map(|status| StatusCount {
            status,
            count: rows
                .iter()
                .find(|(s, _)| *s == status)
                .map_or(0, |(_, count)| *count),
        })
        .collect()
}

/// A delivery change requested by an admin.
#[derive(Debug, Clone)]
pub struct DeliveryUpdate {
    pub status: DeliveryStatus,
    pub tracking_id: Option<String>,
    pub courier: Option<String>,
    pub note: Option<String>,
}

/// Repository for order reads and lifecycle writes.
pub struct AdminOrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminOrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Counts and recent orders for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardStats, RepositoryError> {
        let customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.users")
            .fetch_one(self.pool)
            .await?;

        let by_payment = sqlx::query_as::<_, (PaymentStatus, i64)>(
            "SELECT payment_status AS status, COUNT(*) AS count FROM shop.orders \
             GROUP BY payment_status",
        )
        .fetch_all(self.pool)
        .await?;

        let by_delivery = sqlx::query_as::<_, (DeliveryStatus, i64)>(
            "SELECT delivery_status AS status, COUNT(*) AS count FROM shop.orders \
             GROUP BY delivery_status",
        )
        .fetch_all(self.pool)
        .await?;

        let awaiting_verification: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shop.orders \
             WHERE payment_method = 'manual' AND payment_status = 'pending'",
        )
        .fetch_one(self.pool)
        .await?;

        let recent = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(RECENT_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(DashboardStats {
            customers,
            by_payment: zero_filled(PaymentStatus::ALL, &by_payment),
            by_delivery: zero_filled(DeliveryStatus::ALL, &by_delivery),
            awaiting_verification,
            recent,
        })
    }

    /// Orders, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        payment: Option<PaymentStatus>,
        delivery: Option<DeliveryStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM shop.orders
            WHERE ($1::shop.payment_status IS NULL OR payment_status = $1)
              AND ($2::shop.delivery_status IS NULL OR delivery_status = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "
        ))
        .bind(payment)
        .bind(delivery)
        .bind(LIST_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Lines of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM shop.order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// The order's payment row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn payment(&self, id: OrderId) -> Result<Option<Payment>, RepositoryError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM shop.payments WHERE order_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(payment)
    }

    /// Delivery history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn logs(&self, id: OrderId) -> Result<Vec<DeliveryLog>, RepositoryError> {
        let logs = sqlx::query_as::<_, DeliveryLog>(&format!(
            "SELECT {DELIVERY_LOG_COLUMNS} FROM shop.delivery_logs WHERE order_id = $1 \
             ORDER BY created_at, id"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(logs)
    }

    /// Move the payment of `order` to `next`.
    ///
    /// The caller validates the transition against `order.state()` first;
    /// this writes it only if the order has not changed since. Either
    /// decision stamps the reviewing admin into `verified_by` and
    /// `verified_at`. Completing may attach a transaction reference;
    /// failing records the reason.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order changed underneath
    /// or the transaction reference is already used elsewhere.
    #[instrument(skip(self, order, transaction_ref, reason), fields(order_number = %order.order_number, old = %order.payment_status, new = %next, actor = %actor))]
    pub async fn set_payment(
        &self,
        order: &Order,
        next: PaymentStatus,
        actor: &DiscordId,
        transaction_ref: Option<&str>,
        reason: Option<&str>,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE shop.orders
               SET payment_status = $2, updated_at = NOW()
             WHERE id = $1 AND payment_status = $3 AND delivery_status = $4
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.id)
        .bind(next)
        .bind(order.payment_status)
        .bind(order.delivery_status)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::Conflict(STALE_ORDER.to_owned()))?;

        sqlx::query(
            r"
            UPDATE shop.payments
               SET status = $2,
                   verified_by = $3,
                   verified_at = NOW(),
                   transaction_ref = COALESCE($4, transaction_ref),
                   failure_reason = $5
             WHERE order_id = $1
            ",
        )
        .bind(order.id)
        .bind(next)
        .bind(actor.as_str())
        .bind(transaction_ref)
        .bind(reason)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            RepositoryError::from_constraint(
                e,
                "transaction reference is already used by another order",
            )
        })?;

        tx.commit().await?;

        info!("Payment status changed");
        Ok(updated)
    }

    /// Write a validated delivery transition.
    ///
    /// Updates the order (and its payment when the outcome completed it),
    /// and appends a delivery log entry carrying the tracking details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order changed underneath.
    #[instrument(skip(self, order, outcome, update), fields(order_number = %order.order_number, old = %order.delivery_status, new = %update.status, actor = %actor))]
    pub async fn apply_delivery(
        &self,
        order: &Order,
        outcome: &DeliveryOutcome,
        update: &DeliveryUpdate,
        actor: &DiscordId,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE shop.orders
               SET delivery_status = $2,
                   payment_status = $3,
                   tracking_id = COALESCE($4, tracking_id),
                   courier = COALESCE($5, courier),
                   updated_at = NOW()
             WHERE id = $1 AND delivery_status = $6 AND payment_status = $7
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.id)
        .bind(outcome.state.delivery_status)
        .bind(outcome.state.payment_status)
        .bind(update.tracking_id.as_deref())
        .bind(update.courier.as_deref())
        .bind(order.delivery_status)
        .bind(order.payment_status)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::Conflict(STALE_ORDER.to_owned()))?;

        sqlx::query(
            r"
            INSERT INTO shop.delivery_logs (order_id, status, tracking_id, courier, note, changed_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(order.id)
        .bind(update.status)
        .bind(updated.tracking_id.as_deref())
        .bind(updated.courier.as_deref())
        .bind(update.note.as_deref())
        .bind(actor.as_str())
        .execute(&mut *tx)
        .await?;

        if outcome.payment_completed {
            sqlx::query(
                r"
                UPDATE shop.payments
                   SET status = 'completed', verified_by = $2, verified_at = NOW()
                 WHERE order_id = $1
                ",
            )
            .bind(order.id)
            .bind(actor.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            payment_completed = outcome.payment_completed,
            "Delivery status changed"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_filled_keeps_lifecycle_order() {
        let rows = [(DeliveryStatus::Delivered, 4), (DeliveryStatus::Pending, 2)];

        let filled = zero_filled(DeliveryStatus::ALL, &rows);

        assert_eq!(filled.len(), DeliveryStatus::ALL.len());
        assert_eq!(
            filled.iter().map(|c| c.status).collect::<Vec<_>>(),
            DeliveryStatus::ALL.to_vec()
        );
        assert_eq!(
            filled.iter().map(|c| c.count).collect::<Vec<_>>(),
            vec![2, 0, 0, 4, 0]
        );
    }

    #[test]
    fn test_zero_filled_empty() {
        let filled = zero_filled(PaymentStatus::ALL, &[]);
        assert!(filled.iter().all(|c| c.count == 0));
        assert_eq!(filled.len(), 3);
    }
}
