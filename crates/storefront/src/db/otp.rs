//! OTP request storage.
//!
//! Only HMACs of codes are stored. Rows are append-only apart from the
//! `is_used` flag and the attempt counter.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use moonlit_core::OtpRequestId;

use super::RepositoryError;

/// A stored OTP request.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpRequest {
    pub id: OtpRequestId,
    pub phone: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

/// Repository for OTP requests.
pub struct OtpRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OtpRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new request unless `phone` already made `max_requests`
    /// since `window_start`. Returns `None` when the quota is spent.
    ///
    /// The count and the insert run under a per-phone advisory lock, so
    /// concurrent requests for one phone are serialized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn insert_within_quota(
        &self,
        phone: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
        window_start: DateTime<Utc>,
        max_requests: i64,
    ) -> Result<Option<OtpRequest>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('otp:' || $1))")
            .bind(phone)
            .execute(&mut *tx)
            .await?;

        let recent: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shop.otp_requests WHERE phone = $1 AND created_at > $2",
        )
        .bind(phone)
        .bind(window_start)
        .fetch_one(&mut *tx)
        .await?;

        if recent >= max_requests {
            return Ok(None);
        }

        let request = sqlx::query_as::<_, OtpRequest>(
            r"
            INSERT INTO shop.otp_requests (phone, code_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, phone, code_hash, expires_at, is_used, attempts, created_at
            ",
        )
        .bind(phone)
        .bind(code_hash)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(request))
    }

    /// The newest unused, unexpired request for `phone`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_active(
        &self,
        phone: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRequest>, RepositoryError> {
        let request = sqlx::query_as::<_, OtpRequest>(
            r"
            SELECT id, phone, code_hash, expires_at, is_used, attempts, created_at
            FROM shop.otp_requests
            WHERE phone = $1 AND NOT is_used AND expires_at > $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(phone)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        Ok(request)
    }

    /// The newest unused, unexpired request for `phone` with `code_hash`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_matching(
        &self,
        phone: &str,
        code_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRequest>, RepositoryError> {
        let request = sqlx::query_as::<_, OtpRequest>(
            r"
            SELECT id, phone, code_hash, expires_at, is_used, attempts, created_at
            FROM shop.otp_requests
            WHERE phone = $1 AND code_hash = $2 AND NOT is_used AND expires_at > $3
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(phone)
        .bind(code_hash)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        Ok(request)
    }

    /// Mark a request used. Returns false if it was already used.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_used(&self, id: OtpRequestId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.otp_requests SET is_used = TRUE WHERE id = $1 AND NOT is_used")
                .bind(id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Record a wrong guess, burning the request once `max_attempts` is hit.
    /// Returns the new attempt count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn record_failed_attempt(
        &self,
        id: OtpRequestId,
        max_attempts: i32,
    ) -> Result<i32, RepositoryError> {
        let attempts: i32 = sqlx::query_scalar(
            r"
            UPDATE shop.otp_requests
               SET attempts = attempts + 1,
                   is_used = is_used OR attempts + 1 >= $2
             WHERE id = $1
            RETURNING attempts
            ",
        )
        .bind(id)
        .bind(max_attempts)
        .fetch_one(self.pool)
        .await?;

        Ok(attempts)
    }

    /// Delete spent requests (used or expired at `now`) created before
    /// `window_start`. Rows inside the quota window are kept so they still
    /// count towards the hourly limit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_stale(
        &self,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM shop.otp_requests \
             WHERE created_at <= $2 AND (is_used OR expires_at < $1)",
        )
        .bind(now)
        .bind(window_start)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
