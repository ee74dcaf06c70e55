//! Periodic housekeeping.
//!
//! Deletes spent or expired OTP requests once they fall out of the hourly
//! request quota, and expired sessions.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tokio::task::JoinHandle;
use tower_sessions::session_store::ExpiredDeletion;
use tracing::{info, warn};

use crate::db::{OtpRepository, RepositoryError};
use crate::middleware::session_store;
use crate::services::otp::quota_window_start;

/// Errors from a cleanup pass.
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("session store error: {0}")]
    Sessions(String),
}

/// What a cleanup pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub otp_requests: u64,
}

/// Run one cleanup pass.
///
/// # Errors
///
/// Returns an error if either delete fails.
pub async fn run_once(pool: &PgPool) -> Result<CleanupReport, CleanupError> {
    let now = Utc::now();
    let otp_requests = OtpRepository::new(pool)
        .delete_stale(now, quota_window_start(now))
        .await?;

    session_store(pool)
        .map_err(CleanupError::Sessions)?
        .delete_expired()
        .await
        .map_err(|e| CleanupError::Sessions(e.to_string()))?;

    info!(otp_requests, "Cleanup pass complete");
    Ok(CleanupReport { otp_requests })
}

/// Run [`run_once`] every `interval` until the runtime shuts down.
///
/// The first pass runs immediately.
#[must_use]
pub fn spawn(pool: PgPool, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = run_once(&pool).await {
                warn!(error = %e, "Cleanup pass failed");
            }
        }
    })
}
