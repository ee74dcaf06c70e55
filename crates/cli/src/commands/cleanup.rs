//! One-off cleanup pass.
//!
//! Deletes stale OTP requests and expired storefront sessions. The
//! storefront runs the same pass on a timer; this is for cron or manual use.

use moonlit_storefront::services::cleanup::{self, CleanupError, CleanupReport};
use thiserror::Error;

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum CleanupCommandError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Cleanup(#[from] CleanupError),
}

/// Run one cleanup pass against the storefront database.
///
/// # Errors
///
/// Returns an error if the connection or either delete fails.
pub async fn run() -> Result<CleanupReport, CleanupCommandError> {
    let pool = connect("STOREFRONT_DATABASE_URL").await?;
    Ok(cleanup::run_once(&pool).await?)
}
