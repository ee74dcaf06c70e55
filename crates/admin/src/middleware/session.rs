//! Session middleware configuration for admin.
//!
//! Sets up `PostgreSQL`-backed sessions in `admin.session` with a 24 hour
//! inactivity expiry.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "mp_admin_session";

/// Session expiry time in seconds (24 hours - stricter than storefront).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// The session store backed by `admin.session`.
///
/// # Errors
///
/// Returns an error if the schema or table name is rejected by the store.
pub fn session_store(pool: &PgPool) -> Result<PostgresStore, String> {
    PostgresStore::new(pool.clone())
        .with_schema_name("admin")?
        .with_table_name("session")
}

/// Create the session layer.
///
/// SameSite=Lax: Strict would drop the cookie on the redirect back from
/// Discord and lose the OAuth state.
#[must_use]
pub fn create_session_layer(
    store: PostgresStore,
    config: &AdminConfig,
) -> SessionManagerLayer<PostgresStore> {
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
