//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions in `shop.session` using tower-sessions.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "mp_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// The session store backed by `shop.session`.
///
/// # Errors
///
/// Returns an error if the schema or table name is rejected by the store.
pub fn session_store(pool: &PgPool) -> Result<PostgresStore, String> {
    PostgresStore::new(pool.clone())
        .with_schema_name("shop")?
        .with_table_name("session")
}

/// Create the session layer.
///
/// SameSite=Lax so the session survives the top-level redirect back from
/// Discord's OAuth screen.
#[must_use]
pub fn create_session_layer(
    store: PostgresStore,
    config: &StorefrontConfig,
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

#[cfg(test)]
pub(crate) mod testing {
    //! Sessions for unit tests that never reach a real store.

    use std::sync::Arc;

    use async_trait::async_trait;
    use tower_sessions::Session;
    use tower_sessions::session::{Id, Record};
    use tower_sessions::session_store::{self, SessionStore};

    /// A store whose backend is always down.
    #[derive(Debug, Clone, Copy)]
    pub struct UnavailableStore;

    fn down() -> session_store::Error {
        session_store::Error::Backend("store unavailable".to_string())
    }

    #[async_trait]
    impl SessionStore for UnavailableStore {
        async fn save(&self, _record: &Record) -> session_store::Result<()> {
            Err(down())
        }

        async fn load(&self, _session_id: &Id) -> session_store::Result<Option<Record>> {
            Err(down())
        }

        async fn delete(&self, _session_id: &Id) -> session_store::Result<()> {
            Err(down())
        }
    }

    /// A session for a returning cookie whose store cannot be reached.
    pub fn unavailable_session() -> Session {
        Session::new(Some(Id::default()), Arc::new(UnavailableStore), None)
    }

    /// A brand-new session; reads and writes stay in memory.
    pub fn fresh_session() -> Session {
        Session::new(None, Arc::new(UnavailableStore), None)
    }
}
