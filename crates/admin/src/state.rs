//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use moonlit_discord::{DiscordClient, DiscordOAuth, Notifier};

use crate::config::AdminConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    oauth: DiscordOAuth,
    notifier: Notifier,
}

impl AppState {
    /// Build state from configuration and a database pool.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let oauth = DiscordOAuth::new(
            config.discord.client_id.clone(),
            config.discord.client_secret.clone(),
        );
        let notifier = Notifier::new(
            config.discord.bot_token.clone().map(DiscordClient::new),
            config.discord.channels.clone(),
            config.discord.customer_role.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                oauth,
                notifier,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Discord sign-in client.
    #[must_use]
    pub fn oauth(&self) -> &DiscordOAuth {
        &self.inner.oauth
    }

    /// Audit-channel notifier.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }
}
