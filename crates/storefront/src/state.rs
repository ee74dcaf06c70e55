//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::SecretString;
use sqlx::PgPool;

use moonlit_discord::{DiscordClient, DiscordOAuth, Notifier};

use crate::config::StorefrontConfig;
use crate::services::otp::{OtpService, sender_from_config};
use crate::services::{LocalProofStore, OtpSender, ProofStore};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    oauth: DiscordOAuth,
    notifier: Notifier,
    otp: OtpService,
    proofs: Arc<dyn ProofStore>,
}

impl AppState {
    /// Build state with the collaborators named by `config`.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let sender = sender_from_config(&config.otp);
        let proofs: Arc<dyn ProofStore> = Arc::new(LocalProofStore::new(&config.upload_dir));
        Self::with_collaborators(config, pool, sender, proofs)
    }

    /// Build state with explicit OTP sender and proof store.
    #[must_use]
    pub fn with_collaborators(
        config: StorefrontConfig,
        pool: PgPool,
        sender: Arc<dyn OtpSender>,
        proofs: Arc<dyn ProofStore>,
    ) -> Self {
        let oauth = DiscordOAuth::new(
            config.discord.client_id.clone(),
            config.discord.client_secret.clone(),
        );
        let notifier = Notifier::new(
            config.discord.bot_token.clone().map(DiscordClient::new),
            config.discord.channels.clone(),
            None,
        );
        let otp_key: SecretString = config.session_secret.clone();
        let otp = OtpService::new(pool.clone(), otp_key, sender);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                oauth,
                notifier,
                otp,
                proofs,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
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

    /// COD verification codes.
    #[must_use]
    pub fn otp(&self) -> &OtpService {
        &self.inner.otp
    }

    /// Payment proof storage.
    #[must_use]
    pub fn proofs(&self) -> &dyn ProofStore {
        self.inner.proofs.as_ref()
    }
}
