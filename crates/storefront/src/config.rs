//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session/OTP signing secret (min 32 chars, high entropy)
//! - `DISCORD_CLIENT_ID` - Discord application client ID
//! - `DISCORD_CLIENT_SECRET` - Discord application client secret
//! - `UPI_ID` - UPI address customers pay to (e.g. `shop@upi`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `MERCHANT_NAME` - Payee name in UPI links (default: Moonlit Promise)
//! - `PAYMENT_QR_IMAGE` - Path under `/static` of a UPI QR code image, shown
//!   only if the per-order QR code cannot be rendered
//! - `UPLOAD_DIR` - Where payment proofs are stored (default: uploads)
//! - `DISCORD_BOT_TOKEN` - Bot token for audit notifications
//! - `DISCORD_LOGIN_CHANNEL`, `DISCORD_ORDER_CHANNEL`, `DISCORD_PAYMENT_CHANNEL`,
//!   `DISCORD_DELIVERY_CHANNEL`, `DISCORD_ADMIN_CHANNEL` - Audit channel IDs
//! - `OTP_WEBHOOK_URL` - SMS gateway endpoint; codes are only logged when unset
//! - `OTP_WEBHOOK_TOKEN` - Bearer token for the SMS gateway
//! - `CLEANUP_INTERVAL_SECS` - Expired OTP/session sweep interval (default: 3600)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use moonlit_discord::Channels;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront, without trailing slash
    pub base_url: String,
    /// Session signing secret, also keys OTP hashes
    pub session_secret: SecretString,
    /// Discord OAuth and notification settings
    pub discord: DiscordConfig,
    /// Manual (UPI) payment settings
    pub payment: PaymentConfig,
    /// OTP delivery settings
    pub otp: OtpConfig,
    /// Directory for uploaded payment proofs
    pub upload_dir: PathBuf,
    /// How often expired OTPs and sessions are swept
    pub cleanup_interval: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Discord application configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct DiscordConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Bot token; notifications are disabled without it
    pub bot_token: Option<SecretString>,
    /// Audit channel IDs
    pub channels: Channels,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[REDACTED]"))
            .field("channels", &self.channels)
            .finish()
    }
}

/// Manual payment configuration.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// UPI virtual payment address
    pub upi_id: String,
    /// Payee name shown in UPI apps
    pub merchant_name: String,
    /// Static path of a QR code image, if one is published
    pub qr_image: Option<String>,
}

/// OTP delivery configuration.
#[derive(Clone, Default)]
pub struct OtpConfig {
    /// SMS gateway webhook URL
    pub webhook_url: Option<String>,
    /// SMS gateway bearer token
    pub webhook_token: Option<SecretString>,
}

impl std::fmt::Debug for OtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpConfig")
            .field("webhook_url", &self.webhook_url)
            .field(
                "webhook_token",
                &self.webhook_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_parsed_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = get_parsed_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        let discord = DiscordConfig::from_env()?;
        let payment = PaymentConfig::from_env()?;
        let otp = OtpConfig::from_env();
        let upload_dir = PathBuf::from(get_env_or_default("UPLOAD_DIR", "uploads"));
        let cleanup_interval =
            Duration::from_secs(get_parsed_env("CLEANUP_INTERVAL_SECS", "3600")?);
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            discord,
            payment,
            otp,
            upload_dir,
            cleanup_interval,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Discord OAuth redirect URI for this deployment.
    #[must_use]
    pub fn discord_redirect_uri(&self) -> String {
        format!("{}/auth/discord/callback", self.base_url)
    }

    /// Public tracking URL for an order.
    #[must_use]
    pub fn track_url(&self, order_number: &str) -> String {
        format!("{}/track/{order_number}", self.base_url)
    }
}

impl DiscordConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: get_required_env("DISCORD_CLIENT_ID")?,
            client_secret: get_validated_secret("DISCORD_CLIENT_SECRET")?,
            bot_token: get_optional_env("DISCORD_BOT_TOKEN").map(SecretString::from),
            channels: Channels {
                login: get_optional_env("DISCORD_LOGIN_CHANNEL"),
                order: get_optional_env("DISCORD_ORDER_CHANNEL"),
                payment: get_optional_env("DISCORD_PAYMENT_CHANNEL"),
                delivery: get_optional_env("DISCORD_DELIVERY_CHANNEL"),
                admin: get_optional_env("DISCORD_ADMIN_CHANNEL"),
            },
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let upi_id = get_required_env("UPI_ID")?;
        if !upi_id.contains('@') {
            return Err(ConfigError::InvalidEnvVar(
                "UPI_ID".to_string(),
                "must look like name@bank".to_string(),
            ));
        }

        Ok(Self {
            upi_id,
            merchant_name: get_env_or_default("MERCHANT_NAME", "Moonlit Promise"),
            qr_image: get_optional_env("PAYMENT_QR_IMAGE"),
        })
    }
}

impl OtpConfig {
    fn from_env() -> Self {
        Self {
            webhook_url: get_optional_env("OTP_WEBHOOK_URL"),
            webhook_token: get_optional_env("OTP_WEBHOOK_TOKEN").map(SecretString::from),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn get_parsed_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
