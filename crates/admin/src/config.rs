//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//! - `ADMIN_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `ADMIN_IDS` - Comma-separated Discord user IDs allowed to sign in
//! - `DISCORD_CLIENT_ID` - Discord application client ID
//! - `DISCORD_CLIENT_SECRET` - Discord application client secret
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `UPLOAD_DIR` - Where the storefront stores payment proofs (default: uploads)
//! - `DISCORD_BOT_TOKEN` - Bot token for audit notifications and role grants
//! - `DISCORD_GUILD_ID`, `DISCORD_CUSTOMER_ROLE_ID` - Role granted on verified payment
//! - `DISCORD_LOGIN_CHANNEL`, `DISCORD_ORDER_CHANNEL`, `DISCORD_PAYMENT_CHANNEL`,
//!   `DISCORD_DELIVERY_CHANNEL`, `DISCORD_ADMIN_CHANNEL` - Audit channel IDs
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

use std::collections::{BTreeSet, HashMap};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use moonlit_core::DiscordId;
use moonlit_discord::{Channels, CustomerRole};
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

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel, without trailing slash
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Discord OAuth, notification, and role settings
    pub discord: DiscordConfig,
    /// Discord IDs allowed into the panel
    pub admin_ids: BTreeSet<DiscordId>,
    /// Directory the storefront writes payment proofs to
    pub upload_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
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
    /// Bot token; notifications and role grants are disabled without it
    pub bot_token: Option<SecretString>,
    /// Audit channel IDs
    pub channels: Channels,
    /// Guild and role granted to customers with a completed payment
    pub customer_role: Option<CustomerRole>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[REDACTED]"))
            .field("channels", &self.channels)
            .field("customer_role", &self.customer_role)
            .finish()
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ADMIN_TLS_CERT");
        let key_pem = get_optional_env("ADMIN_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_TLS_*".to_string(),
                "Both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl DiscordConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let guild_id = get_optional_env("DISCORD_GUILD_ID");
        let role_id = get_optional_env("DISCORD_CUSTOMER_ROLE_ID");
        let customer_role = match (guild_id, role_id) {
            (Some(guild_id), Some(role_id)) => Some(CustomerRole { guild_id, role_id }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::InvalidEnvVar(
                    "DISCORD_GUILD_ID/DISCORD_CUSTOMER_ROLE_ID".to_string(),
                    "Both must be set together".to_string(),
                ));
            }
        };

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
            customer_role,
        })
    }
}

impl AdminConfig {
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

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("ADMIN_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let session_secret = get_validated_secret("ADMIN_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "ADMIN_SESSION_SECRET")?;

        let discord = DiscordConfig::from_env()?;
        let admin_ids = parse_admin_ids(&get_required_env("ADMIN_IDS")?)?;
        let upload_dir = PathBuf::from(get_env_or_default("UPLOAD_DIR", "uploads"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            discord,
            admin_ids,
            upload_dir,
            sentry_dsn,
            sentry_environment,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Discord OAuth redirect URI for the admin panel.
    #[must_use]
    pub fn discord_redirect_uri(&self) -> String {
        format!("{}/auth/callback", self.base_url)
    }

    /// Whether `id` is on the allow-list.
    #[must_use]
    pub fn is_admin(&self, id: &DiscordId) -> bool {
        self.admin_ids.contains(id)
    }
}

/// Parse the `ADMIN_IDS` allow-list. Commas and whitespace both separate.
fn parse_admin_ids(raw: &str) -> Result<BTreeSet<DiscordId>, ConfigError> {
    let ids = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            DiscordId::parse(s).map_err(|e| {
                ConfigError::InvalidEnvVar("ADMIN_IDS".to_string(), format!("{s}: {e}"))
            })
        })
        .collect::<Result<BTreeSet<_>, _>>()?;

    if ids.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            "ADMIN_IDS".to_string(),
            "at least one Discord ID is required".to_string(),
        ));
    }
    Ok(ids)
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_config() -> AdminConfig {
        AdminConfig {
            database_url: SecretString::from("postgres://localhost/test".to_string()),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "https://admin.moonlit.example".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            discord: DiscordConfig {
                client_id: "1234567890".to_string(),
                client_secret: SecretString::from("super_secret_client_value".to_string()),
                bot_token: None,
                channels: Channels::default(),
                customer_role: None,
            },
            admin_ids: parse_admin_ids("80351110224678912").unwrap(),
            upload_dir: PathBuf::from("uploads"),
            sentry_dsn: None,
            sentry_environment: None,
            tls: None,
        }
    }

    #[test]
    fn test_parse_admin_ids() {
        let ids = parse_admin_ids(" 80351110224678912, 123456789012345678\n").unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&DiscordId::parse("123456789012345678").unwrap()));
    }

    #[test]
    fn test_parse_admin_ids_rejects_junk_and_empty() {
        assert!(parse_admin_ids("80351110224678912,bob").is_err());
        assert!(parse_admin_ids(" , ").is_err());
    }

    #[test]
    fn test_is_admin() {
        let config = test_config();
        assert!(config.is_admin(&DiscordId::parse("80351110224678912").unwrap()));
        assert!(!config.is_admin(&DiscordId::parse("123456789012345678").unwrap()));
    }

    #[test]
    fn test_redirect_uri() {
        assert_eq!(
            test_config().discord_redirect_uri(),
            "https://admin.moonlit.example/auth/callback"
        );
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(validate_secret_strength("your-discord-secret-here", "T").is_err());
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "T").is_err());
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "T").is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let output = format!("{:?}", test_config().discord);
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("super_secret_client_value"));

        let tls = TlsConfig {
            cert_pem: "-----BEGIN CERTIFICATE-----".to_string(),
            key_pem: SecretString::from("private-key-material".to_string()),
        };
        assert!(!format!("{tls:?}").contains("private-key-material"));
    }
}
