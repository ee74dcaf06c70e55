//! One-time passwords for cash-on-delivery checkout.
//!
//! Codes are six digits, valid for five minutes, and stored only as an
//! HMAC-SHA256 of `phone:code` keyed with the session secret. A phone may
//! request at most three codes per rolling hour, and each code survives at
//! most five wrong guesses.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::Sha256;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use moonlit_core::Phone;

use crate::config::OtpConfig;
use crate::db::{OtpRepository, RepositoryError};

/// Digits in a code.
pub const CODE_LEN: usize = 6;

/// How long a code stays valid.
pub const CODE_TTL_MINUTES: i64 = 5;

/// Requests allowed per phone per rolling hour.
pub const MAX_REQUESTS_PER_HOUR: i64 = 3;

/// Length of the request quota window.
pub const QUOTA_WINDOW_HOURS: i64 = 1;

/// Wrong guesses allowed per code.
pub const MAX_ATTEMPTS: i32 = 5;

type HmacSha256 = Hmac<Sha256>;

/// Errors from requesting or verifying a code.
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("Too many attempts. Please try again later.")]
    TooManyRequests,

    #[error("Too many wrong codes. Please request a new one.")]
    TooManyAttempts,

    #[error("Invalid code. {remaining} attempt(s) left.")]
    InvalidCode { remaining: i32 },

    #[error("Code expired or not found. Please request a new one.")]
    Expired,

    #[error("Failed to send code: {0}")]
    Delivery(String),

    #[error("OTP hashing failed")]
    Hash,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl OtpError {
    /// Whether the message is safe and useful to show the customer.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::TooManyRequests | Self::TooManyAttempts | Self::InvalidCode { .. } | Self::Expired
        )
    }
}

/// Delivers codes to phones.
#[async_trait]
pub trait OtpSender: Send + Sync {
    /// Send `message` to `phone`.
    async fn send(&self, phone: &Phone, message: &str) -> Result<(), OtpError>;
}

/// Writes codes to the log. For development.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, phone: &Phone, message: &str) -> Result<(), OtpError> {
        warn!(
            phone = %phone.masked(),
            sms = message,
            "OTP_WEBHOOK_URL not set; logging OTP instead of sending"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    phone: &'a str,
    message: &'a str,
}

/// Posts codes to an SMS gateway webhook as `{phone, message}`.
#[derive(Clone)]
pub struct WebhookOtpSender {
    client: reqwest::Client,
    url: String,
    token: Option<SecretString>,
}

impl std::fmt::Debug for WebhookOtpSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookOtpSender")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl WebhookOtpSender {
    #[must_use]
    pub fn new(url: impl Into<String>, token: Option<SecretString>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            token,
        }
    }
}

#[async_trait]
impl OtpSender for WebhookOtpSender {
    async fn send(&self, phone: &Phone, message: &str) -> Result<(), OtpError> {
        let mut request = self.client.post(&self.url).json(&WebhookPayload {
            phone: phone.as_str(),
            message,
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| OtpError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OtpError::Delivery(format!("gateway returned {status}: {body}")));
        }
        Ok(())
    }
}

/// Pick the sender configured by `OTP_WEBHOOK_URL`.
#[must_use]
pub fn sender_from_config(config: &OtpConfig) -> Arc<dyn OtpSender> {
    match &config.webhook_url {
        Some(url) => Arc::new(WebhookOtpSender::new(url, config.webhook_token.clone())),
        None => Arc::new(LogOtpSender),
    }
}

/// Hex HMAC-SHA256 of `phone:code`.
///
/// # Errors
///
/// Returns `OtpError::Hash` if the key is rejected by the MAC.
pub fn hash_code(key: &SecretString, phone: &str, code: &str) -> Result<String, OtpError> {
    let mut mac = HmacSha256::new_from_slice(key.expose_secret().as_bytes())
        .map_err(|_| OtpError::Hash)?;
    mac.update(phone.as_bytes());
    mac.update(b":");
    mac.update(code.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// A random zero-padded six-digit code.
#[must_use]
pub fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

/// Start of the quota window ending at `now`.
#[must_use]
pub fn quota_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(QUOTA_WINDOW_HOURS)
}

fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Issues and checks COD verification codes.
#[derive(Clone)]
pub struct OtpService {
    pool: PgPool,
    key: SecretString,
    sender: Arc<dyn OtpSender>,
}

impl OtpService {
    #[must_use]
    pub fn new(pool: PgPool, key: SecretString, sender: Arc<dyn OtpSender>) -> Self {
        Self { pool, key, sender }
    }

    /// Generate, store, and send a code for `phone`.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::TooManyRequests` once the hourly quota is spent,
    /// `OtpError::Delivery` if the sender fails.
    #[instrument(skip(self, phone), fields(phone = %phone.masked()))]
    pub async fn request(&self, phone: &Phone) -> Result<(), OtpError> {
        let repo = OtpRepository::new(&self.pool);
        let now = Utc::now();

        let code = generate_code();
        let hash = hash_code(&self.key, phone.as_str(), &code)?;
        let stored = repo
            .insert_within_quota(
                phone.as_str(),
                &hash,
                now + Duration::minutes(CODE_TTL_MINUTES),
                quota_window_start(now),
                MAX_REQUESTS_PER_HOUR,
            )
            .await?;
        if stored.is_none() {
            warn!("OTP request quota exhausted");
            return Err(OtpError::TooManyRequests);
        }

        let message = format!(
            "Your Moonlit Promise verification code is {code}. It expires in {CODE_TTL_MINUTES} minutes."
        );
        self.sender.send(phone, &message).await?;

        info!("OTP sent");
        Ok(())
    }

    /// Check `code` for `phone`, consuming the matching request.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::InvalidCode` for a wrong guess,
    /// `OtpError::TooManyAttempts` when the guess burns the request, and
    /// `OtpError::Expired` when there is no live request.
    #[instrument(skip(self, phone, code), fields(phone = %phone.masked()))]
    pub async fn verify(&self, phone: &Phone, code: &str) -> Result<(), OtpError> {
        let repo = OtpRepository::new(&self.pool);
        let now = Utc::now();
        let code = code.trim();

        if is_well_formed(code) {
            let hash = hash_code(&self.key, phone.as_str(), code)?;
            if let Some(request) = repo.find_matching(phone.as_str(), &hash, now).await?
                && repo.mark_used(request.id).await?
            {
                info!("OTP verified");
                return Ok(());
            }
        }

        let Some(active) = repo.find_active(phone.as_str(), now).await? else {
            return Err(OtpError::Expired);
        };

        let attempts = repo.record_failed_attempt(active.id, MAX_ATTEMPTS).await?;
        if attempts >= MAX_ATTEMPTS {
            warn!("OTP burned after too many wrong codes");
            return Err(OtpError::TooManyAttempts);
        }

        Err(OtpError::InvalidCode {
            remaining: MAX_ATTEMPTS - attempts,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn key() -> SecretString {
        SecretString::from("k7Yp2mQx9vLz4nRt8wBc3dFg6hJs1aEu".to_string())
    }

    #[test]
    fn test_hash_is_deterministic_and_hex() {
        let a = hash_code(&key(), "9876543210", "123456").unwrap();
        let b = hash_code(&key(), "9876543210", "123456").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_binds_phone_and_code() {
        let base = hash_code(&key(), "9876543210", "123456").unwrap();
        assert_ne!(base, hash_code(&key(), "9876543211", "123456").unwrap());
        assert_ne!(base, hash_code(&key(), "9876543210", "123457").unwrap());
        let other_key = SecretString::from("another-key-with-enough-entropy-42".to_string());
        assert_ne!(base, hash_code(&other_key, "9876543210", "123456").unwrap());
    }

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert!(is_well_formed(&code), "bad code {code}");
        }
    }

    #[test]
    fn test_quota_window_is_one_hour() {
        let now = Utc::now();
        assert_eq!(now - quota_window_start(now), Duration::hours(1));
    }

    #[test]
    fn test_well_formed_rejects_junk() {
        assert!(!is_well_formed("12345"));
        assert!(!is_well_formed("1234567"));
        assert!(!is_well_formed("12a456"));
        assert!(is_well_formed("000000"));
    }

    #[test]
    fn test_user_facing_errors() {
        assert!(OtpError::TooManyRequests.is_user_facing());
        assert!(OtpError::InvalidCode { remaining: 2 }.is_user_facing());
        assert!(!OtpError::Delivery("down".into()).is_user_facing());
        assert_eq!(
            OtpError::TooManyRequests.to_string(),
            "Too many attempts. Please try again later."
        );
    }

    #[tokio::test]
    async fn test_log_sender_always_succeeds() {
        let phone = Phone::parse("+91 98765 43210").unwrap();
        assert!(LogOtpSender.send(&phone, "code 123456").await.is_ok());
    }

    #[test]
    fn test_webhook_sender_debug_redacts_token() {
        let sender = WebhookOtpSender::new(
            "https://sms.example/send",
            Some(SecretString::from("gateway-token".to_string())),
        );
        assert!(!format!("{sender:?}").contains("gateway-token"));
    }
}
