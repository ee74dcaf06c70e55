//! Discord-related errors.

use thiserror::Error;

/// Errors that can occur when talking to Discord.
#[derive(Debug, Error)]
pub enum DiscordError {
    /// HTTP request failed.
    #[error("Discord request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("Discord response error: {0}")]
    Response(String),

    /// Discord returned a non-success status.
    #[error("Discord API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// OAuth flow failed (bad code, revoked grant, mismatched redirect URI).
    #[error("Discord OAuth error: {0}")]
    OAuth(String),
}

impl From<reqwest::Error> for DiscordError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}
