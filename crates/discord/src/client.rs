//! Discord REST client authenticated as a bot.
//!
//! Used for posting audit embeds to channels and granting guild roles.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, instrument};

use crate::error::DiscordError;
use crate::types::{CreateMessage, MessageResponse};

/// Discord REST API base URL.
pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Bot-authenticated Discord API client.
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    bot_token: SecretString,
    api_base: String,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("bot_token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl DiscordClient {
    /// Create a new client for the public Discord API.
    #[must_use]
    pub fn new(bot_token: SecretString) -> Self {
        Self::with_api_base(bot_token, DISCORD_API_BASE)
    }

    /// Create a client against a different API base (tests, proxies).
    #[must_use]
    pub fn with_api_base(bot_token: SecretString, api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            bot_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.bot_token.expose_secret())
    }

    /// Post a message to a channel.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Discord responds with a
    /// non-success status.
    #[instrument(skip(self, message), fields(channel = %channel_id))]
    pub async fn post_message(
        &self,
        channel_id: &str,
        message: &CreateMessage,
    ) -> Result<MessageResponse, DiscordError> {
        let response = self
            .client
            .post(format!("{}/channels/{channel_id}/messages", self.api_base))
            .header("Authorization", self.auth_header())
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Discord API error posting message");
            return Err(DiscordError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let result: MessageResponse = response
            .json()
            .await
            .map_err(|e| DiscordError::Response(e.to_string()))?;

        debug!(message_id = %result.id, "Message posted to Discord");

        Ok(result)
    }

    /// Add a role to a guild member.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Discord responds with a
    /// non-success status (e.g. the bot lacks Manage Roles, or the user is
    /// not in the guild).
    #[instrument(skip(self))]
    pub async fn add_member_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), DiscordError> {
        let response = self
            .client
            .put(format!(
                "{}/guilds/{guild_id}/members/{user_id}/roles/{role_id}",
                self.api_base
            ))
            .header("Authorization", self.auth_header())
            .header("X-Audit-Log-Reason", "Order approved")
            .header("Content-Length", "0")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Discord API error adding role");
            return Err(DiscordError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Role added to guild member");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let client = DiscordClient::new(SecretString::from("super-secret-bot-token".to_string()));
        let debug = format!("{client:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-bot-token"));
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let client = DiscordClient::with_api_base(
            SecretString::from("token".to_string()),
            "http://localhost:9999/api/",
        );
        assert_eq!(client.api_base, "http://localhost:9999/api");
        assert_eq!(client.auth_header(), "Bot token");
    }
}
