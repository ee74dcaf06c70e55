//! Discord OAuth2 authorization-code flow.
//!
//! # Flow
//!
//! 1. Generate the authorization URL with [`DiscordOAuth::authorization_url`]
//!    and a random `state` kept in the session
//! 2. Discord redirects back with `code` and `state`
//! 3. Exchange the code with [`DiscordOAuth::exchange_code`]
//! 4. Fetch the signed-in user with [`DiscordOAuth::fetch_user`]
//!
//! Only the `identify` scope is requested; the access token is discarded
//! after the user lookup.

use std::sync::Arc;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use crate::client::DISCORD_API_BASE;
use crate::error::DiscordError;

const AUTHORIZE_URL: &str = "https://discord.com/oauth2/authorize";
const CDN_BASE: &str = "https://cdn.discordapp.com";

/// OAuth2 client for "Sign in with Discord".
#[derive(Clone)]
pub struct DiscordOAuth {
    inner: Arc<DiscordOAuthInner>,
}

struct DiscordOAuthInner {
    client: Client,
    client_id: String,
    client_secret: SecretString,
    api_base: String,
}

impl std::fmt::Debug for DiscordOAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordOAuth")
            .field("client_id", &self.inner.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: String,
}

/// The signed-in user, from `GET /users/@me`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    /// Display name, if the user set one.
    pub global_name: Option<String>,
    /// Avatar hash.
    pub avatar: Option<String>,
}

impl DiscordUser {
    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }

    /// Full avatar URL, if the user has a custom avatar.
    #[must_use]
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar.as_ref().map(|hash| {
            let ext = if hash.starts_with("a_") { "gif" } else { "png" };
            format!("{CDN_BASE}/avatars/{}/{hash}.{ext}", self.id)
        })
    }
}

impl DiscordOAuth {
    /// Create a new OAuth client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: SecretString) -> Self {
        Self {
            inner: Arc::new(DiscordOAuthInner {
                client: Client::new(),
                client_id: client_id.into(),
                client_secret,
                api_base: DISCORD_API_BASE.to_string(),
            }),
        }
    }

    /// Get the OAuth client ID (safe to expose in frontend).
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    /// Build the URL to send the browser to.
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - Must exactly match a redirect registered for the app
    /// * `state` - A random string stored in the session to prevent CSRF attacks
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=identify&\
            state={}&\
            prompt=none",
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, DiscordError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .inner
            .client
            .post(format!("{}/oauth2/token", self.inner.api_base))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DiscordError::OAuth(format!(
                "Token exchange failed: {text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DiscordError::Response(e.to_string()))
    }

    /// Fetch the user the access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip_all)]
    pub async fn fetch_user(&self, access_token: &str) -> Result<DiscordUser, DiscordError> {
        let response = self
            .inner
            .client
            .get(format!("{}/users/@me", self.inner.api_base))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscordError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| DiscordError::Response(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn oauth() -> DiscordOAuth {
        DiscordOAuth::new(
            "123456789",
            SecretString::from("oauth-client-secret".to_string()),
        )
    }

    #[test]
    fn test_authorization_url_encodes_params() {
        let url = oauth().authorization_url("https://shop.example/auth/discord/callback", "a b");
        assert!(url.starts_with("https://discord.com/oauth2/authorize?client_id=123456789&"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fshop.example%2Fauth%2Fdiscord%2Fcallback"));
        assert!(url.contains("scope=identify"));
        assert!(url.contains("state=a%20b"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", oauth());
        assert!(!debug.contains("oauth-client-secret"));
    }

    #[test]
    fn test_user_avatar_url() {
        let user: DiscordUser = serde_json::from_str(
            r#"{"id":"80351110224678912","username":"nelly","global_name":"Nelly","avatar":"8342729096ea3675442027381ff50dfe"}"#,
        )
        .unwrap();
        assert_eq!(user.display_name(), "Nelly");
        assert_eq!(
            user.avatar_url().unwrap(),
            "https://cdn.discordapp.com/avatars/80351110224678912/8342729096ea3675442027381ff50dfe.png"
        );
    }

    #[test]
    fn test_user_without_avatar() {
        let user: DiscordUser =
            serde_json::from_str(r#"{"id":"1","username":"plain","global_name":null,"avatar":null}"#)
                .unwrap();
        assert_eq!(user.display_name(), "plain");
        assert!(user.avatar_url().is_none());
    }
}
