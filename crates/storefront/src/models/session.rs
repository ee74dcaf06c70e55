//! Session-related types.
//!
//! Types stored in the session for authentication and checkout state.

use serde::{Deserialize, Serialize};

use moonlit_core::DiscordId;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the signed-in customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Discord user ID, also the `shop.users` primary key.
    pub id: DiscordId,
    /// Discord display name.
    pub username: String,
    /// Discord CDN avatar URL.
    pub avatar_url: Option<String>,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for Discord OAuth state (CSRF protection).
    pub const OAUTH_STATE: &str = "discord_oauth_state";

    /// Key for the path to return to after sign-in.
    pub const RETURN_TO: &str = "return_to";

    /// Key for the phone number verified by OTP in this session.
    pub const VERIFIED_PHONE: &str = "verified_phone";
}
