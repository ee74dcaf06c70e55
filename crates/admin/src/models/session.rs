//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use moonlit_core::DiscordId;

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the signed-in admin.
/// Membership of the allow-list is re-checked on every request, so removing
/// an ID from `ADMIN_IDS` locks the admin out on restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Admin's Discord user ID.
    pub id: DiscordId,
    /// Discord display name.
    pub username: String,
    /// Discord CDN avatar URL.
    pub avatar_url: Option<String>,
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current signed-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for Discord OAuth state (CSRF protection).
    pub const OAUTH_STATE: &str = "discord_oauth_state";
}
