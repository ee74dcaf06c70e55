//! Customer records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::DiscordId;

/// A customer, identified by Discord account.
///
/// Contact fields are remembered from the last checkout and pre-fill the
/// next one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: DiscordId,
    pub username: String,
    pub avatar_url: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub pincode: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}
