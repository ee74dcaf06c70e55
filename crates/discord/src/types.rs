//! Discord message and embed types.
//!
//! A subset of Discord's message payload, enough for audit-log embeds.
//!
//! See: <https://discord.com/developers/docs/resources/message#embed-object>

use serde::{Deserialize, Serialize};

/// Discord's limit on embed field values.
pub const FIELD_VALUE_LIMIT: usize = 1024;

/// Body for `POST /channels/{channel.id}/messages`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    /// Audit messages mention users for context but must never ping them.
    pub allowed_mentions: AllowedMentions,
}

impl CreateMessage {
    /// A message with a single embed.
    #[must_use]
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    /// Add leading text content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Mention parsing rules; the default allows none.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AllowedMentions {
    pub parse: Vec<String>,
}

/// A rich embed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    /// ISO 8601 timestamp shown in the footer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedThumbnail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

impl Embed {
    #[must_use]
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: Some(title.into()),
            color: Some(color),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a field. Empty values become `N/A` and long values are truncated,
    /// since Discord rejects both.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl AsRef<str>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: field_value(value.as_ref()),
            inline,
        });
        self
    }

    #[must_use]
    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(EmbedThumbnail { url: url.into() });
        self
    }

    #[must_use]
    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }
}

/// One name/value row of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedThumbnail {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Subset of the message object returned after posting.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub channel_id: String,
}

fn field_value(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return "N/A".to_string();
    }
    if value.chars().count() <= FIELD_VALUE_LIMIT {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(FIELD_VALUE_LIMIT - 1).collect();
    truncated.push('…');
    truncated
}
