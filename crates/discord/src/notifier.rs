//! Fire-and-forget audit notifications.
//!
//! Request handlers hand a message to the [`Notifier`] and move on; delivery
//! happens on a spawned task. A missing bot token or channel turns the
//! notification into a debug-level no-op, and Discord failures are logged,
//! never returned to the caller.

use tracing::{debug, info, warn};

use crate::client::DiscordClient;
use crate::types::CreateMessage;

/// The audit channel a message belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Login,
    Order,
    Payment,
    Delivery,
    Admin,
}

impl Channel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Order => "order",
            Self::Payment => "payment",
            Self::Delivery => "delivery",
            Self::Admin => "admin",
        }
    }
}

/// Channel IDs for each audit stream. Unset channels are skipped.
#[derive(Debug, Clone, Default)]
pub struct Channels {
    pub login: Option<String>,
    pub order: Option<String>,
    pub payment: Option<String>,
    pub delivery: Option<String>,
    pub admin: Option<String>,
}

impl Channels {
    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Login => self.login.as_deref(),
            Channel::Order => self.order.as_deref(),
            Channel::Payment => self.payment.as_deref(),
            Channel::Delivery => self.delivery.as_deref(),
            Channel::Admin => self.admin.as_deref(),
        }
    }
}

/// Guild role granted to customers once an order is approved.
#[derive(Debug, Clone)]
pub struct CustomerRole {
    pub guild_id: String,
    pub role_id: String,
}

/// Posts audit messages without blocking the caller.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    client: Option<DiscordClient>,
    channels: Channels,
    customer_role: Option<CustomerRole>,
}

impl Notifier {
    #[must_use]
    pub const fn new(
        client: Option<DiscordClient>,
        channels: Channels,
        customer_role: Option<CustomerRole>,
    ) -> Self {
        Self {
            client,
            channels,
            customer_role,
        }
    }

    /// A notifier that drops everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Whether a message for `channel` would actually be sent.
    #[must_use]
    pub fn is_enabled(&self, channel: Channel) -> bool {
        self.client.is_some() && self.channels.get(channel).is_some()
    }

    /// Post `message` to `channel` in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn notify(&self, channel: Channel, message: CreateMessage) {
        let (Some(client), Some(channel_id)) = (self.client.clone(), self.channels.get(channel))
        else {
            debug!(channel = channel.as_str(), "Discord notification skipped (not configured)");
            return;
        };
        let channel_id = channel_id.to_string();

        tokio::spawn(async move {
            if let Err(e) = client.post_message(&channel_id, &message).await {
                warn!(channel = channel.as_str(), error = %e, "Failed to send Discord notification");
            }
        });
    }

    /// Grant the configured customer role to `user_id` in the background.
    pub fn grant_customer_role(&self, user_id: &str) {
        let (Some(client), Some(role)) = (self.client.clone(), self.customer_role.clone()) else {
            debug!("Customer role grant skipped (not configured)");
            return;
        };
        let user_id = user_id.to_string();

        tokio::spawn(async move {
            match client
                .add_member_role(&role.guild_id, &user_id, &role.role_id)
                .await
            {
                Ok(()) => info!(user_id = %user_id, role_id = %role.role_id, "Customer role granted"),
                Err(e) => warn!(user_id = %user_id, error = %e, "Failed to grant customer role"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::types::Embed;

    #[test]
    fn test_disabled_notifier_is_noop() {
        let notifier = Notifier::disabled();
        assert!(!notifier.is_enabled(Channel::Order));
        // No runtime needed: nothing is spawned.
        notifier.notify(Channel::Order, CreateMessage::embed(Embed::new("x", 0)));
        notifier.grant_customer_role("1");
    }

    #[test]
    fn test_unconfigured_channel_is_skipped() {
        let notifier = Notifier::new(
            Some(DiscordClient::new(SecretString::from("token".to_string()))),
            Channels {
                order: Some("111".to_string()),
                ..Channels::default()
            },
            None,
        );
        assert!(notifier.is_enabled(Channel::Order));
        assert!(!notifier.is_enabled(Channel::Payment));
        notifier.notify(Channel::Payment, CreateMessage::default());
    }

    #[tokio::test]
    async fn test_notify_spawns_without_blocking() {
        let notifier = Notifier::new(
            Some(DiscordClient::with_api_base(
                SecretString::from("token".to_string()),
                "http://127.0.0.1:9",
            )),
            Channels {
                admin: Some("222".to_string()),
                ..Channels::default()
            },
            None,
        );
        // The request fails in the background; the caller is unaffected.
        notifier.notify(Channel::Admin, CreateMessage::default());
    }
}
