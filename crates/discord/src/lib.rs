//! Discord integration for Moonlit Promise.
//!
//! This crate provides:
//! - [`DiscordOAuth`] for "Sign in with Discord" (storefront and admin)
//! - [`DiscordClient`] for bot calls: posting messages and granting roles
//! - Embed types and builders for the audit channels
//! - [`Notifier`] for fire-and-forget delivery of audit messages
//!
//! # Channels
//!
//! Each audit stream (logins, orders, payments, deliveries, admin actions)
//! posts to its own channel, configured by ID. Any stream can be left
//! unconfigured.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod client;
mod error;
pub mod messages;
mod notifier;
mod oauth;
mod types;

pub use client::{DISCORD_API_BASE, DiscordClient};
pub use error::DiscordError;
pub use messages::{LineSummary, OrderSummary};
pub use notifier::{Channel, Channels, CustomerRole, Notifier};
pub use oauth::{DiscordOAuth, DiscordUser, TokenResponse};
pub use types::{CreateMessage, Embed, EmbedField, MessageResponse};
