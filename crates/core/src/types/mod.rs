//! Core types for Moonlit Promise.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod contact;
pub mod discord_id;
pub mod id;
pub mod order_number;
pub mod price;
pub mod slug;
pub mod status;

pub use contact::{ContactError, Phone, Pincode};
pub use discord_id::{DiscordId, DiscordIdError};
pub use id::*;
pub use order_number::{OrderNumber, OrderNumberError};
pub use price::{CurrencyCode, Price};
pub use slug::Slug;
pub use status::*;
