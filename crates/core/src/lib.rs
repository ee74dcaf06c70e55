//! Moonlit Core - Shared types library.
//!
//! This crate provides common types used across all Moonlit Promise components:
//! - `storefront` - Public-facing shop (Discord sign-in, cart, checkout, tracking)
//! - `admin` - Administration panel for the catalog and order lifecycle
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, contact details, and statuses
//! - [`lifecycle`] - The order payment/delivery state machine
//! - [`models`] - Records of the shop schema shared by both binaries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod lifecycle;
pub mod models;
pub mod types;

pub use lifecycle::{DeliveryOutcome, OrderState, TransitionError};
pub use models::*;
pub use types::*;
