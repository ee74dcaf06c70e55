//! Storefront-only models.
//!
//! Row types shared with the admin panel live in `moonlit_core::models`.

pub mod cart;
pub mod session;

pub use cart::{CartLine, cart_total};
pub use session::{CurrentUser, keys};
