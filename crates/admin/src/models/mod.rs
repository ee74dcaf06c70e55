//! Domain models for admin.
//!
//! Shop records (orders, products, customers) come from `moonlit_core`;
//! this module holds what only the panel needs.

pub mod session;

pub use session::{CurrentAdmin, keys as session_keys};
