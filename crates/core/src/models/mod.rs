//! Records shared by the storefront and admin binaries.
//!
//! These mirror rows of the `shop` schema. With the `postgres` feature they
//! derive `sqlx::FromRow`, so both binaries can select straight into them.

pub mod catalog;
pub mod customer;
pub mod order;

pub use catalog::{Category, Product};
pub use customer::Customer;
pub use order::{DeliveryLog, Order, OrderItem, Payment};
