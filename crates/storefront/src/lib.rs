//! Moonlit Promise storefront library.
//!
//! Everything the storefront binary serves lives here so it can be tested
//! and reused (the CLI runs the same cleanup pass as the background task).
//!
//! # Security
//!
//! This crate only has access to:
//! - Discord OAuth (identify scope) and the audit bot token
//! - The `shop` schema of the shared `PostgreSQL` database
//!
//! Payment verification and delivery updates live in the admin binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
