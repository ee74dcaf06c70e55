//! Moonlit Promise admin library.
//!
//! This crate provides the admin panel as a library, allowing it to be
//! tested and reused.
//!
//! # Security
//!
//! This crate holds HIGH PRIVILEGE access:
//! - Payment verification and the order lifecycle
//! - Catalog management
//! - Uploaded payment proofs
//!
//! Sign-in is Discord OAuth restricted to the configured admin ID list.

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
