//! Business logic services for admin.
//!
//! # Services
//!
//! - `notify` - Audit messages for payment, delivery, catalog, and sign-in events
//! - `proofs` - Locating uploaded payment proofs on disk

pub mod notify;
pub mod proofs;

pub use proofs::{ProofError, ProofFile, resolve_proof};
