//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `otp` - COD phone verification codes
//! - `uploads` - Payment proof validation and storage
//! - `cleanup` - Periodic removal of spent OTPs and expired sessions
//! - `notify` - Audit messages for storefront events
//! - `payment` - UPI deep links and UTR checks

pub mod cleanup;
pub mod notify;
pub mod otp;
pub mod payment;
pub mod uploads;

pub use otp::{OtpError, OtpSender, OtpService};
pub use uploads::{LocalProofStore, ProofStore, ProofUpload, UploadError};
