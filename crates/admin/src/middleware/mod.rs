//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. Security headers (stricter CSP for admin)
//! 5. `RequireAdmin` extractor on every protected handler

pub mod auth;
pub mod security_headers;
pub mod session;

pub use auth::{AdminAuthRejection, RequireAdmin, set_current_admin};
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_store};
