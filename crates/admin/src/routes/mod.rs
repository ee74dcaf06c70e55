//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/ready          - Liveness and readiness
//!
//! # Dashboard
//! GET  /                               - Counts and recent orders
//!
//! # Auth (Discord OAuth, allow-listed IDs only)
//! GET  /auth/login                     - Redirect to Discord
//! GET  /auth/callback                  - Handle OAuth callback
//! POST /auth/logout                    - Sign out
//!
//! # Orders
//! GET  /orders?payment=&delivery=      - Filtered order list
//! GET  /orders/{id}                    - Order detail and allowed actions
//! POST /orders/{id}/payment/verify     - Complete a manual payment
//! POST /orders/{id}/payment/reject     - Fail a payment
//! POST /orders/{id}/delivery           - Move the delivery status
//! GET  /proofs/{file}                  - Uploaded payment proof
//!
//! # Catalog
//! GET  /products                       - Product list
//! GET  /products/new                   - New product form
//! POST /products                       - Create product
//! GET  /products/{id}/edit             - Edit product form
//! POST /products/{id}                  - Update product
//! POST /products/{id}/delete           - Delete product
//! GET  /categories                     - Category list and forms
//! POST /categories                     - Create category
//! POST /categories/{id}                - Update category
//! POST /categories/{id}/delete         - Delete category
//!
//! # Customers
//! GET  /customers                      - Customers with order counts
//! ```

pub mod auth;
pub mod categories;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod proofs;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub username: String,
    pub discord_id: String,
    pub avatar_url: Option<String>,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            username: admin.username.clone(),
            discord_id: admin.id.to_string(),
            avatar_url: admin.avatar_url.clone(),
        }
    }
}

/// Trim a form field; blank becomes `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/payment/verify", post(orders::verify_payment))
        .route("/{id}/payment/reject", post(orders::reject_payment))
        .route("/{id}/delivery", post(orders::update_delivery))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new_form))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit_form))
        .route("/{id}/delete", post(products::delete))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/{id}", post(categories::update))
        .route("/{id}/delete", post(categories::delete))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/customers", get(customers::index))
        .route("/proofs/{file}", get(proofs::show))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth_routes())
        .nest("/orders", order_routes())
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("   ".into())), None);
        assert_eq!(non_empty(Some(" TRK1 ".into())), Some("TRK1".into()));
    }
}
