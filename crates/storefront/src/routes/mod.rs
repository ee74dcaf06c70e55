//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page (newest products)
//! GET  /about, /terms             - Static pages
//! GET  /shop?category=slug        - Product listing
//! GET  /product/{id}              - Product detail
//!
//! # Auth (Discord OAuth)
//! GET  /auth/discord              - Redirect to Discord
//! GET  /auth/discord/callback     - Handle OAuth callback
//! POST /auth/logout               - Sign out
//!
//! # Cart (requires auth)
//! GET  /cart                      - Cart page
//! POST /cart/add/{product_id}     - Add one unit
//! POST /cart/update/{item_id}     - Set quantity (0 removes)
//! POST /cart/remove/{item_id}     - Remove line
//!
//! # Checkout (requires auth)
//! GET  /checkout                  - Checkout page
//! POST /checkout/otp/request      - Send COD code (JSON)
//! POST /checkout/otp/verify       - Verify COD code (JSON)
//! POST /checkout/cod              - Place COD order
//! POST /checkout/manual           - Place UPI order with proof (multipart)
//!
//! # Orders
//! GET  /orders                    - Order history (requires auth)
//! GET  /orders/{number}           - Order detail (owner only)
//! GET  /track/{number}            - Public tracking
//!
//! GET  /health, /health/ready     - Liveness and readiness
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod pages;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
};
use tracing::warn;

use crate::db::CartRepository;
use crate::middleware::{auth_rate_limiter, otp_rate_limiter};
use crate::models::CurrentUser;
use crate::services::uploads::MAX_PROOF_BYTES;
use crate::state::AppState;

/// Header data shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub user: Option<CurrentUser>,
    pub cart_count: i64,
}

impl Nav {
    /// Build the header for `user`, looking up their cart size.
    pub async fn load(state: &AppState, user: Option<CurrentUser>) -> Self {
        let cart_count = match &user {
            Some(u) => CartRepository::new(state.pool())
                .count(&u.id)
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Failed to count cart items");
                    0
                }),
            None => 0,
        };
        Self { user, cart_count }
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/discord", get(auth::login))
        .route("/discord/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
        .route_layer(auth_rate_limiter())
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{product_id}", post(cart::add))
        .route("/update/{item_id}", post(cart::update))
        .route("/remove/{item_id}", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    let otp = Router::new()
        .route("/request", post(checkout::otp_request))
        .route("/verify", post(checkout::otp_verify))
        .route_layer(otp_rate_limiter());

    Router::new()
        .route("/", get(checkout::show))
        .route("/cod", post(checkout::place_cod))
        .route(
            "/manual",
            // Headroom over the image limit for the other form fields.
            post(checkout::place_manual).layer(DefaultBodyLimit::max(MAX_PROOF_BYTES + 64 * 1024)),
        )
        .nest("/otp", otp)
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{number}", get(orders::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route("/terms", get(pages::terms))
        .route("/shop", get(catalog::shop))
        .route("/product/{id}", get(catalog::product))
        .route("/track/{number}", get(orders::track))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
}

/// Liveness health check. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check. Returns 503 if the database is unreachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
