//! Integration tests for Moonlit Promise.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! mp-cli migrate all
//!
//! # Start both servers for the HTTP tests
//! cargo run -p moonlit-storefront &
//! cargo run -p moonlit-admin &
//!
//! # Run the ignored tests
//! cargo test -p moonlit-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_http` - Public pages, auth gates, and headers
//! - `admin_http` - Admin auth gates and sign-in redirect
//! - `order_lifecycle` - Checkout and admin transitions against `PostgreSQL`
//! - `checkout_rules` - OTP quota and guesses, cart limits, catalog conflicts

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use moonlit_admin::db::{AdminCatalogRepository, ProductInput};
use moonlit_core::{DiscordId, PaymentMethod, Phone, Pincode, Product};
use moonlit_storefront::db::{CartRepository, NewOrder, OrderRepository, PlacedOrder, UserRepository};
use moonlit_storefront::services::{OtpError, OtpSender, OtpService};

/// Base URL of a running storefront.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL of a running admin panel.
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A cookie-keeping client that does not follow redirects.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Connect to the test database (`DATABASE_URL`).
pub async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    moonlit_storefront::db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database")
}

/// A fresh, unique Discord snowflake.
#[must_use]
pub fn unique_discord_id() -> DiscordId {
    let n = Uuid::new_v4().as_u128() % 800_000_000_000_000_000 + 100_000_000_000_000_000;
    DiscordId::parse(&n.to_string()).expect("18 digit snowflake")
}

/// Insert a customer who has signed in once.
pub async fn create_customer(pool: &PgPool) -> DiscordId {
    let id = unique_discord_id();
    UserRepository::new(pool)
        .upsert_from_discord(&id, "integration-test", None)
        .await
        .expect("Failed to create customer");
    id
}

/// Insert an active product with a unique name.
pub async fn create_product(pool: &PgPool, price: Decimal) -> Product {
    AdminCatalogRepository::new(pool)
        .create_product(&ProductInput {
            category_id: None,
            name: format!("Test Gown {}", Uuid::new_v4()),
            description: None,
            price,
            image_url: None,
            is_active: true,
        })
        .await
        .expect("Failed to create product")
}

/// Put `quantity` units of a new product in a new customer's cart and
/// check out.
pub async fn place_order(
    pool: &PgPool,
    method: PaymentMethod,
    phone_verified: bool,
    transaction_ref: Option<&str>,
) -> PlacedOrder {
    let user_id = create_customer(pool).await;
    let product = create_product(pool, Decimal::new(29999, 2)).await;
    let cart = CartRepository::new(pool);
    cart.add(&user_id, product.id).await.expect("add to cart");
    cart.add(&user_id, product.id).await.expect("add to cart");

    OrderRepository::new(pool)
        .create_from_cart(&NewOrder {
            user_id,
            full_name: "Asha Test".to_string(),
            phone: Phone::parse("9876543210").expect("valid phone"),
            address: "12 Moonlight Lane, Pune".to_string(),
            pincode: Pincode::parse("411001").expect("valid pincode"),
            payment_method: method,
            phone_verified,
            proof_path: None,
            transaction_ref: transaction_ref.map(str::to_string),
        })
        .await
        .expect("Failed to place order")
}

/// A fresh, unique Indian mobile number.
#[must_use]
pub fn unique_phone() -> Phone {
    let n = Uuid::new_v4().as_u128() % 1_000_000_000;
    Phone::parse(&format!("9{n:09}")).expect("valid phone")
}

/// Keeps every OTP message instead of sending it.
#[derive(Debug, Default)]
pub struct CapturingSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingSender {
    /// The code in the newest message sent to `phone`.
    #[must_use]
    pub fn last_code(&self, phone: &Phone) -> Option<String> {
        let sent = self.sent.lock().expect("sender lock");
        sent.iter()
            .rev()
            .find(|(to, _)| to == phone.as_str())
            .and_then(|(_, message)| {
                message
                    .split(|c: char| !c.is_ascii_digit())
                    .find(|word| word.len() == 6)
                    .map(str::to_string)
            })
    }

    /// Messages sent to `phone`.
    #[must_use]
    pub fn count(&self, phone: &Phone) -> usize {
        let sent = self.sent.lock().expect("sender lock");
        sent.iter().filter(|(to, _)| to == phone.as_str()).count()
    }
}

#[async_trait]
impl OtpSender for CapturingSender {
    async fn send(&self, phone: &Phone, message: &str) -> Result<(), OtpError> {
        self.sent
            .lock()
            .expect("sender lock")
            .push((phone.as_str().to_string(), message.to_string()));
        Ok(())
    }
}

/// An OTP service whose messages land in the returned sender.
#[must_use]
pub fn otp_service(pool: &PgPool) -> (OtpService, Arc<CapturingSender>) {
    let sender = Arc::new(CapturingSender::default());
    let key = SecretString::from("integration-otp-key-k7Yp2mQx9vLz4nRt".to_string());
    let service = OtpService::new(pool.clone(), key, sender.clone());
    (service, sender)
}

/// Shift every OTP request for `phone` into the past.
pub async fn backdate_otp_requests(pool: &PgPool, phone: &Phone, minutes: i32) {
    sqlx::query(
        r"
        UPDATE shop.otp_requests
           SET created_at = created_at - make_interval(mins => $2),
               expires_at = expires_at - make_interval(mins => $2)
         WHERE phone = $1
        ",
    )
    .bind(phone.as_str())
    .bind(minutes)
    .execute(pool)
    .await
    .expect("Failed to backdate OTP requests");
}
