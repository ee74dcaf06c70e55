//! Checkout rules against a real database: OTP limits, cart limits, and
//! catalog conflicts.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (`mp-cli migrate all`)
//! - `DATABASE_URL` pointing at it
//!
//! Run with: cargo test -p moonlit-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::http::StatusCode;
use axum::response::IntoResponse;
use rust_decimal::Decimal;
use uuid::Uuid;

use moonlit_admin::db::{AdminCatalogRepository, CategoryInput};
use moonlit_core::{PaymentMethod, Phone, Pincode, Slug};
use moonlit_integration_tests::{
    backdate_otp_requests, create_customer, create_product, otp_service, test_pool, unique_phone,
};
use moonlit_storefront::db::cart::MAX_QUANTITY;
use moonlit_storefront::db::{CartRepository, NewOrder, OrderRepository, RepositoryError};
use moonlit_storefront::services::OtpError;
use moonlit_storefront::services::cleanup;
use moonlit_storefront::services::otp::{MAX_ATTEMPTS, MAX_REQUESTS_PER_HOUR};

fn wrong_code(code: &str) -> &'static str {
    if code == "000000" { "111111" } else { "000000" }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_fourth_otp_request_in_an_hour_is_refused() {
    let pool = test_pool().await;
    let (otp, sender) = otp_service(&pool);
    let phone = unique_phone();

    for _ in 0..MAX_REQUESTS_PER_HOUR {
        otp.request(&phone).await.unwrap();
    }
    let fourth = otp.request(&phone).await;

    assert!(matches!(fourth, Err(OtpError::TooManyRequests)));
    assert_eq!(
        fourth.unwrap_err().to_string(),
        "Too many attempts. Please try again later."
    );
    assert_eq!(sender.count(&phone), 3);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_cleanup_keeps_requests_inside_the_quota_window() {
    let pool = test_pool().await;
    let (otp, _sender) = otp_service(&pool);
    let phone = unique_phone();

    for _ in 0..MAX_REQUESTS_PER_HOUR {
        otp.request(&phone).await.unwrap();
    }

    // Expired, but still within the hour.
    backdate_otp_requests(&pool, &phone, 6).await;
    cleanup::run_once(&pool).await.unwrap();
    assert!(matches!(
        otp.request(&phone).await,
        Err(OtpError::TooManyRequests)
    ));

    // Out of the window: cleanup removes them and the quota resets.
    backdate_otp_requests(&pool, &phone, 61).await;
    cleanup::run_once(&pool).await.unwrap();
    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM shop.otp_requests WHERE phone = $1")
            .bind(phone.as_str())
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(remaining, 0);
    assert!(otp.request(&phone).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_concurrent_otp_requests_share_one_quota() {
    let pool = test_pool().await;
    let (otp, sender) = otp_service(&pool);
    let phone = unique_phone();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let otp = otp.clone();
            let phone = phone.clone();
            tokio::spawn(async move { otp.request(&phone).await })
        })
        .collect();

    let mut granted = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => granted += 1,
            Err(OtpError::TooManyRequests) => refused += 1,
            Err(e) => panic!("unexpected OTP error: {e}"),
        }
    }

    assert_eq!(granted, 3);
    assert_eq!(refused, 7);
    assert_eq!(sender.count(&phone), 3);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_code_verifies_once() {
    let pool = test_pool().await;
    let (otp, sender) = otp_service(&pool);
    let phone = unique_phone();

    otp.request(&phone).await.unwrap();
    let code = sender.last_code(&phone).unwrap();

    assert!(otp.verify(&phone, &code).await.is_ok());
    assert!(matches!(
        otp.verify(&phone, &code).await,
        Err(OtpError::Expired)
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_five_wrong_codes_burn_the_request() {
    let pool = test_pool().await;
    let (otp, sender) = otp_service(&pool);
    let phone = unique_phone();

    otp.request(&phone).await.unwrap();
    let code = sender.last_code(&phone).unwrap();
    let wrong = wrong_code(&code);

    for remaining in (1..MAX_ATTEMPTS).rev() {
        match otp.verify(&phone, wrong).await {
            Err(OtpError::InvalidCode { remaining: left }) => assert_eq!(left, remaining),
            other => panic!("expected an invalid code, got {other:?}"),
        }
    }
    assert!(matches!(
        otp.verify(&phone, wrong).await,
        Err(OtpError::TooManyAttempts)
    ));

    // The right code no longer works either.
    assert!(matches!(
        otp.verify(&phone, &code).await,
        Err(OtpError::Expired)
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_expired_code_is_rejected() {
    let pool = test_pool().await;
    let (otp, sender) = otp_service(&pool);
    let phone = unique_phone();

    otp.request(&phone).await.unwrap();
    let code = sender.last_code(&phone).unwrap();
    backdate_otp_requests(&pool, &phone, 6).await;

    assert!(matches!(
        otp.verify(&phone, &code).await,
        Err(OtpError::Expired)
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_cart_quantity_is_capped() {
    let pool = test_pool().await;
    let cart = CartRepository::new(&pool);
    let user_id = create_customer(&pool).await;
    let product = create_product(&pool, Decimal::new(14999, 2)).await;

    let mut line_id = None;
    for _ in 0..12 {
        line_id = Some(cart.add(&user_id, product.id).await.unwrap());
    }
    let line_id = line_id.unwrap();

    let lines = cart.lines(&user_id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines.first().unwrap().quantity, MAX_QUANTITY);

    cart.set_quantity(&user_id, line_id, 50).await.unwrap();
    assert_eq!(
        cart.lines(&user_id).await.unwrap().first().unwrap().quantity,
        MAX_QUANTITY
    );

    let stranger = create_customer(&pool).await;
    assert!(matches!(
        cart.set_quantity(&stranger, line_id, 2).await,
        Err(RepositoryError::NotFound)
    ));

    cart.set_quantity(&user_id, line_id, 0).await.unwrap();
    assert!(cart.lines(&user_id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_checkout_with_empty_cart_is_refused() {
    let pool = test_pool().await;
    let user_id = create_customer(&pool).await;

    let result = OrderRepository::new(&pool)
        .create_from_cart(&NewOrder {
            user_id,
            full_name: "Asha Test".to_string(),
            phone: Phone::parse("9876543210").unwrap(),
            address: "12 Moonlight Lane, Pune".to_string(),
            pincode: Pincode::parse("411001").unwrap(),
            payment_method: PaymentMethod::Cod,
            phone_verified: true,
            proof_path: None,
            transaction_ref: None,
        })
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, RepositoryError::EmptyCart));
    let response = moonlit_storefront::error::AppError::from(err).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with migrations applied"]
async fn test_duplicate_category_slug_is_a_conflict() {
    let pool = test_pool().await;
    let repo = AdminCatalogRepository::new(&pool);
    let tag = Uuid::new_v4().simple().to_string();

    let input = |name: String| CategoryInput {
        slug: Slug::from_name(&name).unwrap(),
        name,
        description: None,
    };

    repo.create_category(&input(format!("Moon Gowns {tag}")))
        .await
        .unwrap();
    let err = repo
        .create_category(&input(format!("MOON gowns {tag}!")))
        .await
        .unwrap_err();

    assert!(matches!(err, moonlit_admin::db::RepositoryError::Conflict(_)));
    let response = moonlit_admin::error::AppError::from(err).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
