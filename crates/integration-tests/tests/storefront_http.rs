//! Storefront HTTP behaviour.
//!
//! These tests require:
//! - A running storefront (`cargo run -p moonlit-storefront`)
//! - `STOREFRONT_BASE_URL` if it is not on `http://localhost:3000`
//!
//! Run with: cargo test -p moonlit-integration-tests -- --ignored

#![allow(clippy::expect_used)]

use reqwest::StatusCode;

use moonlit_integration_tests::{client, storefront_base_url};

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("body"), "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_public_pages_render_with_security_headers() {
    let http = client();
    for path in ["/", "/shop", "/shop?category=all", "/about", "/terms"] {
        let resp = http
            .get(format!("{}{path}", storefront_base_url()))
            .send()
            .await
            .expect("Failed to reach storefront");

        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        assert!(resp.headers().contains_key("content-security-policy"), "{path}");
        assert_eq!(
            resp.headers()
                .get("x-content-type-options")
                .and_then(|v| v.to_str().ok()),
            Some("nosniff")
        );
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_product_redirects_to_shop() {
    let resp = client()
        .get(format!("{}/product/999999999", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert!(resp.status().is_redirection());
    assert_eq!(
        resp.headers().get("location").and_then(|v| v.to_str().ok()),
        Some("/shop")
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_signed_out_cart_and_checkout_redirect_to_login() {
    let http = client();
    for path in ["/cart", "/checkout", "/orders"] {
        let resp = http
            .get(format!("{}{path}", storefront_base_url()))
            .send()
            .await
            .expect("Failed to reach storefront");

        assert!(resp.status().is_redirection(), "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_tracking_unknown_order_is_not_found() {
    let resp = client()
        .get(format!("{}/track/MP-20240101-ZZZZZZ", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_discord_sign_in_redirects_with_state() {
    let resp = client()
        .get(format!("{}/auth/discord", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert!(resp.status().is_redirection());
    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert!(location.starts_with("https://discord.com/"));
    assert!(location.contains("state="));
}
