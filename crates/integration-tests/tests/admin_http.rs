//! Admin HTTP behaviour for signed-out visitors.
//!
//! These tests require:
//! - A running admin panel (`cargo run -p moonlit-admin`)
//! - `ADMIN_BASE_URL` if it is not on `http://localhost:3001`
//!
//! Run with: cargo test -p moonlit-integration-tests -- --ignored

#![allow(clippy::expect_used)]

use reqwest::StatusCode;

use moonlit_integration_tests::{admin_base_url, client};

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", admin_base_url()))
        .send()
        .await
        .expect("Failed to reach admin");

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_pages_redirect_to_login() {
    let http = client();
    for path in ["/", "/orders", "/orders/1", "/products", "/categories", "/customers"] {
        let resp = http
            .get(format!("{}{path}", admin_base_url()))
            .send()
            .await
            .expect("Failed to reach admin");

        assert!(resp.status().is_redirection(), "{path}");
        assert_eq!(
            resp.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/auth/login"),
            "{path}"
        );
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_actions_require_sign_in() {
    let resp = client()
        .post(format!("{}/orders/1/payment/verify", admin_base_url()))
        .form(&[("transaction_ref", "UTR1")])
        .send()
        .await
        .expect("Failed to reach admin");

    assert!(resp.status().is_redirection());
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_proofs_are_not_public() {
    let resp = client()
        .get(format!("{}/proofs/1700000000000-deadbeef.png", admin_base_url()))
        .send()
        .await
        .expect("Failed to reach admin");

    assert!(resp.status().is_redirection());
    assert_eq!(
        resp.headers()
            .get("cache-control")
            .and_then(|v| v.to_str().ok()),
        Some("no-store, max-age=0")
    );
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_login_redirects_to_discord() {
    let resp = client()
        .get(format!("{}/auth/login", admin_base_url()))
        .send()
        .await
        .expect("Failed to reach admin");

    assert!(resp.status().is_redirection());
    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert!(location.starts_with("https://discord.com/"));
    assert!(location.contains("auth%2Fcallback") || location.contains("auth/callback"));
}
