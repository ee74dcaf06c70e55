//! Rate limiting using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: sign-in endpoints (~10/min per IP)
//! - `otp_rate_limiter`: OTP request and verify (~4/min per IP)
//!
//! The OTP limiter sits in front of the per-phone quota enforced by the OTP
//! service; it stops a single client from cycling through phone numbers.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Client IP from proxy headers, most trusted first.
const IP_HEADERS: [&str; 4] = [
    "cf-connecting-ip",
    "fly-client-ip",
    "x-real-ip",
    "x-forwarded-for",
];

/// Key extractor that reads the client IP from Cloudflare and Fly.io headers,
/// falling back to the socket peer when no proxy is in front.
#[derive(Clone, Copy)]
pub struct ProxyIpKeyExtractor;

fn client_ip<T>(req: &Request<T>) -> Option<IpAddr> {
    IP_HEADERS
        .iter()
        .find_map(|name| {
            req.headers()
                .get(*name)
                .and_then(|v| v.to_str().ok())
                // X-Forwarded-For holds a chain; the client is first.
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        })
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
}

impl tower_governor::key_extractor::KeyExtractor for ProxyIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req).ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ProxyIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn limiter(replenish_secs: u64, burst: u32) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ProxyIpKeyExtractor)
        .per_second(replenish_secs)
        .burst_size(burst)
        .finish()
        .expect("rate limiter config with non-zero period and burst is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Rate limiter for Discord sign-in: 1 token every 6 seconds, burst of 5.
///
/// # Panics
///
/// Never; the period and burst are non-zero constants.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    limiter(6, 5)
}

/// Rate limiter for OTP endpoints: 1 token every 15 seconds, burst of 3.
///
/// # Panics
///
/// Never; the period and burst are non-zero constants.
#[must_use]
pub fn otp_rate_limiter() -> RateLimiterLayer {
    limiter(15, 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/checkout/otp/request");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap_or_default()
    }

    #[test]
    fn test_prefers_cloudflare_header() {
        let req = request(&[
            ("x-forwarded-for", "10.0.0.1, 10.0.0.2"),
            ("cf-connecting-ip", "203.0.113.7"),
        ]);
        assert_eq!(client_ip(&req), "203.0.113.7".parse().ok());
    }

    #[test]
    fn test_uses_first_forwarded_for_entry() {
        let req = request(&[("x-forwarded-for", "198.51.100.4, 10.0.0.2")]);
        assert_eq!(client_ip(&req), "198.51.100.4".parse().ok());
    }

    #[test]
    fn test_no_headers_no_key() {
        assert!(client_ip(&request(&[])).is_none());
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = request(&[]);
        let peer: SocketAddr = "192.0.2.9:51234".parse().unwrap_or_else(|e| panic!("{e}"));
        req.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(client_ip(&req), Some(peer.ip()));
    }
}
