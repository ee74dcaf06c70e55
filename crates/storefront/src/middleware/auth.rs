//! Authentication extractors.
//!
//! Provides extractors for requiring a Discord-authenticated customer in
//! route handlers.

use axum::{
    extract::FromRequestParts,
    http::{Method, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::warn;

use crate::models::{CurrentUser, keys};

/// Extractor that requires a signed-in customer.
///
/// If nobody is signed in, page requests are redirected to Discord sign-in
/// and JSON endpoints get a 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but nobody is signed in.
pub enum AuthRejection {
    /// Redirect to Discord sign-in (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for JSON requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/discord").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// JSON endpoints answer 401 instead of redirecting.
fn is_json_endpoint(path: &str) -> bool {
    path.starts_with("/checkout/otp/")
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: Option<CurrentUser> = session.get(keys::CURRENT_USER).await.ok().flatten();
        if let Some(user) = user {
            return Ok(Self(user));
        }

        let path = parts.uri.path();
        if is_json_endpoint(path) {
            return Err(AuthRejection::Unauthorized);
        }
        if parts.method == Method::GET {
            if let Err(e) = session.insert(keys::RETURN_TO, path).await {
                warn!(error = %e, "Failed to store return path");
            }
        }
        Err(AuthRejection::RedirectToLogin)
    }
}

/// Extractor that optionally gets the signed-in customer.
///
/// Unlike `RequireAuth`, this never rejects the request.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Whether `path` is a safe post-sign-in redirect target on this site.
#[must_use]
pub fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// Store the signed-in customer in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CURRENT_USER, user).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;
    use crate::middleware::session::testing::unavailable_session;

    fn parts(method: Method, path: &str) -> Parts {
        let (mut parts, ()) = Request::builder()
            .method(method)
            .uri(path)
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(unavailable_session());
        parts
    }

    #[tokio::test]
    async fn test_unreachable_session_store_still_redirects_to_login() {
        let mut page = parts(Method::GET, "/cart");
        let rejection = RequireAuth::from_request_parts(&mut page, &()).await;
        assert!(matches!(rejection, Err(AuthRejection::RedirectToLogin)));

        let mut otp = parts(Method::POST, "/checkout/otp/request");
        let rejection = RequireAuth::from_request_parts(&mut otp, &()).await;
        assert!(matches!(rejection, Err(AuthRejection::Unauthorized)));
    }

    #[tokio::test]
    async fn test_optional_auth_is_anonymous_when_store_is_down() {
        let mut page = parts(Method::GET, "/");
        let OptionalAuth(user) = OptionalAuth::from_request_parts(&mut page, &())
            .await
            .unwrap();
        assert!(user.is_none());
    }

    #[test]
    fn test_json_endpoints() {
        assert!(is_json_endpoint("/checkout/otp/request"));
        assert!(is_json_endpoint("/checkout/otp/verify"));
        assert!(!is_json_endpoint("/checkout"));
        assert!(!is_json_endpoint("/cart"));
    }

    #[test]
    fn test_local_paths() {
        assert!(is_local_path("/cart"));
        assert!(is_local_path("/orders/MP-20240115-7K2QZD"));
        assert!(!is_local_path("//evil.example"));
        assert!(!is_local_path("https://evil.example"));
        assert!(!is_local_path("/\\evil.example"));
    }

    #[test]
    fn test_rejections() {
        assert_eq!(
            AuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        let redirect = AuthRejection::RedirectToLogin.into_response();
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            redirect.headers().get("location").map(|v| v.to_str().ok()),
            Some(Some("/auth/discord"))
        );
    }
}
