//! Authentication extractors for admin.
//!
//! Provides the [`RequireAdmin`] extractor for route handlers. The session
//! only remembers who signed in; whether they are still an admin is decided
//! against the configured allow-list on every request.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::warn;

use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in admin on the allow-list.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.username)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Error returned when an admin is required.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Nobody signed in: redirect to Discord sign-in.
    RedirectToLogin,
    /// Session layer missing.
    Unauthorized,
    /// Signed in, but no longer on the allow-list.
    Forbidden,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Your Discord account is not an administrator",
            )
                .into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or(AdminAuthRejection::RedirectToLogin)?;

        if !state.config().is_admin(&admin.id) {
            warn!(discord_id = %admin.id, "Signed-in user is no longer on the admin allow-list");
            if let Err(e) = session.flush().await {
                warn!(error = %e, "Failed to clear revoked admin session");
            }
            return Err(AdminAuthRejection::Forbidden);
        }

        Ok(Self(admin))
    }
}

/// Helper to set the current admin in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections() {
        let redirect = AdminAuthRejection::RedirectToLogin.into_response();
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            redirect.headers().get("location").map(|v| v.to_str().ok()),
            Some(Some("/auth/login"))
        );
        assert_eq!(
            AdminAuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AdminAuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
