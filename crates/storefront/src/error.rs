//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry and answered with a generic message; client errors
//! carry their own message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{OtpError, UploadError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// OTP request or verification failed.
    #[error("{0}")]
    Otp(#[from] OtpError),

    /// Payment proof rejected or not stored.
    #[error("{0}")]
    Upload(#[from] UploadError),

    /// Discord sign-in failed.
    #[error("Discord error: {0}")]
    Discord(#[from] moonlit_discord::DiscordError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with existing data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::EmptyCart) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Otp(OtpError::TooManyRequests | OtpError::TooManyAttempts) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::Otp(e) if e.is_user_facing() => StatusCode::BAD_REQUEST,
            Self::Upload(UploadError::TooLarge) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upload(UploadError::Missing | UploadError::UnsupportedType) => {
                StatusCode::BAD_REQUEST
            }
            Self::Discord(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_)
            | Self::Otp(_)
            | Self::Upload(_)
            | Self::Session(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the customer.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::EmptyCart) => "Your cart is empty".to_string(),
            Self::Database(RepositoryError::Conflict(msg))
            | Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::Otp(e) if e.is_user_facing() => e.to_string(),
            Self::Otp(OtpError::Delivery(_)) => {
                "Could not send the code right now. Please try again.".to_string()
            }
            Self::Upload(UploadError::Io(_)) => "Could not save the upload".to_string(),
            Self::Upload(e) => e.to_string(),
            Self::Discord(_) => "Discord is unavailable, please try again".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Associate Sentry events with the signed-in customer.
pub fn set_sentry_user(user_id: &str, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Stop associating Sentry events with a customer.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(AppError::Database(RepositoryError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AppError::Database(RepositoryError::Conflict("dup".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AppError::Otp(OtpError::TooManyRequests)),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status(AppError::Otp(OtpError::InvalidCode { remaining: 3 })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AppError::Upload(UploadError::TooLarge)),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("secret detail".into()));
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::Otp(OtpError::Delivery("gateway 500".into()));
        assert!(!err.public_message().contains("gateway"));
    }

    #[test]
    fn test_user_messages_pass_through() {
        let err = AppError::BadRequest("Phone number not verified".into());
        assert_eq!(err.public_message(), "Phone number not verified");
        assert_eq!(
            AppError::Otp(OtpError::TooManyRequests).public_message(),
            "Too many attempts. Please try again later."
        );
    }
}
