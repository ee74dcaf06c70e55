//! Admin sign-in with Discord.
//!
//! Same OAuth flow as the storefront, with the panel's own redirect URI.
//! Only allow-listed Discord IDs get a session; everyone else sees a 403
//! page and the attempt is reported to the admin channel.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rand::distr::{Alphanumeric, SampleString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info, instrument, warn};

use moonlit_core::DiscordId;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::set_current_admin;
use crate::models::{CurrentAdmin, session_keys};
use crate::services::notify;
use crate::state::AppState;

/// Length of the OAuth CSRF state.
const STATE_LEN: usize = 32;

/// Query parameters from the Discord OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Sign-in outcome page (refusals, failures, signed out).
#[derive(Template, WebTemplate)]
#[template(path = "auth/message.html")]
pub struct AuthMessageTemplate {
    pub title: &'static str,
    pub message: String,
}

fn auth_page(status: StatusCode, title: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        AuthMessageTemplate {
            title,
            message: message.into(),
        },
    )
        .into_response()
}

fn sign_in_failed() -> Response {
    auth_page(
        StatusCode::BAD_GATEWAY,
        "Sign-in failed",
        "Discord sign-in did not complete. Please try again.",
    )
}

/// Start Discord sign-in.
///
/// # Route
///
/// `GET /auth/login`
#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, session: Session) -> Response {
    let oauth_state = Alphanumeric.sample_string(&mut rand::rng(), STATE_LEN);

    if let Err(e) = session.insert(session_keys::OAUTH_STATE, &oauth_state).await {
        error!(error = %e, "Failed to store OAuth state in session");
        return sign_in_failed();
    }

    let url = state
        .oauth()
        .authorization_url(&state.config().discord_redirect_uri(), &oauth_state);
    Redirect::to(&url).into_response()
}

/// Finish Discord sign-in and check the allow-list.
///
/// # Route
///
/// `GET /auth/callback`
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(err) = query.error {
        info!(error = %err, "Discord sign-in declined");
        return auth_page(
            StatusCode::BAD_REQUEST,
            "Sign-in cancelled",
            "Discord sign-in was cancelled.",
        );
    }

    let expected: Option<String> = session
        .remove(session_keys::OAUTH_STATE)
        .await
        .ok()
        .flatten();
    let (Some(code), Some(returned)) = (query.code, query.state) else {
        return auth_page(
            StatusCode::BAD_REQUEST,
            "Sign-in failed",
            "The sign-in link is incomplete.",
        );
    };
    if expected.as_deref() != Some(returned.as_str()) {
        warn!("OAuth state mismatch");
        return auth_page(
            StatusCode::BAD_REQUEST,
            "Sign-in failed",
            "The sign-in link has expired. Please start again.",
        );
    }

    let redirect_uri = state.config().discord_redirect_uri();
    let token = match state.oauth().exchange_code(&code, &redirect_uri).await {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Discord token exchange failed");
            return sign_in_failed();
        }
    };
    let discord_user = match state.oauth().fetch_user(&token.access_token).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "Discord user lookup failed");
            return sign_in_failed();
        }
    };

    let id = match DiscordId::parse(&discord_user.id) {
        Ok(id) if state.config().is_admin(&id) => id,
        _ => {
            warn!(
                discord_id = %discord_user.id,
                username = %discord_user.display_name(),
                "Admin sign-in refused"
            );
            notify::admin_denied(
                state.notifier(),
                &discord_user.id,
                discord_user.display_name(),
            );
            return auth_page(
                StatusCode::FORBIDDEN,
                "Access denied",
                "Your Discord account is not an administrator.",
            );
        }
    };

    let admin = CurrentAdmin {
        id,
        username: discord_user.display_name().to_string(),
        avatar_url: discord_user.avatar_url(),
    };

    // Fresh session ID on privilege change.
    if let Err(e) = session.cycle_id().await {
        error!(error = %e, "Failed to cycle session ID");
        return sign_in_failed();
    }
    if let Err(e) = set_current_admin(&session, &admin).await {
        error!(error = %e, "Failed to store admin in session");
        return sign_in_failed();
    }

    set_sentry_user(admin.id.as_str(), &admin.username);
    notify::admin_login(state.notifier(), &admin);
    info!(actor = %admin.id, "Admin signed in");

    Redirect::to("/").into_response()
}

/// Sign out.
///
/// # Route
///
/// `POST /auth/logout`
pub async fn logout(session: Session) -> Response {
    if let Err(e) = session.flush().await {
        error!(error = %e, "Failed to clear session");
    }
    clear_sentry_user();
    auth_page(StatusCode::OK, "Signed out", "You have been signed out.")
}
