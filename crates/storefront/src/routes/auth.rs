//! Discord sign-in route handlers.
//!
//! - Login: stores a random state in the session and redirects to Discord
//! - Callback: checks the state, exchanges the code, upserts the customer,
//!   and stores them in the session
//! - Logout: clears the session

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rand::distr::{Alphanumeric, SampleString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info, instrument, warn};

use moonlit_core::DiscordId;

use crate::db::UserRepository;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::auth::is_local_path;
use crate::middleware::set_current_user;
use crate::models::{CurrentUser, keys};
use crate::services::notify;
use crate::state::AppState;

/// Length of the OAuth CSRF state.
const STATE_LEN: usize = 32;

/// Query parameters from the Discord OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set when the user declined or Discord failed.
    pub error: Option<String>,
}

fn fail(code: &str) -> Response {
    Redirect::to(&format!("/?error={}", urlencoding::encode(code))).into_response()
}

/// Start Discord sign-in.
///
/// # Route
///
/// `GET /auth/discord`
#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, session: Session) -> Response {
    let oauth_state = Alphanumeric.sample_string(&mut rand::rng(), STATE_LEN);

    if let Err(e) = session.insert(keys::OAUTH_STATE, &oauth_state).await {
        error!(error = %e, "Failed to store OAuth state in session");
        return fail("session");
    }

    let url = state
        .oauth()
        .authorization_url(&state.config().discord_redirect_uri(), &oauth_state);
    Redirect::to(&url).into_response()
}

/// Finish Discord sign-in.
///
/// # Route
///
/// `GET /auth/discord/callback`
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(err) = query.error {
        info!(error = %err, "Discord sign-in declined");
        return fail(&err);
    }

    let expected: Option<String> = session.remove(keys::OAUTH_STATE).await.ok().flatten();
    let (Some(code), Some(returned)) = (query.code, query.state) else {
        return fail("missing_code");
    };
    if expected.as_deref() != Some(returned.as_str()) {
        warn!("OAuth state mismatch");
        return fail("state");
    }

    let redirect_uri = state.config().discord_redirect_uri();
    let token = match state.oauth().exchange_code(&code, &redirect_uri).await {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Discord token exchange failed");
            return fail("token");
        }
    };
    let discord_user = match state.oauth().fetch_user(&token.access_token).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "Discord user lookup failed");
            return fail("profile");
        }
    };

    let Ok(id) = DiscordId::parse(&discord_user.id) else {
        error!(id = %discord_user.id, "Discord returned an invalid user ID");
        return fail("profile");
    };
    let avatar_url = discord_user.avatar_url();

    if let Err(e) = UserRepository::new(state.pool())
        .upsert_from_discord(&id, discord_user.display_name(), avatar_url.as_deref())
        .await
    {
        error!(error = %e, "Failed to save customer");
        return fail("database");
    }

    let user = CurrentUser {
        id,
        username: discord_user.display_name().to_string(),
        avatar_url,
    };

    // Fresh session ID on privilege change.
    if let Err(e) = session.cycle_id().await {
        error!(error = %e, "Failed to cycle session ID");
        return fail("session");
    }
    if let Err(e) = set_current_user(&session, &user).await {
        error!(error = %e, "Failed to store user in session");
        return fail("session");
    }

    set_sentry_user(user.id.as_str(), &user.username);
    notify::login(state.notifier(), &user);
    info!(user_id = %user.id, "Customer signed in");

    let return_to: Option<String> = session.remove(keys::RETURN_TO).await.ok().flatten();
    let target = return_to.filter(|p| is_local_path(p));
    Redirect::to(target.as_deref().unwrap_or("/")).into_response()
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
    Redirect::to("/").into_response()
}
