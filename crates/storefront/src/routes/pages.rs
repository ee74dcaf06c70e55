//! Home and static page handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use moonlit_core::Product;

use super::Nav;
use crate::db::CatalogRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Products shown on the home page.
const FEATURED_COUNT: i64 = 4;

/// Query parameters the home page understands.
#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    /// Set by the sign-in flow on failure.
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub nav: Nav,
    pub featured: Vec<Product>,
    pub error: Option<&'static str>,
}

#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub nav: Nav,
}

#[derive(Template, WebTemplate)]
#[template(path = "pages/terms.html")]
pub struct TermsTemplate {
    pub nav: Nav,
}

/// Human message for a sign-in error code.
fn login_error_message(code: &str) -> &'static str {
    match code {
        "access_denied" => "Discord sign-in was cancelled.",
        "state" => "Your sign-in session expired. Please try again.",
        _ => "Sign-in failed. Please try again.",
    }
}

/// Home page with the newest products.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
#[instrument(skip(state, user))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<HomeQuery>,
) -> Result<HomeTemplate> {
    let featured = CatalogRepository::new(state.pool())
        .latest(FEATURED_COUNT)
        .await?;

    Ok(HomeTemplate {
        nav: Nav::load(&state, user).await,
        featured,
        error: query.error.as_deref().map(login_error_message),
    })
}

/// About page.
pub async fn about(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> AboutTemplate {
    AboutTemplate {
        nav: Nav::load(&state, user).await,
    }
}

/// Terms of service.
pub async fn terms(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> TermsTemplate {
    TermsTemplate {
        nav: Nav::load(&state, user).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_error_messages() {
        assert_eq!(
            login_error_message("access_denied"),
            "Discord sign-in was cancelled."
        );
        assert_eq!(login_error_message("anything"), "Sign-in failed. Please try again.");
    }
}
