//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::db::{AdminOrderRepository, DashboardStats};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::AdminUserView;
use crate::state::AppState;

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub stats: DashboardStats,
}

/// Dashboard page handler.
///
/// # Errors
///
/// Returns an error if the dashboard queries fail.
#[instrument(skip(admin, state), fields(actor = %admin.id))]
pub async fn dashboard(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<DashboardTemplate> {
    let stats = AdminOrderRepository::new(state.pool()).dashboard().await?;

    Ok(DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        stats,
    })
}
