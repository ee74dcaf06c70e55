//! Customer list.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::db::{CustomerRepository, CustomerSummary};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::AdminUserView;
use crate::state::AppState;

/// Customers list page template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub customers: Vec<CustomerSummary>,
}

/// Customers list page handler.
///
/// # Errors
///
/// Returns an error if the customer query fails.
#[instrument(skip(admin, state), fields(actor = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<CustomersIndexTemplate> {
    let customers = CustomerRepository::new(state.pool()).list().await?;

    Ok(CustomersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/customers".to_string(),
        customers,
    })
}
