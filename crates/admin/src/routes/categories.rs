//! Category management route handlers.
//!
//! Categories are edited inline on the list page; the slug is always derived
//! from the name.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::{info, instrument};

use moonlit_core::{Category, CategoryId, Slug};

use crate::db::{AdminCatalogRepository, CategoryInput};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::{AdminUserView, non_empty};
use crate::services::notify;
use crate::state::AppState;

const MAX_NAME_LEN: usize = 100;

/// Category form input.
#[derive(Debug, Deserialize)]
pub struct CategoryFormInput {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

impl CategoryFormInput {
    fn validate(self) -> Result<CategoryInput> {
        let name = self.name.trim();
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::BadRequest(format!(
                "Name must be at most {MAX_NAME_LEN} characters"
            )));
        }
        let slug = Slug::from_name(name).ok_or_else(|| {
            AppError::BadRequest("Name must contain a letter or digit".to_string())
        })?;

        Ok(CategoryInput {
            slug,
            name: name.to_string(),
            description: non_empty(self.description),
        })
    }
}

/// Category list page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub categories: Vec<Category>,
}

/// Category list page handler.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
#[instrument(skip(admin, state), fields(actor = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<CategoriesIndexTemplate> {
    let categories = AdminCatalogRepository::new(state.pool())
        .categories()
        .await?;

    Ok(CategoriesIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/categories".to_string(),
        categories,
    })
}

/// Create a category.
///
/// # Errors
///
/// Returns 409 if a category with the same slug exists.
#[instrument(skip(admin, state, input), fields(actor = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Form(input): Form<CategoryFormInput>,
) -> Result<Redirect> {
    let input = input.validate()?;
    let category = AdminCatalogRepository::new(state.pool())
        .create_category(&input)
        .await?;

    info!(slug = %category.slug, "Category created");
    notify::catalog_changed(
        state.notifier(),
        &admin,
        "Create Category",
        &format!("Created category {} ({})", category.name, category.slug),
    );

    Ok(Redirect::to("/categories"))
}

/// Update a category.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown category and 409 if the new
/// slug is taken.
#[instrument(skip(admin, state, input), fields(actor = %admin.id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(input): Form<CategoryFormInput>,
) -> Result<Redirect> {
    let input = input.validate()?;
    let category = AdminCatalogRepository::new(state.pool())
        .update_category(CategoryId::new(id), &input)
        .await?;

    info!(slug = %category.slug, "Category updated");
    notify::catalog_changed(
        state.notifier(),
        &admin,
        "Update Category",
        &format!("Updated category {} ({})", category.name, category.slug),
    );

    Ok(Redirect::to("/categories"))
}

/// Delete a category. Its products stay, uncategorised.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown category.
#[instrument(skip(admin, state), fields(actor = %admin.id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let category = AdminCatalogRepository::new(state.pool())
        .delete_category(CategoryId::new(id))
        .await?;

    info!(slug = %category.slug, "Category deleted");
    notify::catalog_changed(
        state.notifier(),
        &admin,
        "Delete Category",
        &format!("Deleted category {}", category.name),
    );

    Ok(Redirect::to("/categories"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_derives_slug() {
        let input = CategoryFormInput {
            name: "  Couple Sets ".to_string(),
            description: Some(" ".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(input.slug.as_str(), "couple-sets");
        assert_eq!(input.name, "Couple Sets");
        assert!(input.description.is_none());
    }

    #[test]
    fn test_validate_rejects_symbol_only_name() {
        let result = CategoryFormInput {
            name: "***".to_string(),
            description: None,
        }
        .validate();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
