//! Catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use moonlit_core::{Category, Product, ProductId};

use super::Nav;
use crate::db::CatalogRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Query parameters for the shop listing.
#[derive(Debug, Deserialize)]
pub struct ShopQuery {
    pub category: Option<String>,
}

impl ShopQuery {
    /// The category slug to filter on; `all` and blank mean no filter.
    fn slug(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "catalog/shop.html")]
pub struct ShopTemplate {
    pub nav: Nav,
    pub categories: Vec<Category>,
    pub selected: String,
    pub products: Vec<Product>,
}

#[derive(Template, WebTemplate)]
#[template(path = "catalog/product.html")]
pub struct ProductTemplate {
    pub nav: Nav,
    pub product: Product,
}

/// Product listing, optionally filtered by category.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
#[instrument(skip(state, user))]
pub async fn shop(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ShopQuery>,
) -> Result<ShopTemplate> {
    let repo = CatalogRepository::new(state.pool());
    let slug = query.slug();

    let categories = repo.categories().await?;
    let products = repo.list_active(slug).await?;

    Ok(ShopTemplate {
        nav: Nav::load(&state, user).await,
        categories,
        selected: slug.unwrap_or("all").to_string(),
        products,
    })
}

/// Product detail. Unknown or inactive products send the visitor back to
/// the shop.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
#[instrument(skip(state, user))]
pub async fn product(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    let Some(product) = CatalogRepository::new(state.pool())
        .get_active(ProductId::new(id))
        .await?
    else {
        return Ok(Redirect::to("/shop").into_response());
    };

    Ok(ProductTemplate {
        nav: Nav::load(&state, user).await,
        product,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(category: Option<&str>) -> ShopQuery {
        ShopQuery {
            category: category.map(String::from),
        }
    }

    #[test]
    fn test_all_and_blank_mean_unfiltered() {
        assert_eq!(query(None).slug(), None);
        assert_eq!(query(Some("all")).slug(), None);
        assert_eq!(query(Some("ALL")).slug(), None);
        assert_eq!(query(Some("  ")).slug(), None);
    }

    #[test]
    fn test_slug_passes_through() {
        assert_eq!(query(Some("wedding")).slug(), Some("wedding"));
    }
}
