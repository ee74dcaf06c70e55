//! Product management route handlers.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use tracing::{info, instrument};

use moonlit_core::{Category, CategoryId, Product, ProductId};

use crate::db::{AdminCatalogRepository, ProductInput};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::CurrentAdmin;
use crate::routes::{AdminUserView, non_empty};
use crate::services::notify;
use crate::state::AppState;

const MAX_NAME_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 5000;

/// Product form input.
#[derive(Debug, Default, Deserialize)]
pub struct ProductFormInput {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub price: String,
    pub image_url: Option<String>,
    pub category_id: Option<String>,
    /// Checkbox; present when checked.
    pub is_active: Option<String>,
}

impl ProductFormInput {
    /// Validate the form into repository input.
    ///
    /// # Errors
    ///
    /// Returns a message suitable for showing above the form.
    pub fn validate(&self) -> std::result::Result<ProductInput, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(format!("Name must be at most {MAX_NAME_LEN} characters"));
        }

        let price = Decimal::from_str(self.price.trim())
            .map_err(|_| "Price must be a number".to_string())?;
        if price.is_sign_negative() {
            return Err("Price cannot be negative".to_string());
        }
        let price = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let description = non_empty(self.description.clone());
        if description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN)
        {
            return Err(format!(
                "Description must be at most {MAX_DESCRIPTION_LEN} characters"
            ));
        }

        let image_url = non_empty(self.image_url.clone());
        if image_url
            .as_ref()
            .is_some_and(|url| !(url.starts_with("https://") || url.starts_with('/')))
        {
            return Err("Image URL must start with https:// or /".to_string());
        }

        let category_id = match non_empty(self.category_id.clone()) {
            None => None,
            Some(raw) => Some(CategoryId::new(
                raw.parse::<i32>()
                    .map_err(|_| "Unknown category".to_string())?,
            )),
        };

        Ok(ProductInput {
            category_id,
            name: name.to_string(),
            description,
            price,
            image_url,
            is_active: self.is_active.is_some(),
        })
    }
}

/// A choice in the category select.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub id: i32,
    pub name: String,
    pub selected: bool,
}

/// Current form values, as strings for re-rendering.
#[derive(Debug, Clone, Default)]
pub struct ProductFormValues {
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
    pub is_active: bool,
}

impl From<&Product> for ProductFormValues {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.to_string(),
            image_url: product.image_url.clone().unwrap_or_default(),
            is_active: product.is_active,
        }
    }
}

impl From<&ProductFormInput> for ProductFormValues {
    fn from(input: &ProductFormInput) -> Self {
        Self {
            name: input.name.clone(),
            description: input.description.clone().unwrap_or_default(),
            price: input.price.clone(),
            image_url: input.image_url.clone().unwrap_or_default(),
            is_active: input.is_active.is_some(),
        }
    }
}

/// Product list page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub products: Vec<Product>,
}

/// New/edit product form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    /// `None` when creating.
    pub product_id: Option<i32>,
    pub values: ProductFormValues,
    pub categories: Vec<CategoryOption>,
    pub error: Option<String>,
}

fn category_options(categories: Vec<Category>, selected: Option<i32>) -> Vec<CategoryOption> {
    categories
        .into_iter()
        .map(|c| CategoryOption {
            id: c.id.as_i32(),
            selected: selected == Some(c.id.as_i32()),
            name: c.name,
        })
        .collect()
}

fn form_page(
    admin: &CurrentAdmin,
    product_id: Option<i32>,
    values: ProductFormValues,
    categories: Vec<CategoryOption>,
    error: Option<String>,
) -> ProductFormTemplate {
    ProductFormTemplate {
        admin_user: AdminUserView::from(admin),
        current_path: "/products".to_string(),
        product_id,
        values,
        categories,
        error,
    }
}

/// Re-render the form with a validation message.
async fn invalid_form(
    state: &AppState,
    admin: &CurrentAdmin,
    product_id: Option<i32>,
    input: &ProductFormInput,
    message: String,
) -> Result<Response> {
    let categories = AdminCatalogRepository::new(state.pool()).categories().await?;
    let selected = input
        .category_id
        .as_deref()
        .and_then(|c| c.trim().parse().ok());
    let page = form_page(
        admin,
        product_id,
        ProductFormValues::from(input),
        category_options(categories, selected),
        Some(message),
    );
    Ok((StatusCode::BAD_REQUEST, page).into_response())
}

/// Product list page handler.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
#[instrument(skip(admin, state), fields(actor = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<ProductsIndexTemplate> {
    let products = AdminCatalogRepository::new(state.pool()).products().await?;

    Ok(ProductsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        products,
    })
}

/// New product form.
///
/// # Errors
///
/// Returns an error if the category query fails.
#[instrument(skip(admin, state), fields(actor = %admin.id))]
pub async fn new_form(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<ProductFormTemplate> {
    let categories = AdminCatalogRepository::new(state.pool()).categories().await?;

    Ok(form_page(
        &admin,
        None,
        ProductFormValues {
            is_active: true,
            ..ProductFormValues::default()
        },
        category_options(categories, None),
        None,
    ))
}

/// Create a product.
///
/// # Errors
///
/// Returns 409 if the chosen category no longer exists.
#[instrument(skip(admin, state, input), fields(actor = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Form(input): Form<ProductFormInput>,
) -> Result<Response> {
    let product_input = match input.validate() {
        Ok(v) => v,
        Err(message) => return invalid_form(&state, &admin, None, &input, message).await,
    };

    let product = AdminCatalogRepository::new(state.pool())
        .create_product(&product_input)
        .await?;

    info!(product_id = %product.id, name = %product.name, "Product created");
    notify::catalog_changed(
        state.notifier(),
        &admin,
        "Create Product",
        &format!("Created product {} ({})", product.name, product.price()),
    );

    Ok(Redirect::to("/products").into_response())
}

/// Edit product form.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown product.
#[instrument(skip(admin, state), fields(actor = %admin.id))]
pub async fn edit_form(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ProductFormTemplate> {
    let repo = AdminCatalogRepository::new(state.pool());
    let product = repo
        .product(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))?;
    let categories = repo.categories().await?;

    Ok(form_page(
        &admin,
        Some(id),
        ProductFormValues::from(&product),
        category_options(categories, product.category_id.map(|c| c.as_i32())),
        None,
    ))
}

/// Update a product.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown product.
#[instrument(skip(admin, state, input), fields(actor = %admin.id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(input): Form<ProductFormInput>,
) -> Result<Response> {
    let product_input = match input.validate() {
        Ok(v) => v,
        Err(message) => return invalid_form(&state, &admin, Some(id), &input, message).await,
    };

    let product = AdminCatalogRepository::new(state.pool())
        .update_product(ProductId::new(id), &product_input)
        .await?;

    info!(product_id = %product.id, "Product updated");
    notify::catalog_changed(
        state.notifier(),
        &admin,
        "Update Product",
        &format!("Updated product {} ({})", product.name, product.price()),
    );

    Ok(Redirect::to("/products").into_response())
}

/// Delete a product. Order lines keep their copied name and price.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown product.
#[instrument(skip(admin, state), fields(actor = %admin.id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let product = AdminCatalogRepository::new(state.pool())
        .delete_product(ProductId::new(id))
        .await?;

    info!(product_id = %product.id, "Product deleted");
    notify::catalog_changed(
        state.notifier(),
        &admin,
        "Delete Product",
        &format!("Deleted product {}", product.name),
    );

    Ok(Redirect::to("/products"))
}
