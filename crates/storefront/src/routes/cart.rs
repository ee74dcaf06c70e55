//! Cart route handlers.
//!
//! The cart lives in `shop.cart_items`, one row per product, so it follows
//! the customer across devices.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use moonlit_core::{CartItemId, Price, ProductId};

use super::Nav;
use crate::db::CartRepository;
use crate::db::cart::MAX_QUANTITY;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CartLine, cart_total};
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub nav: Nav,
    pub lines: Vec<CartLine>,
    pub total: Price,
    pub max_quantity: i32,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub quantity: i32,
}

/// Cart page.
///
/// # Errors
///
/// Returns an error if the cart query fails.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<CartTemplate> {
    let lines = CartRepository::new(state.pool()).lines(&user.id).await?;
    let total = cart_total(&lines);

    Ok(CartTemplate {
        nav: Nav::load(&state, Some(user)).await,
        lines,
        total,
        max_quantity: MAX_QUANTITY,
    })
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns 404 if the product is unknown or inactive.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<i32>,
) -> Result<Redirect> {
    CartRepository::new(state.pool())
        .add(&user.id, ProductId::new(product_id))
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound("Product not available".to_string())
            }
            other => other.into(),
        })?;

    Ok(Redirect::to("/cart"))
}

/// Set a line's quantity; zero removes it.
///
/// # Errors
///
/// Returns 404 if the line is not in the customer's cart.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<i32>,
    Form(form): Form<UpdateForm>,
) -> Result<Redirect> {
    CartRepository::new(state.pool())
        .set_quantity(&user.id, CartItemId::new(item_id), form.quantity)
        .await?;

    Ok(Redirect::to("/cart"))
}

/// Remove a line.
///
/// # Errors
///
/// Returns 404 if the line is not in the customer's cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<i32>,
) -> Result<Redirect> {
    CartRepository::new(state.pool())
        .remove(&user.id, CartItemId::new(item_id))
        .await?;

    Ok(Redirect::to("/cart"))
}
