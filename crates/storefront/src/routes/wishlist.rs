//! Wishlist handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use dukkan_core::ProductId;

use crate::db::WishlistRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAuth, safe_next};
use crate::models::ProductCard;
use crate::routes::PageContext;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub product_id: i32,
    pub next: Option<String>,
}

/// Saved products template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist.html")]
pub struct WishlistTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductCard>,
}

/// Heart button fragment returned to HTMX toggles.
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub product_id: ProductId,
    pub saved: bool,
}

/// The customer's saved products.
///
/// # Errors
///
/// Returns an error if the wishlist cannot be loaded.
#[instrument(skip(state, ctx), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let products = WishlistRepository::new(state.pool()).list(user.id).await?;
    Ok(WishlistTemplate { ctx, products })
}

/// Save or unsave a product. HTMX gets the new button; plain posts go back.
///
/// # Errors
///
/// Returns an error if the wishlist cannot be written.
#[instrument(skip(state, headers), fields(user_id = %user.id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<ToggleForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id);
    let saved = WishlistRepository::new(state.pool())
        .toggle(user.id, product_id)
        .await?;

    if headers.contains_key("HX-Request") {
        return Ok(WishlistButtonTemplate { product_id, saved }.into_response());
    }
    Ok(Redirect::to(safe_next(form.next.as_deref().or(Some("/wishlist")))).into_response())
}
