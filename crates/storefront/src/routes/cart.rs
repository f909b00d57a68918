//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart lives in the database, one per customer, so it follows them
//! across devices.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use dukkan_core::ProductId;

use crate::db::{AddOutcome, CartRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::Cart;
use crate::routes::PageContext;
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i32,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: Cart,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: Cart,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: i64,
}

/// Display cart page.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded.
#[instrument(skip(state, ctx), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let cart = CartRepository::new(state.pool()).get(user.id).await?;
    Ok(CartShowTemplate { ctx, cart })
}

/// Add item to cart (HTMX).
///
/// Quantities are capped by stock; adding a sold-out or hidden product
/// answers 409 with a short message.
///
/// # Errors
///
/// Returns an error if the cart cannot be written.
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let carts = CartRepository::new(state.pool());
    let product_id = ProductId::new(form.product_id);

    match carts
        .add(user.id, product_id, form.quantity.unwrap_or(1))
        .await?
    {
        AddOutcome::Added(quantity) => {
            tracing::debug!(%product_id, quantity, "Added to cart");
            let count = carts.item_count(user.id).await?;
            Ok((
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                CartCountTemplate { count },
            )
                .into_response())
        }
        AddOutcome::Unavailable => Ok((
            StatusCode::CONFLICT,
            Html("<span class=\"error\">المنتج غير متوفر حالياً</span>"),
        )
            .into_response()),
    }
}

/// Update cart item quantity (HTMX). Zero removes the line.
///
/// # Errors
///
/// Returns an error if the cart cannot be written.
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let carts = CartRepository::new(state.pool());
    carts
        .set_quantity(user.id, ProductId::new(form.product_id), form.quantity)
        .await?;
    let cart = carts.get(user.id).await?;

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate { cart },
    )
        .into_response())
}

/// Remove item from cart (HTMX).
///
/// # Errors
///
/// Returns an error if the cart cannot be written.
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let carts = CartRepository::new(state.pool());
    carts
        .remove(user.id, ProductId::new(form.product_id))
        .await?;
    let cart = carts.get(user.id).await?;

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate { cart },
    )
        .into_response())
}

/// Get cart count badge (HTMX). Logged-out visitors see zero.
#[instrument(skip(state, user))]
pub async fn count(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    let count = match user {
        Some(user) => CartRepository::new(state.pool())
            .item_count(user.id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to load cart count");
                0
            }),
        None => 0,
    };

    CartCountTemplate { count }
}
