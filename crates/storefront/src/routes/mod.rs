//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page
//! GET  /about                         - About page (markdown from admin)
//!
//! # Catalog
//! GET  /categories                    - All categories
//! GET  /categories/{slug}?page=N      - Products in a category
//! GET  /products/{slug}               - Product detail with reviews
//! POST /products/{slug}/reviews       - Rate a product (auth)
//! GET  /search?q=                     - Product name search
//!
//! # Cart (auth, HTMX fragments)
//! GET  /cart                          - Cart page
//! POST /cart/add                      - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update                   - Set quantity (returns cart_items fragment)
//! POST /cart/remove                   - Remove line (returns cart_items fragment)
//! GET  /cart/count                    - Cart count badge (fragment)
//!
//! # Checkout (auth)
//! GET  /checkout                      - Checkout form
//! POST /checkout                      - Place order, 303 to the order page
//!
//! # Wishlist (auth)
//! GET  /wishlist                      - Saved products
//! POST /wishlist/toggle               - Save or unsave a product
//!
//! # Account (auth)
//! GET  /account                       - Redirects to orders
//! GET  /account/orders                - Order history
//! GET  /account/orders/{number}       - Order tracking
//! POST /account/orders/{number}/cancel
//! GET  /account/notifications         - Notifications
//! POST /account/notifications/read    - Mark all read
//! GET  /account/addresses             - Address book
//! GET  /account/addresses/new         - New address form
//! POST /account/addresses             - Create address
//! GET  /account/addresses/{id}/edit   - Edit form
//! POST /account/addresses/{id}        - Update address
//! POST /account/addresses/{id}/delete - Delete address
//! POST /account/addresses/{id}/default - Make default
//!
//! # Auth
//! GET  /auth/login                    - Login page
//! POST /auth/login                    - Login action
//! GET  /auth/register                 - Register page
//! POST /auth/register                 - Register action
//! POST /auth/logout                   - Logout action
//! ```

pub mod account;
pub mod addresses;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod home;
pub mod pages;
pub mod search;
pub mod wishlist;

use axum::{
    Router,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
};

use crate::db::{CartRepository, NotificationRepository};
use crate::middleware::{CspNonce, OptionalAuth, auth_rate_limiter};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Data every full page needs for the layout header.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub cart_count: i64,
    pub unread_count: i64,
    pub nonce: String,
}

impl PageContext {
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state).await?;
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;

        let (cart_count, unread_count) = match &user {
            Some(user) => {
                let cart_count = CartRepository::new(state.pool())
                    .item_count(user.id)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "Failed to load cart count");
                        0
                    });
                let unread_count = NotificationRepository::new(state.pool())
                    .unread_count(user.id)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "Failed to load unread count");
                        0
                    });
                (cart_count, unread_count)
            }
            None => (0, 0),
        };

        Ok(Self {
            user,
            cart_count,
            unread_count,
            nonce,
        })
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(auth_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::categories))
        .route("/categories/{slug}", get(catalog::category))
        .route("/products/{slug}", get(catalog::product))
        .route("/products/{slug}/reviews", post(catalog::review))
        .route("/search", get(search::search))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
        .route("/orders/{number}", get(account::order))
        .route("/orders/{number}/cancel", post(account::cancel_order))
        .route("/notifications", get(account::notifications))
        .route("/notifications/read", post(account::mark_notifications_read))
        .route(
            "/addresses",
            get(addresses::index).post(addresses::create),
        )
        .route("/addresses/new", get(addresses::new_form))
        .route("/addresses/{id}", post(addresses::update))
        .route("/addresses/{id}/edit", get(addresses::edit_form))
        .route("/addresses/{id}/delete", post(addresses::delete))
        .route("/addresses/{id}/default", post(addresses::set_default))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/about", get(pages::about))
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .route(
            "/checkout",
            get(checkout::show).merge(post(checkout::place).layer(auth_rate_limiter())),
        )
        .route("/wishlist", get(wishlist::index))
        .route("/wishlist/toggle", post(wishlist::toggle))
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
}
