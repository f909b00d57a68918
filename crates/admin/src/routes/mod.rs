//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Dashboard
//! GET  /                              - Counters, recent orders, low stock
//!
//! # Auth
//! GET  /auth/login                    - Login page
//! POST /auth/login                    - Login action
//! POST /auth/logout                   - Logout action
//!
//! # Products
//! GET  /products?q&category&status&low_stock&page
//! GET  /products/new                  - New product form
//! POST /products                      - Create product
//! GET  /products/{id}/edit            - Edit form
//! POST /products/{id}                 - Update product
//! POST /products/{id}/toggle          - Activate / deactivate
//! POST /products/{id}/delete          - Delete (deactivates if ordered before)
//!
//! # Categories
//! GET  /categories                    - Categories with product counts
//! GET  /categories/new, POST /categories
//! GET  /categories/{id}/edit, POST /categories/{id}
//! POST /categories/{id}/delete        - Refused while products reference it
//!
//! # Orders
//! GET  /orders?status&q&page          - Order listing
//! GET  /orders/{id}                   - Order detail
//! POST /orders/{id}/status            - Move along the lifecycle
//! POST /orders/{id}/driver            - Assign a driver
//!
//! # Drivers
//! GET  /drivers, GET /drivers/new, POST /drivers
//! GET  /drivers/{id}/edit, POST /drivers/{id}
//! POST /drivers/{id}/toggle
//!
//! # Shifts
//! GET  /shifts, GET /shifts/new, POST /shifts
//! GET  /shifts/{id}/edit, POST /shifts/{id}
//! POST /shifts/{id}/toggle
//!
//! # Content
//! GET  /content/about                 - Markdown editor for the about page
//! POST /content/about                 - Save
//! ```

pub mod auth;
pub mod categories;
pub mod content;
pub mod dashboard;
pub mod drivers;
pub mod orders;
pub mod products;
pub mod shifts;

use axum::{
    Router,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::components::{ADMIN_MENU, MenuSection};
use crate::middleware::{
    AdminAuthRejection, CspNonce, RequireAdminAuth, login_rate_limiter, take_flash,
};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Data every signed-in page needs for the layout.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub admin: CurrentAdmin,
    pub current_path: String,
    pub nonce: String,
    /// Message queued by the previous request, shown once.
    pub flash: Option<String>,
}

impl PageContext {
    #[must_use]
    pub fn menu(&self) -> &'static [MenuSection] {
        ADMIN_MENU
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAdminAuth(admin) = RequireAdminAuth::from_request_parts(parts, state).await?;
        let nonce = parts
            .extensions
            .get::<CspNonce>()
            .map(|n| n.value().to_string())
            .unwrap_or_default();

        let flash = match parts.extensions.get::<Session>() {
            Some(session) => take_flash(session).await,
            None => None,
        };

        Ok(Self {
            admin,
            current_path: parts.uri.path().to_string(),
            nonce,
            flash,
        })
    }
}

/// Parse an optional numeric query value; blanks and junk mean "unset".
pub(crate) fn parse_optional_i32(value: Option<&str>) -> Option<i32> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Trimmed value, or `None` when blank.
pub(crate) fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Longest accepted slug.
pub const MAX_SLUG_CHARS: usize = 80;

/// URL slugs: lowercase ASCII letters, digits and single inner hyphens.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_CHARS
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Append `key=value&` to a pagination query string when `value` is set.
pub(crate) fn push_query(query: &mut String, key: &str, value: &str) {
    if !value.is_empty() {
        query.push_str(key);
        query.push('=');
        query.push_str(&urlencoding::encode(value));
        query.push('&');
    }
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(login_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new_form))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit_form))
        .route("/{id}/toggle", post(products::toggle))
        .route("/{id}/delete", post(products::delete))
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/new", get(categories::new_form))
        .route("/{id}", post(categories::update))
        .route("/{id}/edit", get(categories::edit_form))
        .route("/{id}/delete", post(categories::delete))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
        .route("/{id}/driver", post(orders::assign_driver))
}

pub fn driver_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(drivers::index).post(drivers::create))
        .route("/new", get(drivers::new_form))
        .route("/{id}", post(drivers::update))
        .route("/{id}/edit", get(drivers::edit_form))
        .route("/{id}/toggle", post(drivers::toggle))
}

pub fn shift_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shifts::index).post(shifts::create))
        .route("/new", get(shifts::new_form))
        .route("/{id}", post(shifts::update))
        .route("/{id}/edit", get(shifts::edit_form))
        .route("/{id}/toggle", post(shifts::toggle))
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/content/about", get(content::about).post(content::save_about))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/orders", order_routes())
        .nest("/drivers", driver_routes())
        .nest("/shifts", shift_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optional_i32() {
        assert_eq!(parse_optional_i32(Some(" 7 ")), Some(7));
        assert_eq!(parse_optional_i32(Some("")), None);
        assert_eq!(parse_optional_i32(Some("abc")), None);
        assert_eq!(parse_optional_i32(None), None);
    }

    #[test]
    fn test_slug_rules() {
        assert!(is_valid_slug("fresh-milk-1l"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Fresh-Milk"));
        assert!(!is_valid_slug("-milk"));
        assert!(!is_valid_slug("milk--1l"));
        assert!(!is_valid_slug("حليب"));
    }

    #[test]
    fn test_push_query_encodes_and_skips_blank() {
        let mut query = String::new();
        push_query(&mut query, "q", "green tea");
        push_query(&mut query, "status", "");
        assert_eq!(query, "q=green%20tea&");
    }
}
