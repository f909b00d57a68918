//! Database operations for the storefront.
//!
//! # Schema: `dukkan`
//!
//! Shared with the admin binary:
//!
//! - `users` - Customer and admin accounts
//! - `categories`, `suppliers`, `products`, `reviews` - Catalog
//! - `wishlist_items` - Saved products
//! - `carts`, `cart_items` - Server-side cart, one per user
//! - `addresses` - Address book (at most one default per user)
//! - `shifts` - Delivery windows offered at checkout
//! - `orders`, `order_items` - Placed orders with price snapshots
//! - `user_notifications` - In-app notifications
//! - `site_content` - Editable markdown pages
//!
//! # Migrations
//!
//! Migrations live in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p dukkan-cli -- migrate
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as` and mapped through
//! private `FromRow` row types into domain models.

pub mod addresses;
pub mod carts;
pub mod catalog;
pub mod content;
pub mod notifications;
pub mod orders;
pub mod shifts;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use carts::{AddOutcome, CartRepository};
pub use catalog::CatalogRepository;
pub use content::ContentRepository;
pub use notifications::NotificationRepository;
pub use orders::{OrderRepository, PlaceOrderError};
pub use shifts::ShiftRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_unique(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Convert a non-negative database count or quantity to `u32`.
pub(crate) fn to_u32(value: i32, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative {column}: {value}")))
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" milk "), "%milk%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_to_u32_rejects_negative() {
        assert_eq!(to_u32(3, "stock").ok(), Some(3));
        assert!(matches!(
            to_u32(-1, "stock"),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
