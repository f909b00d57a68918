//! Database operations for the admin panel.
//!
//! # Schema: `dukkan`
//!
//! The admin shares the storefront's schema and reads or writes:
//!
//! - `users` - Admin sign-in (role `admin`) and order customers
//! - `categories`, `suppliers`, `products` - Catalog management
//! - `orders`, `order_items` - Fulfilment, status and driver assignment
//! - `drivers` - Delivery staff
//! - `shifts` - Delivery windows offered at checkout
//! - `user_notifications` - Customer notices on order changes
//! - `site_content` - The about page markdown
//!
//! Migrations run via `cargo run -p dukkan-cli -- migrate`.

pub mod admin_users;
pub mod categories;
pub mod content;
pub mod dashboard;
pub mod drivers;
pub mod orders;
pub mod products;
pub mod shifts;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_users::AdminUserRepository;
pub use categories::CategoryRepository;
pub use content::ContentRepository;
pub use dashboard::DashboardRepository;
pub use drivers::DriverRepository;
pub use orders::{OrderRepository, OrderUpdateError};
pub use products::{DeleteOutcome, ProductRepository};
pub use shifts::ShiftRepository;

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

    /// Constraint violation (duplicate slug, row still referenced).
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
        assert_eq!(like_pattern("ORD-17"), "%ORD-17%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
    }
}
