//! Integration tests for Dukkan.
//!
//! # Running Tests
//!
//! ```bash
//! # Library-level tests (no services needed)
//! cargo test -p dukkan-integration-tests
//!
//! # HTTP smoke tests against running binaries, and repository tests
//! # against DATABASE_URL
//! cargo test -p dukkan-integration-tests -- --ignored
//! ```
//!
//! # Test Files
//!
//! - `checkout` - Checkout form, totals and shift availability
//! - `addresses` - Address form and map-link coordinates
//! - `admin_forms` - Back-office forms, filters and navigation
//! - `storefront_db` - Checkout, address and cart repositories against Postgres
//! - `http_smoke` - Requests against running storefront and admin servers

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

/// Storefront base URL (`STOREFRONT_BASE_URL`, default `http://localhost:3000`).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Admin base URL (`ADMIN_BASE_URL`, default `http://localhost:3001`).
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// HTTP client that keeps cookies and does not follow redirects, so tests
/// can assert on `Location` headers.
///
/// # Errors
///
/// Returns an error if the client cannot be built.
pub fn client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(10))
        .build()
}
