//! Customer sessions.
//!
//! The session only carries the signed-in
//! [`CurrentUser`](crate::models::CurrentUser) and the post-login return path;
//! carts are stored per user in the database.

use sqlx::PgPool;
use tower_sessions::cookie::{SameSite, time::Duration};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

pub const SESSION_COOKIE_NAME: &str = "dukkan_session";

/// Idle time after which a customer is signed out.
const IDLE_DAYS: i64 = 14;

/// Cookies are `Secure` whenever the public URL is HTTPS.
fn secure_cookies(base_url: &str) -> bool {
    base_url.starts_with("https://")
}

/// Session layer over the shared `tower_sessions.session` table.
///
/// `Lax` keeps the cookie on top-level navigations from WhatsApp and
/// map links, which customers use to come back to an order.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    SessionManagerLayer::new(PostgresStore::new(pool.clone()))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(IDLE_DAYS)))
        .with_secure(secure_cookies(&config.base_url))
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_cookies_follow_scheme() {
        assert!(secure_cookies("https://dukkan.sa"));
        assert!(!secure_cookies("http://localhost:3000"));
    }
}
