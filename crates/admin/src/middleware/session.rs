//! Staff sessions.
//!
//! Separate cookie from the storefront over the same session table. Staff
//! are signed out after a working day of inactivity and the cookie is never
//! sent on cross-site requests.

use sqlx::PgPool;
use tower_sessions::cookie::{SameSite, time::Duration};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

pub const SESSION_COOKIE_NAME: &str = "dukkan_admin_session";

const IDLE_HOURS: i64 = 12;

#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> SessionManagerLayer<PostgresStore> {
    // TLS may terminate here or at a proxy in front of the admin.
    let secure = config.tls.is_some() || config.base_url.starts_with("https://");

    SessionManagerLayer::new(PostgresStore::new(pool.clone()))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::hours(IDLE_HOURS)))
        .with_secure(secure)
        .with_same_site(SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
