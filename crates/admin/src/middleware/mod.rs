//! Back-office request pipeline, outermost first: Sentry, tracing span,
//! request id, CSP nonce, session, security headers. The login POST is
//! additionally rate limited.
//!
//! Authentication is enforced per handler by the [`RequireAdminAuth`]
//! extractor rather than a router-wide guard.

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AdminAuthRejection, OptionalAdminAuth, RequireAdminAuth, clear_current_admin,
    set_current_admin, set_flash, take_flash,
};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
