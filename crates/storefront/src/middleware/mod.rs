//! Storefront request pipeline.
//!
//! Outermost first: Sentry, tracing span, request id, CSP nonce, session,
//! security headers. Rate limiting is attached per route to the sign-in,
//! registration and order submission handlers only.

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, safe_next, set_current_user};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
