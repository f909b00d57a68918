//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Email and password sign-in for `role = admin` accounts

pub mod auth;

pub use auth::{AdminAuthError, AdminAuthService, hash_password};
