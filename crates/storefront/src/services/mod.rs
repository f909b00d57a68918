//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Email and password accounts
//! - `checkout` - Checkout form validation and order placement
//! - `pusher` - New-order events for the admin dashboard

pub mod auth;
pub mod checkout;
pub mod pusher;
