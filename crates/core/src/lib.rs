//! Dukkan Core - Shared domain types.
//!
//! This crate provides the types used across all Dukkan components:
//! - `storefront` - Public-facing store (catalog, cart, checkout, accounts)
//! - `admin` - Internal back-office (products, orders, drivers, shifts)
//! - `cli` - Command-line tools for migrations, admin users and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no database access,
//! no HTTP clients. Pricing, shift status and coordinate parsing live here so
//! both binaries agree on them and they can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money and order totals, statuses, validated
//!   form values, shift windows, map coordinates and pagination
//! - `env` - Environment variable and secret checks (feature `env`)

#![cfg_attr(not(test), forbid(unsafe_code))]

#[cfg(feature = "env")]
pub mod env;
pub mod types;

pub use types::*;
