//! Dukkan admin library.
//!
//! The back-office for staff: catalog, orders and drivers, delivery shifts
//! and site content. Exposed as a library so handlers and forms can be
//! tested without a running server.
//!
//! # Security
//!
//! Every page except the login form requires a signed-in `admin` account.
//! Bind to a private interface or terminate TLS here (`ADMIN_TLS_CERT`).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
