//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

use dukkan_core::env;

/// Database URL shared by every command.
///
/// # Errors
///
/// Returns the name of the variable that should be set.
pub fn database_url() -> Result<SecretString, &'static str> {
    env::optional("DATABASE_URL")
        .or_else(|| env::optional("ADMIN_DATABASE_URL"))
        .map(SecretString::from)
        .ok_or("DATABASE_URL")
}
