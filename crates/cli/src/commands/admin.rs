//! Back-office account commands.
//!
//! Admins live in the same `dukkan.users` table as customers; only the
//! `admin` role may sign in to the back-office.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use dukkan_admin::db;
use dukkan_admin::services::{AdminAuthError, hash_password};
use dukkan_core::{Email, FullName, UserId, UserRole};

const MIN_PASSWORD_CHARS: usize = 12;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Password must be at least {MIN_PASSWORD_CHARS} characters")]
    WeakPassword,

    #[error(transparent)]
    Hash(#[from] AdminAuthError),
}

/// Check the arguments before touching the database.
///
/// # Errors
///
/// Returns the first invalid argument.
pub fn validate(
    email: &str,
    name: &str,
    password: &SecretString,
) -> Result<(Email, FullName), AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let name = FullName::parse(name).map_err(|_| AdminError::InvalidName(name.to_owned()))?;
    if password.expose_secret().chars().count() < MIN_PASSWORD_CHARS {
        return Err(AdminError::WeakPassword);
    }
    Ok((email, name))
}

/// Create an admin account. An existing account with the same email is
/// promoted to admin and its password replaced.
///
/// # Errors
///
/// Returns an error if an argument is invalid or the database write fails.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &SecretString,
) -> Result<UserId, AdminError> {
    let (email, name) = validate(email, name, password)?;
    let password_hash = hash_password(password.expose_secret())?;

    let database_url = super::database_url().map_err(AdminError::MissingEnvVar)?;
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let (id, created): (i32, bool) = sqlx::query_as(
        r"
        INSERT INTO dukkan.users (email, password_hash, full_name, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE
            SET password_hash = EXCLUDED.password_hash,
                full_name = EXCLUDED.full_name,
                role = EXCLUDED.role,
                updated_at = NOW()
        RETURNING id, (xmax = 0) AS created
        ",
    )
    .bind(email.as_str())
    .bind(&password_hash)
    .bind(name.as_str())
    .bind(UserRole::Admin)
    .fetch_one(&pool)
    .await?;

    let id = UserId::new(id);
    if created {
        tracing::info!(user_id = %id, email = %email.as_str(), "Admin account created");
    } else {
        tracing::warn!(user_id = %id, email = %email.as_str(), "Existing account promoted to admin and password reset");
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_good_arguments() {
        let password = SecretString::from("correct horse battery");
        let (email, name) = validate(" Staff@Dukkan.sa ", "Huda Alharbi", &password)
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(email.as_str(), "staff@dukkan.sa");
        assert_eq!(name.as_str(), "Huda Alharbi");
    }

    #[test]
    fn test_validate_rejects_short_password() {
        let password = SecretString::from("short");
        assert!(matches!(
            validate("staff@dukkan.sa", "Huda Alharbi", &password),
            Err(AdminError::WeakPassword)
        ));
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        let password = SecretString::from("correct horse battery");
        assert!(matches!(
            validate("not-an-email", "Huda Alharbi", &password),
            Err(AdminError::InvalidEmail(_))
        ));
    }
}
