use thiserror::Error;

use dukkan_core::{EmailError, NameError};

use crate::db::RepositoryError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("invalid name: {0}")]
    InvalidName(#[from] NameError),

    /// Unknown email or wrong password; the two are never distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already registered")]
    UserAlreadyExists,

    #[error("password shorter than {min} characters")]
    WeakPassword { min: usize },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("could not hash password")]
    PasswordHash,
}

impl AuthError {
    /// Arabic message for the login and registration forms.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) => "البريد الإلكتروني غير صالح",
            Self::InvalidName(_) => "الاسم يجب أن يكون بين 2 و 100 حرف",
            Self::InvalidCredentials => "البريد الإلكتروني أو كلمة المرور غير صحيحة",
            Self::UserAlreadyExists => "هذا البريد مسجل مسبقاً",
            Self::WeakPassword { .. } => "كلمة المرور يجب أن تكون 8 أحرف على الأقل",
            Self::Repository(_) | Self::PasswordHash => "حدث خطأ غير متوقع، حاول مرة أخرى",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_failures_share_a_generic_message() {
        assert_eq!(
            AuthError::PasswordHash.user_message(),
            AuthError::Repository(RepositoryError::NotFound).user_message()
        );
    }

    #[test]
    fn test_weak_password_display_names_minimum() {
        assert_eq!(
            AuthError::WeakPassword { min: 8 }.to_string(),
            "password shorter than 8 characters"
        );
    }
}
