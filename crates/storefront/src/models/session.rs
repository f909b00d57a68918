//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use dukkan_core::{Email, UserId, UserRole};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name, refreshed when checkout updates it.
    pub full_name: String,
    pub role: UserRole,
}

impl CurrentUser {
    /// First word of the name for the header greeting.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.full_name
            .split_whitespace()
            .next()
            .unwrap_or_else(|| self.email.as_str())
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name_falls_back_to_email() {
        let mut user = CurrentUser {
            id: UserId::new(1),
            email: Email::parse("sara@mail.sa").unwrap(),
            full_name: "سارة  أحمد".to_string(),
            role: UserRole::Customer,
        };
        assert_eq!(user.first_name(), "سارة");

        user.full_name = String::new();
        assert_eq!(user.first_name(), "sara@mail.sa");
    }
}
