//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use dukkan_core::{Email, UserId};

/// Session-stored admin identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: UserId,
    pub email: Email,
    /// Display name; falls back to the email in the sidebar when empty.
    pub name: String,
}

impl CurrentAdmin {
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.email.as_str()
        } else {
            &self.name
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// One-shot message shown after a redirect.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut admin = CurrentAdmin {
            id: UserId::new(1),
            email: Email::parse("ops@dukkan.sa").unwrap(),
            name: "Noura".to_string(),
        };
        assert_eq!(admin.display_name(), "Noura");
        admin.name = "  ".to_string();
        assert_eq!(admin.display_name(), "ops@dukkan.sa");
    }
}
