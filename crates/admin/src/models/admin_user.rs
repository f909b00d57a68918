//! Back-office accounts.
//!
//! Admins are rows of `dukkan.users` with `role = 'admin'`; customers cannot
//! sign in here even with valid credentials.

use chrono::{DateTime, Utc};

use dukkan_core::{Email, UserId};

use super::CurrentAdmin;

#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&AdminUser> for CurrentAdmin {
    fn from(user: &AdminUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.full_name.clone(),
        }
    }
}
