//! Delivery drivers.

use chrono::{DateTime, Utc};

use dukkan_core::{DriverId, FullName, PhoneNumber};

#[derive(Debug, Clone)]
pub struct Driver {
    pub id: DriverId,
    pub full_name: String,
    pub phone: String,
    pub vehicle: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverInput {
    pub full_name: FullName,
    pub phone: PhoneNumber,
    pub vehicle: Option<String>,
}
