//! Delivery shifts as managed by staff.

use dukkan_core::{ShiftId, ShiftWindow};

#[derive(Debug, Clone)]
pub struct Shift {
    pub id: ShiftId,
    pub name: String,
    pub window: ShiftWindow,
    pub is_active: bool,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftInput {
    pub name: String,
    pub window: ShiftWindow,
    pub position: i32,
}
