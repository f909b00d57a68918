//! Delivery shifts offered at checkout.

use chrono::NaiveTime;

use dukkan_core::{ShiftId, ShiftStatus, ShiftWindow};

#[derive(Debug, Clone)]
pub struct Shift {
    pub id: ShiftId,
    pub name: String,
    pub window: ShiftWindow,
    pub is_active: bool,
}

/// A shift with its status at the time the checkout page was rendered.
#[derive(Debug, Clone)]
pub struct ShiftOption {
    pub shift: Shift,
    pub status: ShiftStatus,
}

impl ShiftOption {
    #[must_use]
    pub fn at(shift: Shift, local_now: NaiveTime) -> Self {
        let status = shift.window.status_at(local_now);
        Self { shift, status }
    }

    #[must_use]
    pub const fn is_selectable(&self) -> bool {
        self.status.is_selectable()
    }
}
