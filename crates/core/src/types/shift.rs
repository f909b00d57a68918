//! Delivery shift windows and their checkout status.
//!
//! Status is derived from the store's local wall-clock time, not the
//! server's, so the UTC offset is passed in from configuration.

use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShiftWindowError {
    #[error("shift must end after it starts")]
    EndNotAfterStart,
    #[error("UTC offset of {0} minutes is out of range")]
    InvalidOffset(i32),
}

/// How a shift appears on the checkout page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    /// The shift has already started; it is shown but cannot be picked.
    Passed,
    /// Starts within [`ShiftWindow::SOON_MINUTES`].
    Soon,
    Available,
}

impl ShiftStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Soon => "soon",
            Self::Available => "available",
        }
    }

    #[must_use]
    pub const fn label_ar(self) -> &'static str {
        match self {
            Self::Passed => "انتهى",
            Self::Soon => "قريباً",
            Self::Available => "متاح",
        }
    }

    #[must_use]
    pub const fn is_selectable(self) -> bool {
        !matches!(self, Self::Passed)
    }
}

/// A same-day delivery window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ShiftWindow {
    pub const SOON_MINUTES: i64 = 120;

    /// # Errors
    ///
    /// Returns [`ShiftWindowError::EndNotAfterStart`] unless `end > start`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ShiftWindowError> {
        if end <= start {
            return Err(ShiftWindowError::EndNotAfterStart);
        }
        Ok(Self { start, end })
    }

    /// Status of this shift at store-local time `now`.
    ///
    /// ```
    /// use chrono::NaiveTime;
    /// use dukkan_core::{ShiftStatus, ShiftWindow};
    ///
    /// let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
    /// let evening = ShiftWindow::new(t(18, 0), t(21, 0)).unwrap();
    /// assert_eq!(evening.status_at(t(15, 0)), ShiftStatus::Available);
    /// assert_eq!(evening.status_at(t(16, 0)), ShiftStatus::Soon);
    /// assert_eq!(evening.status_at(t(18, 0)), ShiftStatus::Passed);
    /// ```
    #[must_use]
    pub fn status_at(&self, now: NaiveTime) -> ShiftStatus {
        if now >= self.start {
            return ShiftStatus::Passed;
        }
        if self.start - now <= TimeDelta::minutes(Self::SOON_MINUTES) {
            ShiftStatus::Soon
        } else {
            ShiftStatus::Available
        }
    }

    /// `18:00 - 21:00`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Store-local wall-clock time for a UTC instant.
///
/// # Errors
///
/// Returns [`ShiftWindowError::InvalidOffset`] if the offset exceeds ±24h.
pub fn store_local_time(
    now: DateTime<Utc>,
    utc_offset_minutes: i32,
) -> Result<NaiveTime, ShiftWindowError> {
    let offset = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or(ShiftWindowError::InvalidOffset(utc_offset_minutes))?;
    Ok(now.with_timezone(&offset).time())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_window_requires_end_after_start() {
        assert!(ShiftWindow::new(t(9, 0), t(12, 0)).is_ok());
        assert_eq!(
            ShiftWindow::new(t(12, 0), t(12, 0)),
            Err(ShiftWindowError::EndNotAfterStart)
        );
        assert_eq!(
            ShiftWindow::new(t(12, 0), t(9, 0)),
            Err(ShiftWindowError::EndNotAfterStart)
        );
    }

    #[test]
    fn test_status_boundaries() {
        let shift = ShiftWindow::new(t(14, 0), t(17, 0)).unwrap();
        assert_eq!(shift.status_at(t(11, 59)), ShiftStatus::Available);
        assert_eq!(shift.status_at(t(12, 0)), ShiftStatus::Soon);
        assert_eq!(shift.status_at(t(13, 59)), ShiftStatus::Soon);
        assert_eq!(shift.status_at(t(14, 0)), ShiftStatus::Passed);
        assert_eq!(shift.status_at(t(16, 30)), ShiftStatus::Passed);
    }

    #[test]
    fn test_passed_is_not_selectable() {
        assert!(!ShiftStatus::Passed.is_selectable());
        assert!(ShiftStatus::Soon.is_selectable());
        assert!(ShiftStatus::Available.is_selectable());
    }

    #[test]
    fn test_store_local_time_applies_offset() {
        let utc = Utc.with_ymd_and_hms(2026, 3, 1, 22, 30, 0).unwrap();
        assert_eq!(store_local_time(utc, 180).unwrap(), t(1, 30));
        assert_eq!(store_local_time(utc, 0).unwrap(), t(22, 30));
        assert!(store_local_time(utc, 100_000).is_err());
    }

    #[test]
    fn test_label() {
        let shift = ShiftWindow::new(t(9, 0), t(12, 30)).unwrap();
        assert_eq!(shift.label(), "09:00 - 12:30");
    }
}
