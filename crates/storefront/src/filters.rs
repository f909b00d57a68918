//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::borrow::Borrow;
use std::fmt::Display;
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, Utc};

/// Store-local offset for timestamps; set once at startup.
static STORE_OFFSET: OnceLock<FixedOffset> = OnceLock::new();

/// Offset used before [`set_store_offset`] is called (UTC+3).
const DEFAULT_OFFSET_SECONDS: i32 = 3 * 3600;

/// Set the offset used by the date filters. Later calls are ignored.
pub fn set_store_offset(utc_offset_minutes: i32) {
    if let Some(offset) = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
    {
        let _ = STORE_OFFSET.set(offset);
    }
}

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a UTC timestamp as store-local `YYYY/MM/DD HH:MM`.
///
/// Usage in templates: `{{ order.created_at|local_datetime }}`
#[askama::filter_fn]
pub fn local_datetime(
    value: impl Borrow<DateTime<Utc>>,
    _env: &dyn askama::Values,
) -> askama::Result<String> {
    Ok(format_local(value.borrow(), "%Y/%m/%d %H:%M"))
}

/// Formats a UTC timestamp as a store-local date.
///
/// Usage in templates: `{{ review.created_at|local_date }}`
#[askama::filter_fn]
pub fn local_date(
    value: impl Borrow<DateTime<Utc>>,
    _env: &dyn askama::Values,
) -> askama::Result<String> {
    Ok(format_local(value.borrow(), "%Y/%m/%d"))
}

fn store_offset() -> Option<FixedOffset> {
    STORE_OFFSET
        .get()
        .copied()
        .or_else(|| FixedOffset::east_opt(DEFAULT_OFFSET_SECONDS))
}

fn format_local(value: &DateTime<Utc>, fmt: &str) -> String {
    store_offset().map_or_else(
        || value.format(fmt).to_string(),
        |offset| value.with_timezone(&offset).format(fmt).to_string(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_format_local_shifts_to_store_time() {
        let Some(utc) = Utc.with_ymd_and_hms(2026, 3, 1, 22, 30, 0).single() else {
            panic!("valid timestamp");
        };
        assert_eq!(format_local(&utc, "%Y/%m/%d %H:%M"), "2026/03/02 01:30");
    }
}
