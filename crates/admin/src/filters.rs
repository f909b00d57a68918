//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::borrow::Borrow;
use std::fmt::Display;
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, Utc};

use dukkan_core::Money;

static STORE_OFFSET: OnceLock<FixedOffset> = OnceLock::new();

/// Set the offset used by [`local_datetime`]. Later calls are ignored.
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

/// Store-local `YYYY-MM-DD HH:MM`; UTC until an offset is set.
///
/// Usage in templates: `{{ order.created_at|local_datetime }}`
#[askama::filter_fn]
pub fn local_datetime(
    value: impl Borrow<DateTime<Utc>>,
    _env: &dyn askama::Values,
) -> askama::Result<String> {
    Ok(format_local(value.borrow()))
}

/// Amount in the admin's English style, e.g. `SAR 12.50`.
///
/// Usage in templates: `{{ product.price|sar }}`
#[askama::filter_fn]
pub fn sar(value: impl Borrow<Money>, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_sar(value.borrow()))
}

fn format_sar(value: &Money) -> String {
    format!("SAR {:.2}", value.rounded())
}

fn format_local(value: &DateTime<Utc>) -> String {
    const FORMAT: &str = "%Y-%m-%d %H:%M";
    match STORE_OFFSET.get() {
        Some(offset) => value.with_timezone(offset).format(FORMAT).to_string(),
        None => value.format(FORMAT).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_format_sar_rounds_to_halalas() {
        assert_eq!(format_sar(&Money::new(Decimal::new(125, 1))), "SAR 12.50");
        assert_eq!(format_sar(&Money::new(Decimal::new(74375, 4))), "SAR 7.44");
    }

    #[test]
    fn test_format_local_defaults_to_utc() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 21, 30, 0).single();
        let formatted = at.map(|at| format_local(&at));
        // The offset is process-global; only check the shape.
        assert!(formatted.is_some_and(|f| f.len() == "2025-03-01 21:30".len()));
    }
}
