//! Dashboard figures.

use chrono::{DateTime, FixedOffset, Utc};

use dukkan_core::Money;

#[derive(Debug, Clone, Default)]
pub struct DashboardMetrics {
    /// Orders placed since store-local midnight.
    pub orders_today: i64,
    /// Sum of all non-canceled order totals.
    pub revenue: Money,
    pub pending_orders: i64,
    pub active_products: i64,
    /// Active products at or below the low-stock threshold.
    pub low_stock_products: i64,
}

/// UTC instant of the most recent store-local midnight.
///
/// Returns `None` if the offset exceeds ±24h.
#[must_use]
pub fn store_day_start(now: DateTime<Utc>, utc_offset_minutes: i32) -> Option<DateTime<Utc>> {
    let offset = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)?;
    now.with_timezone(&offset)
        .date_naive()
        .and_hms_opt(0, 0, 0)?
        .and_local_timezone(offset)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_day_start_follows_store_date() {
        // 22:30 UTC is already 01:30 the next day at UTC+3.
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 22, 30, 0).unwrap();
        assert_eq!(
            store_day_start(now, 180),
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 21, 0, 0).unwrap())
        );
        assert_eq!(
            store_day_start(now, 0),
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_day_start_rejects_bad_offset() {
        assert_eq!(store_day_start(Utc::now(), 100_000), None);
    }
}
