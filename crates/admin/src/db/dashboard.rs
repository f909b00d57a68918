//! Dashboard aggregates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use dukkan_core::Money;

use super::RepositoryError;
use crate::models::{DashboardMetrics, LOW_STOCK_THRESHOLD};

#[derive(Debug, sqlx::FromRow)]
struct MetricsRow {
    orders_today: i64,
    revenue: Decimal,
    pending_orders: i64,
    active_products: i64,
    low_stock_products: i64,
}

pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All dashboard counters in one round trip.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn metrics(
        &self,
        day_start: DateTime<Utc>,
    ) -> Result<DashboardMetrics, RepositoryError> {
        let row = sqlx::query_as::<_, MetricsRow>(
            "SELECT
                 (SELECT COUNT(*) FROM dukkan.orders WHERE created_at >= $1) AS orders_today,
                 (SELECT COALESCE(SUM(amount), 0) FROM dukkan.orders
                  WHERE status <> 'CANCELED') AS revenue,
                 (SELECT COUNT(*) FROM dukkan.orders WHERE status = 'PENDING') AS pending_orders,
                 (SELECT COUNT(*) FROM dukkan.products WHERE is_active) AS active_products,
                 (SELECT COUNT(*) FROM dukkan.products
                  WHERE is_active AND stock <= $2) AS low_stock_products",
        )
        .bind(day_start)
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(self.pool)
        .await?;

        Ok(DashboardMetrics {
            orders_today: row.orders_today,
            revenue: Money::new(row.revenue),
            pending_orders: row.pending_orders,
            active_products: row.active_products,
            low_stock_products: row.low_stock_products,
        })
    }
}
