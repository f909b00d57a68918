//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use tracing::instrument;

use crate::db::{DashboardRepository, OrderRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::{DashboardMetrics, OrderListItem, ProductListItem, store_day_start};
use crate::routes::PageContext;
use crate::state::AppState;

const RECENT_ORDERS: i64 = 10;
const LOW_STOCK_ROWS: i64 = 10;

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub metrics: DashboardMetrics,
    pub recent_orders: Vec<OrderListItem>,
    pub low_stock: Vec<ProductListItem>,
}

/// Display the dashboard.
///
/// # Errors
///
/// Returns an error if the counters cannot be loaded.
#[instrument(skip(state, ctx), fields(admin_id = %ctx.admin.id))]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let day_start = store_day_start(Utc::now(), state.config().store_utc_offset_minutes)
        .ok_or_else(|| AppError::Internal("invalid store UTC offset".to_string()))?;

    let metrics = DashboardRepository::new(state.pool())
        .metrics(day_start)
        .await?;
    let recent_orders = OrderRepository::new(state.pool())
        .recent(RECENT_ORDERS)
        .await?;
    let low_stock = ProductRepository::new(state.pool())
        .low_stock(LOW_STOCK_ROWS)
        .await?;

    Ok(DashboardTemplate {
        ctx,
        metrics,
        recent_orders,
        low_stock,
    })
}
