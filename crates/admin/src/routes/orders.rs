//! Order management route handlers.
//!
//! Staff move orders along `PENDING → IN_TRANSIT → DELIVERED` (or cancel
//! them) and assign drivers. Every change notifies the customer in-app.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use dukkan_core::{DriverId, OrderId, OrderStatus, Page};

use crate::components::DataTableConfig;
use crate::components::data_table::orders_table_config;
use crate::db::{DriverRepository, OrderRepository, OrderUpdateError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::set_flash;
use crate::models::{Driver, OrderDetail, OrderFilter, OrderListItem};
use crate::routes::{PageContext, optional, parse_optional_i32, push_query};
use crate::state::AppState;

const PER_PAGE: u32 = 25;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrderQuery {
    pub status: String,
    pub q: String,
    pub page: Option<u32>,
}

impl OrderQuery {
    /// Unknown status values are ignored rather than rejected.
    #[must_use]
    pub fn filter(&self) -> OrderFilter {
        OrderFilter {
            status: self.status.parse().ok(),
            search: optional(&self.q),
        }
    }

    #[must_use]
    pub fn page_query(&self) -> String {
        let filter = self.filter();
        let mut query = String::new();
        push_query(
            &mut query,
            "status",
            filter.status.map(OrderStatus::as_str).unwrap_or_default(),
        );
        push_query(&mut query, "q", filter.search.as_deref().unwrap_or_default());
        query
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct DriverForm {
    #[serde(default)]
    pub driver_id: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub ctx: PageContext,
    pub table: DataTableConfig,
    pub orders: Vec<OrderListItem>,
    pub page: Page,
    pub total: i64,
    pub total_pages: u32,
    pub page_query: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub ctx: PageContext,
    pub order: OrderDetail,
    pub drivers: Vec<Driver>,
    pub error: Option<String>,
}

impl OrderShowTemplate {
    #[must_use]
    pub fn is_assigned(&self, driver: &Driver) -> bool {
        self.order.driver_id() == Some(driver.id)
    }
}

/// Order listing.
///
/// # Errors
///
/// Returns an error if the orders cannot be loaded.
#[instrument(skip(state, ctx, query))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<OrderQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.filter();
    let page = Page::new(query.page, PER_PAGE);
    let (orders, total) = OrderRepository::new(state.pool())
        .list(&filter, page)
        .await?;

    Ok(OrdersIndexTemplate {
        ctx,
        table: orders_table_config(&filter),
        orders,
        page,
        total,
        total_pages: page.total_pages(total),
        page_query: query.page_query(),
    })
}

async fn detail_page(
    state: &AppState,
    ctx: PageContext,
    id: OrderId,
    error: Option<String>,
) -> Result<OrderShowTemplate> {
    let order = OrderRepository::new(state.pool())
        .detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    let drivers = DriverRepository::new(state.pool()).active().await?;

    Ok(OrderShowTemplate {
        ctx,
        order,
        drivers,
        error,
    })
}

/// Order detail with status and driver controls.
///
/// # Errors
///
/// Returns 404 if the order does not exist.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    detail_page(&state, ctx, OrderId::new(id), None).await
}

/// Re-render the detail page explaining why a change was refused.
async fn refused(
    state: &AppState,
    ctx: PageContext,
    id: OrderId,
    err: &OrderUpdateError,
) -> Result<Response> {
    let message = match err {
        OrderUpdateError::InvalidTransition { from, to } => format!(
            "A {} order cannot be marked {}",
            from.label().to_lowercase(),
            to.label().to_lowercase()
        ),
        OrderUpdateError::DriverUnavailable => {
            "That driver is not available. Choose an active driver.".to_string()
        }
        other => other.to_string(),
    };
    let page = detail_page(state, ctx, id, Some(message)).await?;
    Ok((StatusCode::CONFLICT, page).into_response())
}

/// Move an order to its next status.
///
/// # Errors
///
/// Returns 400 for an unknown status and 404 for an unknown order.
#[instrument(skip(state, session, ctx, form), fields(status = %form.status))]
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(id): Path<i32>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let id = OrderId::new(id);
    let next: OrderStatus = form.status.parse().map_err(AppError::BadRequest)?;

    match OrderRepository::new(state.pool())
        .update_status(id, next)
        .await
    {
        Ok(previous) => {
            tracing::info!(order_id = %id, %previous, %next, admin_id = %ctx.admin.id, "Order status changed");
            set_flash(&session, format!("Order marked {}", next.label().to_lowercase())).await?;
            Ok(Redirect::to(&format!("/orders/{id}")).into_response())
        }
        Err(err @ OrderUpdateError::InvalidTransition { .. }) => {
            refused(&state, ctx, id, &err).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Assign a driver. Pending orders go out for delivery.
///
/// # Errors
///
/// Returns 400 for a malformed driver id and 404 for an unknown order.
#[instrument(skip(state, session, ctx, form), fields(driver_id = %form.driver_id))]
pub async fn assign_driver(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(id): Path<i32>,
    Form(form): Form<DriverForm>,
) -> Result<Response> {
    let id = OrderId::new(id);
    let driver_id = parse_optional_i32(Some(&form.driver_id))
        .map(DriverId::new)
        .ok_or_else(|| AppError::BadRequest("choose a driver".to_string()))?;

    match OrderRepository::new(state.pool())
        .assign_driver(id, driver_id)
        .await
    {
        Ok(status) => {
            tracing::info!(order_id = %id, %driver_id, %status, admin_id = %ctx.admin.id, "Driver assigned");
            set_flash(&session, "Driver assigned").await?;
            Ok(Redirect::to(&format!("/orders/{id}")).into_response())
        }
        Err(
            err @ (OrderUpdateError::InvalidTransition { .. } | OrderUpdateError::DriverUnavailable),
        ) => refused(&state, ctx, id, &err).await,
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parses_status_case_insensitively() {
        let query = OrderQuery {
            status: "in_transit".to_string(),
            q: " 2401 ".to_string(),
            page: None,
        };
        let filter = query.filter();
        assert_eq!(filter.status, Some(OrderStatus::InTransit));
        assert_eq!(filter.search.as_deref(), Some("2401"));
        assert_eq!(query.page_query(), "status=IN_TRANSIT&q=2401&");
    }

    #[test]
    fn test_unknown_status_is_ignored() {
        let query = OrderQuery {
            status: "LOST".to_string(),
            ..OrderQuery::default()
        };
        assert_eq!(query.filter(), OrderFilter::default());
    }
}
