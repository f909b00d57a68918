//! Account pages: order history, tracking and notifications.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use dukkan_core::OrderNumber;

use crate::db::{NotificationRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Notification, OrderDetail, OrderSummary};
use crate::routes::PageContext;
use crate::state::AppState;

/// Notifications shown on the notifications page.
const NOTIFICATION_LIMIT: i64 = 50;

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<OrderSummary>,
}

/// Order tracking template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub ctx: PageContext,
    pub order: OrderDetail,
    pub message: Option<String>,
}

/// Notifications template.
#[derive(Template, WebTemplate)]
#[template(path = "account/notifications.html")]
pub struct NotificationsTemplate {
    pub ctx: PageContext,
    pub notifications: Vec<Notification>,
}

fn parse_number(raw: &str) -> Result<OrderNumber> {
    OrderNumber::parse(raw).map_err(|_| AppError::NotFound(format!("order {raw}")))
}

async fn load_order(
    state: &AppState,
    user: &CurrentUser,
    number: &OrderNumber,
) -> Result<OrderDetail> {
    OrderRepository::new(state.pool())
        .detail_for_customer(user.id, number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {number}")))
}

/// `/account` lands on the order history.
pub async fn index(RequireAuth(_user): RequireAuth) -> Redirect {
    Redirect::to("/account/orders")
}

/// The customer's orders, newest first.
///
/// # Errors
///
/// Returns an error if orders cannot be loaded.
#[instrument(skip(state, ctx), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(user.id)
        .await?;
    Ok(OrdersTemplate { ctx, orders })
}

/// Order tracking page. Other customers' orders are 404.
///
/// # Errors
///
/// Returns 404 if the order is unknown or not the customer's.
#[instrument(skip(state, ctx), fields(user_id = %user.id))]
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Path(number): Path<String>,
) -> Result<impl IntoResponse> {
    let number = parse_number(&number)?;
    let order = load_order(&state, &user, &number).await?;
    Ok(OrderTemplate {
        ctx,
        order,
        message: None,
    })
}

/// Cancel a pending order.
///
/// # Errors
///
/// Returns 404 if the order is unknown or not the customer's.
#[instrument(skip(state, ctx), fields(user_id = %user.id))]
pub async fn cancel_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Path(number): Path<String>,
) -> Result<Response> {
    let number = parse_number(&number)?;

    if OrderRepository::new(state.pool())
        .cancel_pending(user.id, &number)
        .await?
    {
        tracing::info!(order_number = %number, "Order canceled by customer");
        return Ok(Redirect::to(&format!("/account/orders/{number}")).into_response());
    }

    let order = load_order(&state, &user, &number).await?;
    let page = OrderTemplate {
        ctx,
        order,
        message: Some("لا يمكن إلغاء الطلب بعد خروجه للتوصيل".to_string()),
    };
    Ok((StatusCode::CONFLICT, page).into_response())
}

/// Latest notifications.
///
/// # Errors
///
/// Returns an error if notifications cannot be loaded.
#[instrument(skip(state, ctx), fields(user_id = %user.id))]
pub async fn notifications(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let notifications = NotificationRepository::new(state.pool())
        .list(user.id, NOTIFICATION_LIMIT)
        .await?;
    Ok(NotificationsTemplate { ctx, notifications })
}

/// Mark every notification read.
///
/// # Errors
///
/// Returns an error if the update fails.
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn mark_notifications_read(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Redirect> {
    let marked = NotificationRepository::new(state.pool())
        .mark_all_read(user.id)
        .await?;
    tracing::debug!(marked, "Notifications marked read");
    Ok(Redirect::to("/account/notifications"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_order_number_is_not_found() {
        assert!(matches!(parse_number("not-an-order"), Err(AppError::NotFound(_))));
    }
}
