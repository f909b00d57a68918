//! Order fulfilment.
//!
//! Status changes lock the order row, check the transition against
//! [`OrderStatus::can_transition_to`], and write the customer notice in the
//! same transaction. Canceling returns the items to stock.

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use dukkan_core::{
    DriverId, GeoPoint, Money, OrderId, OrderNumber, OrderStatus, OrderTotals, Page,
    PaymentMethod, ProductId, ShiftWindow, UserId,
};

use super::{RepositoryError, like_pattern};
use crate::models::{
    AddressView, AssignedDriver, CustomerNotice, OrderDetail, OrderFilter, OrderItem,
    OrderListItem,
};

/// Why an order update was refused.
#[derive(Debug, Error)]
pub enum OrderUpdateError {
    #[error("order not found")]
    NotFound,

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("driver is missing or inactive")]
    DriverUnavailable,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderUpdateError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ListRow {
    id: i32,
    order_number: OrderNumber,
    recipient_name: String,
    customer_email: String,
    status: OrderStatus,
    amount: Decimal,
    item_count: i64,
    driver_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ListRow> for OrderListItem {
    fn from(row: ListRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            recipient_name: row.recipient_name,
            customer_email: row.customer_email,
            status: row.status,
            amount: Money::new(row.amount),
            item_count: row.item_count,
            driver_name: row.driver_name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DetailRow {
    id: i32,
    order_number: OrderNumber,
    customer_id: i32,
    customer_email: String,
    status: OrderStatus,
    payment_method: PaymentMethod,
    subtotal: Decimal,
    delivery_fee: Decimal,
    tax: Decimal,
    amount: Decimal,
    recipient_name: String,
    recipient_phone: String,
    label: Option<String>,
    district: String,
    street: String,
    building: String,
    floor: Option<String>,
    apartment: Option<String>,
    landmark: Option<String>,
    instructions: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    shift_name: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    driver_id: Option<i32>,
    driver_name: Option<String>,
    driver_phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    product_id: i32,
    product_name: String,
    quantity: i32,
    price: Decimal,
}

impl From<ItemRow> for OrderItem {
    fn from(row: ItemRow) -> Self {
        Self {
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            quantity: row.quantity,
            price: Money::new(row.price),
        }
    }
}

const LIST_SELECT: &str = "SELECT o.id, o.order_number, o.recipient_name, u.email AS customer_email,
            o.status, o.amount,
            (SELECT COALESCE(SUM(i.quantity), 0)::bigint
             FROM dukkan.order_items i WHERE i.order_id = o.id) AS item_count,
            d.full_name AS driver_name, o.created_at
     FROM dukkan.orders o
     JOIN dukkan.users u ON u.id = o.customer_id
     LEFT JOIN dukkan.drivers d ON d.id = o.driver_id";

const LIST_WHERE: &str = "WHERE ($1::dukkan.order_status IS NULL OR o.status = $1)
       AND ($2::text IS NULL OR o.order_number ILIKE $2)";

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of orders, newest first, plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        page: Page,
    ) -> Result<(Vec<OrderListItem>, i64), RepositoryError> {
        let search = filter.search.as_deref().map(like_pattern);

        let count_sql = format!("SELECT COUNT(*) FROM dukkan.orders o {LIST_WHERE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.status)
            .bind(search.as_deref())
            .fetch_one(self.pool)
            .await?;

        let list_sql =
            format!("{LIST_SELECT} {LIST_WHERE} ORDER BY o.created_at DESC LIMIT $3 OFFSET $4");
        let rows = sqlx::query_as::<_, ListRow>(&list_sql)
            .bind(filter.status)
            .bind(search.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Most recent orders for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, limit: i64) -> Result<Vec<OrderListItem>, RepositoryError> {
        let sql = format!("{LIST_SELECT} ORDER BY o.created_at DESC LIMIT $1");
        let rows = sqlx::query_as::<_, ListRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails, or
    /// `RepositoryError::DataCorruption` if the stored shift or location is invalid.
    pub async fn detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, DetailRow>(
            "SELECT o.id, o.order_number, o.customer_id, u.email AS customer_email,
                    o.status, o.payment_method, o.subtotal, o.delivery_fee, o.tax, o.amount,
                    o.recipient_name, o.recipient_phone,
                    a.label, a.district, a.street, a.building, a.floor, a.apartment,
                    a.landmark, a.instructions, a.lat, a.lng,
                    s.name AS shift_name, s.start_time, s.end_time,
                    d.id AS driver_id, d.full_name AS driver_name, d.phone AS driver_phone,
                    o.created_at, o.updated_at
             FROM dukkan.orders o
             JOIN dukkan.users u ON u.id = o.customer_id
             JOIN dukkan.addresses a ON a.id = o.address_id
             JOIN dukkan.shifts s ON s.id = o.shift_id
             LEFT JOIN dukkan.drivers d ON d.id = o.driver_id
             WHERE o.id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, ItemRow>(
            "SELECT product_id, product_name, quantity, price
             FROM dukkan.order_items
             WHERE order_id = $1
             ORDER BY id",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

        let corrupt = |e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.id))
        };
        let shift_window = ShiftWindow::new(row.start_time, row.end_time).map_err(|e| corrupt(&e))?;
        let location = match (row.lat, row.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng).map_err(|e| corrupt(&e))?),
            _ => None,
        };
        let driver = match (row.driver_id, row.driver_name, row.driver_phone) {
            (Some(id), Some(full_name), Some(phone)) => Some(AssignedDriver {
                id: DriverId::new(id),
                full_name,
                phone,
            }),
            _ => None,
        };

        Ok(Some(OrderDetail {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            customer_id: UserId::new(row.customer_id),
            customer_email: row.customer_email,
            status: row.status,
            payment_method: row.payment_method,
            totals: OrderTotals {
                subtotal: Money::new(row.subtotal),
                delivery_fee: Money::new(row.delivery_fee),
                tax: Money::new(row.tax),
                total: Money::new(row.amount),
            },
            recipient_name: row.recipient_name,
            recipient_phone: row.recipient_phone,
            address: AddressView {
                label: row.label,
                district: row.district,
                street: row.street,
                building: row.building,
                floor: row.floor,
                apartment: row.apartment,
                landmark: row.landmark,
                instructions: row.instructions,
                location,
            },
            shift_name: row.shift_name,
            shift_window,
            driver,
            items,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    /// Move an order to `next` and notify the customer. Returns the status
    /// it had before.
    ///
    /// # Errors
    ///
    /// Returns `OrderUpdateError::NotFound` for an unknown order and
    /// `OrderUpdateError::InvalidTransition` when the lifecycle forbids the move.
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<OrderStatus, OrderUpdateError> {
        let mut tx = self.pool.begin().await?;
        let (current, order_number, customer_id) = lock_order(&mut tx, id).await?;

        if !current.can_transition_to(next) {
            return Err(OrderUpdateError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        sqlx::query("UPDATE dukkan.orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(next)
            .execute(&mut *tx)
            .await?;

        if next == OrderStatus::Canceled {
            restock(&mut tx, id).await?;
        }

        let notice = CustomerNotice::status_changed(&order_number, next);
        notify(&mut tx, customer_id, &notice).await?;

        tx.commit().await?;
        Ok(current)
    }

    /// Assign an active driver. A pending order goes out for delivery.
    ///
    /// Returns the resulting status.
    ///
    /// # Errors
    ///
    /// Returns `OrderUpdateError::DriverUnavailable` if the driver is missing
    /// or inactive and `OrderUpdateError::InvalidTransition` if the order is
    /// already delivered or canceled.
    pub async fn assign_driver(
        &self,
        id: OrderId,
        driver_id: DriverId,
    ) -> Result<OrderStatus, OrderUpdateError> {
        let mut tx = self.pool.begin().await?;
        let (current, order_number, customer_id) = lock_order(&mut tx, id).await?;

        if current.is_terminal() {
            return Err(OrderUpdateError::InvalidTransition {
                from: current,
                to: OrderStatus::InTransit,
            });
        }

        let driver_name: Option<String> = sqlx::query_scalar(
            "SELECT full_name FROM dukkan.drivers WHERE id = $1 AND is_active",
        )
        .bind(driver_id)
        .fetch_optional(&mut *tx)
        .await?;
        let driver_name = driver_name.ok_or(OrderUpdateError::DriverUnavailable)?;

        let status = if current == OrderStatus::Pending {
            OrderStatus::InTransit
        } else {
            current
        };

        sqlx::query(
            "UPDATE dukkan.orders SET driver_id = $2, status = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(driver_id)
        .bind(status)
        .execute(&mut *tx)
        .await?;

        let notice = CustomerNotice::driver_assigned(&order_number, &driver_name);
        notify(&mut tx, customer_id, &notice).await?;

        tx.commit().await?;
        Ok(status)
    }
}

async fn lock_order(
    tx: &mut Transaction<'_, Postgres>,
    id: OrderId,
) -> Result<(OrderStatus, OrderNumber, UserId), OrderUpdateError> {
    let row: Option<(OrderStatus, OrderNumber, UserId)> = sqlx::query_as(
        "SELECT status, order_number, customer_id FROM dukkan.orders WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    row.ok_or(OrderUpdateError::NotFound)
}

async fn restock(tx: &mut Transaction<'_, Postgres>, id: OrderId) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE dukkan.products p
         SET stock = p.stock + i.quantity, updated_at = NOW()
         FROM dukkan.order_items i
         WHERE i.order_id = $1 AND p.id = i.product_id",
    )
    .bind(id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn notify(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: UserId,
    notice: &CustomerNotice,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO dukkan.user_notifications (user_id, title, body, link)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(customer_id)
    .bind(&notice.title)
    .bind(&notice.body)
    .bind(&notice.link)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
