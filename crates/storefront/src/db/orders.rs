//! Orders: the checkout transaction and order tracking.
//!
//! [`OrderRepository::place`] is the only writer of new orders. It runs the
//! whole checkout in one transaction: idempotency lookup, cart lock,
//! ownership checks, item snapshot, guarded stock decrement, profile update,
//! notification and cart clearing.

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use dukkan_core::{
    Money, OrderId, OrderNumber, OrderStatus, OrderTotals, PaymentMethod, ProductId, ShiftWindow,
    UserId,
};

use super::{
    AddressRepository, CartRepository, NotificationRepository, RepositoryError,
    ShiftRepository, to_u32,
};
use crate::models::{
    NewNotification, NewOrder, OrderDetail, OrderItem, OrderSummary, PlacedOrder,
};

/// Business failures of the checkout transaction.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("address not found")]
    AddressNotFound,

    #[error("shift not found or inactive")]
    ShiftNotFound,

    #[error("insufficient stock for {0}")]
    OutOfStock(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PlaceOrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(e.into())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlacedRow {
    id: i32,
    order_number: OrderNumber,
    amount: Decimal,
    item_count: i64,
    created_at: DateTime<Utc>,
}

impl PlacedRow {
    fn into_placed(self, replayed: bool, profile_updated: bool) -> Result<PlacedOrder, RepositoryError> {
        let item_count = u32::try_from(self.item_count).map_err(|_| {
            RepositoryError::DataCorruption(format!("item count {}", self.item_count))
        })?;
        Ok(PlacedOrder {
            id: OrderId::new(self.id),
            order_number: self.order_number,
            amount: Money::new(self.amount),
            item_count,
            created_at: self.created_at,
            replayed,
            profile_updated,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: i32,
    order_number: OrderNumber,
    status: OrderStatus,
    payment_method: PaymentMethod,
    amount: Decimal,
    item_count: i64,
    created_at: DateTime<Utc>,
}

impl From<SummaryRow> for OrderSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            status: row.status,
            payment_method: row.payment_method,
            amount: Money::new(row.amount),
            item_count: row.item_count,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DetailRow {
    id: i32,
    order_number: OrderNumber,
    status: OrderStatus,
    payment_method: PaymentMethod,
    subtotal: Decimal,
    delivery_fee: Decimal,
    tax: Decimal,
    amount: Decimal,
    recipient_name: String,
    recipient_phone: String,
    district: String,
    street: String,
    building: String,
    shift_name: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    driver_name: Option<String>,
    driver_phone: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    product_id: i32,
    product_name: String,
    product_slug: Option<String>,
    quantity: i32,
    price: Decimal,
}

impl TryFrom<ItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            product_slug: row.product_slug,
            quantity: to_u32(row.quantity, "quantity")?,
            price: Money::new(row.price),
        })
    }
}

const PLACED_SELECT: &str = "
    SELECT o.id, o.order_number, o.amount, o.created_at,
           COALESCE((SELECT SUM(quantity) FROM dukkan.order_items WHERE order_id = o.id), 0)::BIGINT
               AS item_count
    FROM dukkan.orders o";

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order from the customer's cart.
    ///
    /// A retry with an idempotency key that already produced an order for
    /// this customer returns that order with `replayed = true` and changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns a [`PlaceOrderError`] business variant when the cart is empty,
    /// the address is not the customer's, the shift is missing or inactive,
    /// or a product no longer has enough stock. Nothing is written in those
    /// cases.
    pub async fn place(&self, order: &NewOrder) -> Result<PlacedOrder, PlaceOrderError> {
        if let Some(existing) = self
            .find_by_idempotency_key(order.customer_id, order.idempotency_key)
            .await?
        {
            return Ok(existing);
        }

        let mut tx = self.pool.begin().await?;

        let cart = CartRepository::get_for_update(&mut tx, order.customer_id).await?;
        if cart.is_empty() {
            return Err(PlaceOrderError::EmptyCart);
        }
        if let Some(line) = cart.lines.iter().find(|l| !l.is_available()) {
            return Err(PlaceOrderError::OutOfStock(line.name.clone()));
        }

        AddressRepository::find_owned(&mut *tx, order.customer_id, order.address_id)
            .await?
            .ok_or(PlaceOrderError::AddressNotFound)?;
        ShiftRepository::find_active(&mut *tx, order.shift_id)
            .await?
            .ok_or(PlaceOrderError::ShiftNotFound)?;

        let totals = cart.totals();
        let inserted = insert_order(&mut tx, order, &totals).await?;
        let Some((order_id, created_at, order_number)) = inserted else {
            // A concurrent submission with the same key committed first.
            drop(tx);
            return self
                .find_by_idempotency_key(order.customer_id, order.idempotency_key)
                .await?
                .ok_or_else(|| {
                    RepositoryError::Conflict("idempotency key used by another customer".into())
                        .into()
                });
        };

        for line in &cart.lines {
            sqlx::query(
                "INSERT INTO dukkan.order_items (order_id, product_id, product_name, quantity, price)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
            .bind(line.unit_price.amount())
            .execute(&mut *tx)
            .await?;

            let decremented = sqlx::query(
                "UPDATE dukkan.products
                 SET stock = stock - $2, updated_at = NOW()
                 WHERE id = $1 AND is_active AND stock >= $2",
            )
            .bind(line.product_id)
            .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if decremented == 0 {
                return Err(PlaceOrderError::OutOfStock(line.name.clone()));
            }
        }

        let profile_updated = sqlx::query(
            "UPDATE dukkan.users
             SET full_name = $2, phone = $3, updated_at = NOW()
             WHERE id = $1
               AND (full_name IS DISTINCT FROM $2 OR phone IS DISTINCT FROM $3)",
        )
        .bind(order.customer_id)
        .bind(order.recipient_name.as_str())
        .bind(order.recipient_phone.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        let notification = NewNotification::order_placed(&order_number, totals.total);
        NotificationRepository::insert(&mut *tx, order.customer_id, &notification).await?;

        CartRepository::clear(&mut tx, cart.id).await?;

        tx.commit().await?;

        Ok(PlacedOrder {
            id: order_id,
            order_number,
            amount: totals.total,
            item_count: cart.item_count(),
            created_at,
            replayed: false,
            profile_updated,
        })
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_idempotency_key(
        &self,
        customer_id: UserId,
        key: Uuid,
    ) -> Result<Option<PlacedOrder>, RepositoryError> {
        let sql = format!("{PLACED_SELECT} WHERE o.idempotency_key = $1 AND o.customer_id = $2");
        let row = sqlx::query_as::<_, PlacedRow>(&sql)
            .bind(key)
            .bind(customer_id)
            .fetch_optional(self.pool)
            .await?;

        row.map(|r| r.into_placed(true, false)).transpose()
    }

    /// The customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: UserId,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT o.id, o.order_number, o.status, o.payment_method, o.amount, o.created_at,
                    COALESCE(SUM(i.quantity), 0)::BIGINT AS item_count
             FROM dukkan.orders o
             LEFT JOIN dukkan.order_items i ON i.order_id = o.id
             WHERE o.customer_id = $1
             GROUP BY o.id
             ORDER BY o.created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Order detail by number, only if it belongs to the customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn detail_for_customer(
        &self,
        customer_id: UserId,
        order_number: &OrderNumber,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, DetailRow>(
            "SELECT o.id, o.order_number, o.status, o.payment_method,
                    o.subtotal, o.delivery_fee, o.tax, o.amount,
                    o.recipient_name, o.recipient_phone,
                    a.district, a.street, a.building,
                    s.name AS shift_name, s.start_time, s.end_time,
                    d.full_name AS driver_name, d.phone AS driver_phone,
                    o.created_at
             FROM dukkan.orders o
             JOIN dukkan.addresses a ON a.id = o.address_id
             JOIN dukkan.shifts s ON s.id = o.shift_id
             LEFT JOIN dukkan.drivers d ON d.id = o.driver_id
             WHERE o.order_number = $1 AND o.customer_id = $2",
        )
        .bind(order_number)
        .bind(customer_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, ItemRow>(
            "SELECT i.product_id, i.product_name, p.slug AS product_slug, i.quantity, i.price
             FROM dukkan.order_items i
             LEFT JOIN dukkan.products p ON p.id = i.product_id AND p.is_active
             WHERE i.order_id = $1
             ORDER BY i.id",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<_>, _>>()?;

        let shift_window = ShiftWindow::new(row.start_time, row.end_time)
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", row.id)))?;

        Ok(Some(OrderDetail {
            id: OrderId::new(row.id),
            order_number: row.order_number,
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
            address_summary: format!("{}، {}، مبنى {}", row.district, row.street, row.building),
            shift_name: row.shift_name,
            shift_window,
            driver_name: row.driver_name,
            driver_phone: row.driver_phone,
            items,
            created_at: row.created_at,
        }))
    }

    /// Cancel a pending order and return its items to stock.
    ///
    /// Returns `false` if the order is not the customer's or is no longer
    /// pending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn cancel_pending(
        &self,
        customer_id: UserId,
        order_number: &OrderNumber,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_id: Option<OrderId> = sqlx::query_scalar(
            "UPDATE dukkan.orders SET status = 'CANCELED', updated_at = NOW()
             WHERE order_number = $1 AND customer_id = $2 AND status = 'PENDING'
             RETURNING id",
        )
        .bind(order_number)
        .bind(customer_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order_id) = order_id else {
            return Ok(false);
        };

        sqlx::query(
            "UPDATE dukkan.products p
             SET stock = p.stock + i.quantity, updated_at = NOW()
             FROM dukkan.order_items i
             WHERE i.order_id = $1 AND p.id = i.product_id",
        )
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

/// Order numbers tried before a checkout gives up on finding a free one.
const ORDER_NUMBER_ATTEMPTS: usize = 5;

/// Insert the order row, moving to the next free order number if the
/// requested one is taken.
///
/// Returns `None` when the idempotency key already has an order.
async fn insert_order(
    tx: &mut Transaction<'_, Postgres>,
    order: &NewOrder,
    totals: &OrderTotals,
) -> Result<Option<(OrderId, DateTime<Utc>, OrderNumber)>, RepositoryError> {
    let mut order_number = order.order_number.clone();

    for _ in 0..ORDER_NUMBER_ATTEMPTS {
        let row: Option<(OrderId, DateTime<Utc>)> = sqlx::query_as(
            "INSERT INTO dukkan.orders
                 (order_number, idempotency_key, customer_id, address_id, shift_id,
                  payment_method, subtotal, delivery_fee, tax, amount,
                  recipient_name, recipient_phone)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             ON CONFLICT DO NOTHING
             RETURNING id, created_at",
        )
        .bind(&order_number)
        .bind(order.idempotency_key)
        .bind(order.customer_id)
        .bind(order.address_id)
        .bind(order.shift_id)
        .bind(order.payment_method)
        .bind(totals.subtotal.amount())
        .bind(totals.delivery_fee.amount())
        .bind(totals.tax.amount())
        .bind(totals.total.amount())
        .bind(order.recipient_name.as_str())
        .bind(order.recipient_phone.as_str())
        .fetch_optional(&mut **tx)
        .await?;

        if let Some((id, created_at)) = row {
            return Ok(Some((id, created_at, order_number)));
        }

        let key_used: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM dukkan.orders WHERE idempotency_key = $1)",
        )
        .bind(order.idempotency_key)
        .fetch_one(&mut **tx)
        .await?;
        if key_used {
            return Ok(None);
        }

        tracing::debug!(%order_number, "Order number taken, trying the next one");
        order_number = order_number.successor();
    }

    Err(RepositoryError::Conflict("order number already exists".to_string()))
}
