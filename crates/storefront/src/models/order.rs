//! Orders as placed at checkout and shown in the account pages.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use dukkan_core::{
    AddressId, FullName, Money, OrderId, OrderNumber, OrderStatus, OrderTotals, PaymentMethod,
    PhoneNumber, ProductId, ShiftId, ShiftWindow, UserId,
};

/// Everything needed to persist a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub idempotency_key: Uuid,
    pub order_number: OrderNumber,
    pub customer_id: UserId,
    pub address_id: AddressId,
    pub shift_id: ShiftId,
    pub payment_method: PaymentMethod,
    pub recipient_name: FullName,
    pub recipient_phone: PhoneNumber,
}

/// Result of a checkout attempt that reached the database.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub amount: Money,
    pub item_count: u32,
    pub created_at: DateTime<Utc>,
    /// `true` when the idempotency key matched an existing order.
    pub replayed: bool,
    /// Whether the stored name or phone changed.
    pub profile_updated: bool,
}

/// A row in the order history list.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub amount: Money,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: Option<String>,
    pub quantity: u32,
    /// Unit price when the order was placed.
    pub price: Money,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

/// Order detail for the tracking page.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub totals: OrderTotals,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub address_summary: String,
    pub shift_name: String,
    pub shift_window: ShiftWindow,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

/// One step of the status progression bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusStep {
    pub label: &'static str,
    pub reached: bool,
}

impl OrderDetail {
    #[must_use]
    pub fn can_cancel(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Pending, in transit, delivered; a canceled order shows only the
    /// steps it reached before cancellation, which is none past pending.
    #[must_use]
    pub fn progress(&self) -> Vec<StatusStep> {
        let reached = match self.status {
            OrderStatus::Pending | OrderStatus::Canceled => 1,
            OrderStatus::InTransit => 2,
            OrderStatus::Delivered => 3,
        };
        [
            OrderStatus::Pending,
            OrderStatus::InTransit,
            OrderStatus::Delivered,
        ]
        .iter()
        .enumerate()
        .map(|(i, status)| StatusStep {
            label: status.label_ar(),
            reached: i < reached,
        })
        .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    fn detail(status: OrderStatus) -> OrderDetail {
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        OrderDetail {
            id: OrderId::new(1),
            order_number: OrderNumber::parse("ORD-1700000000000").unwrap(),
            status,
            payment_method: PaymentMethod::CashOnDelivery,
            totals: OrderTotals::from_subtotal(Money::from_riyals(150)),
            recipient_name: "سارة أحمد".to_string(),
            recipient_phone: "+966512345678".to_string(),
            address_summary: String::new(),
            shift_name: "مسائي".to_string(),
            shift_window: ShiftWindow::new(t(18), t(21)).unwrap(),
            driver_name: None,
            driver_phone: None,
            items: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_pending_can_cancel() {
        assert!(detail(OrderStatus::Pending).can_cancel());
        assert!(!detail(OrderStatus::InTransit).can_cancel());
        assert!(!detail(OrderStatus::Canceled).can_cancel());
    }

    #[test]
    fn test_progress() {
        let reached = |s| {
            detail(s)
                .progress()
                .iter()
                .filter(|step| step.reached)
                .count()
        };
        assert_eq!(reached(OrderStatus::Pending), 1);
        assert_eq!(reached(OrderStatus::InTransit), 2);
        assert_eq!(reached(OrderStatus::Delivered), 3);
    }

    #[test]
    fn test_item_line_total() {
        let item = OrderItem {
            product_id: ProductId::new(1),
            product_name: "أرز".to_string(),
            product_slug: None,
            quantity: 3,
            price: Money::from_riyals(20),
        };
        assert_eq!(item.line_total(), Money::from_riyals(60));
    }
}
