//! Orders as seen by staff.

use chrono::{DateTime, Utc};

use dukkan_core::{
    DriverId, GeoPoint, Money, OrderId, OrderNumber, OrderStatus, OrderTotals, PaymentMethod,
    ProductId, ShiftWindow, UserId,
};

/// One row of the order table.
#[derive(Debug, Clone)]
pub struct OrderListItem {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub recipient_name: String,
    pub customer_email: String,
    pub status: OrderStatus,
    pub amount: Money,
    pub item_count: i64,
    pub driver_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Order listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Partial order number, e.g. the last digits read over the phone.
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub price: Money,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity.unsigned_abs()
    }
}

/// Delivery address as printed for the driver.
#[derive(Debug, Clone)]
pub struct AddressView {
    pub label: Option<String>,
    pub district: String,
    pub street: String,
    pub building: String,
    pub floor: Option<String>,
    pub apartment: Option<String>,
    pub landmark: Option<String>,
    pub instructions: Option<String>,
    pub location: Option<GeoPoint>,
}

impl AddressView {
    #[must_use]
    pub fn maps_url(&self) -> Option<String> {
        self.location.map(|p| p.maps_url())
    }
}

#[derive(Debug, Clone)]
pub struct AssignedDriver {
    pub id: DriverId,
    pub full_name: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub customer_id: UserId,
    pub customer_email: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub totals: OrderTotals,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub address: AddressView,
    pub shift_name: String,
    pub shift_window: ShiftWindow,
    pub driver: Option<AssignedDriver>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderDetail {
    /// Statuses this order may move to next.
    #[must_use]
    pub fn next_statuses(&self) -> Vec<OrderStatus> {
        OrderStatus::ALL
            .into_iter()
            .filter(|next| self.status.can_transition_to(*next))
            .collect()
    }

    /// Drivers can be (re)assigned until the order is finished.
    #[must_use]
    pub const fn can_assign_driver(&self) -> bool {
        !self.status.is_terminal()
    }

    #[must_use]
    pub fn driver_id(&self) -> Option<DriverId> {
        self.driver.as_ref().map(|d| d.id)
    }
}

/// In-app notification sent to the customer when staff change an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerNotice {
    pub title: String,
    pub body: String,
    pub link: String,
}

impl CustomerNotice {
    #[must_use]
    pub fn status_changed(order_number: &OrderNumber, status: OrderStatus) -> Self {
        let body = match status {
            OrderStatus::Pending => format!("طلبك رقم {order_number} قيد المراجعة"),
            OrderStatus::InTransit => format!("طلبك رقم {order_number} في الطريق إليك"),
            OrderStatus::Delivered => {
                format!("تم توصيل طلبك رقم {order_number}، شكراً لتسوقك معنا")
            }
            OrderStatus::Canceled => format!("تم إلغاء طلبك رقم {order_number}"),
        };
        Self {
            title: format!("حالة الطلب: {}", status.label_ar()),
            body,
            link: format!("/account/orders/{order_number}"),
        }
    }

    #[must_use]
    pub fn driver_assigned(order_number: &OrderNumber, driver_name: &str) -> Self {
        Self {
            title: format!("حالة الطلب: {}", OrderStatus::InTransit.label_ar()),
            body: format!("المندوب {driver_name} في طريقه إليك بطلبك رقم {order_number}"),
            link: format!("/account/orders/{order_number}"),
        }
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
            id: OrderId::new(7),
            order_number: OrderNumber::parse("ORD-1700000000000").unwrap(),
            customer_id: UserId::new(3),
            customer_email: "sara@mail.sa".to_string(),
            status,
            payment_method: PaymentMethod::CardOnDelivery,
            totals: OrderTotals::from_subtotal(Money::from_riyals(80)),
            recipient_name: "Sara Ahmed".to_string(),
            recipient_phone: "+966512345678".to_string(),
            address: AddressView {
                label: None,
                district: "Olaya".to_string(),
                street: "King Fahd Rd".to_string(),
                building: "12".to_string(),
                floor: None,
                apartment: None,
                landmark: None,
                instructions: None,
                location: None,
            },
            shift_name: "Evening".to_string(),
            shift_window: ShiftWindow::new(t(18), t(21)).unwrap(),
            driver: None,
            items: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_next_statuses_follow_transitions() {
        assert_eq!(
            detail(OrderStatus::Pending).next_statuses(),
            vec![OrderStatus::InTransit, OrderStatus::Canceled]
        );
        assert_eq!(
            detail(OrderStatus::InTransit).next_statuses(),
            vec![OrderStatus::Delivered, OrderStatus::Canceled]
        );
        assert!(detail(OrderStatus::Delivered).next_statuses().is_empty());
        assert!(detail(OrderStatus::Canceled).next_statuses().is_empty());
    }

    #[test]
    fn test_driver_assignment_closed_on_terminal_orders() {
        assert!(detail(OrderStatus::Pending).can_assign_driver());
        assert!(detail(OrderStatus::InTransit).can_assign_driver());
        assert!(!detail(OrderStatus::Delivered).can_assign_driver());
    }

    #[test]
    fn test_notice_links_to_customer_order_page() {
        let number = OrderNumber::parse("ORD-1700000000000").unwrap();
        let notice = CustomerNotice::status_changed(&number, OrderStatus::Delivered);
        assert_eq!(notice.link, "/account/orders/ORD-1700000000000");
        assert!(notice.title.contains(OrderStatus::Delivered.label_ar()));

        let notice = CustomerNotice::driver_assigned(&number, "Khalid");
        assert!(notice.body.contains("Khalid"));
    }

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            product_id: ProductId::new(1),
            product_name: "Milk".to_string(),
            quantity: 4,
            price: Money::from_riyals(6),
        };
        assert_eq!(item.line_total(), Money::from_riyals(24));
    }
}
