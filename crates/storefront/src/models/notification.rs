//! In-app notifications.

use chrono::{DateTime, Utc};

use dukkan_core::{Money, NotificationId, OrderNumber};

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    #[must_use]
    pub const fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

/// Content of a notification about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub title: String,
    pub body: String,
    pub link: Option<String>,
}

impl NewNotification {
    /// Confirmation shown after checkout.
    #[must_use]
    pub fn order_placed(order_number: &OrderNumber, amount: Money) -> Self {
        Self {
            title: "تم استلام طلبك".to_string(),
            body: format!(
                "طلبك رقم {order_number} بقيمة {} قيد المراجعة",
                amount.display()
            ),
            link: Some(format!("/account/orders/{order_number}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_placed_links_to_order() {
        let number = OrderNumber::parse("ORD-1700000000000").unwrap();
        let n = NewNotification::order_placed(&number, Money::from_riyals(100));
        assert_eq!(n.link.as_deref(), Some("/account/orders/ORD-1700000000000"));
        assert!(n.body.contains("100.00 ر.س"));
    }
}
