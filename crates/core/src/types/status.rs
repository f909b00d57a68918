//! Status and role enums shared by the storefront and admin.

use serde::{Deserialize, Serialize};

/// Lifecycle of an order.
///
/// ```text
/// PENDING ──► IN_TRANSIT ──► DELIVERED
///    │             │
///    └──► CANCELED ◄┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "dukkan.order_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    InTransit,
    Delivered,
    Canceled,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::InTransit,
        Self::Delivered,
        Self::Canceled,
    ];

    /// Whether moving from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InTransit | Self::Canceled)
                | (Self::InTransit, Self::Delivered | Self::Canceled)
        )
    }

    /// Delivered and canceled orders never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Canceled)
    }

    /// Wire/form value, e.g. `IN_TRANSIT`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InTransit => "IN_TRANSIT",
            Self::Delivered => "DELIVERED",
            Self::Canceled => "CANCELED",
        }
    }

    /// Customer-facing Arabic label.
    #[must_use]
    pub const fn label_ar(self) -> &'static str {
        match self {
            Self::Pending => "قيد المراجعة",
            Self::InTransit => "في الطريق",
            Self::Delivered => "تم التوصيل",
            Self::Canceled => "ملغي",
        }
    }

    /// Admin-facing English label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InTransit => "In transit",
            Self::Delivered => "Delivered",
            Self::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// How the customer pays on delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "dukkan.payment_method", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CashOnDelivery,
    CardOnDelivery,
}

impl PaymentMethod {
    pub const ALL: [Self; 2] = [Self::CashOnDelivery, Self::CardOnDelivery];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "CASH_ON_DELIVERY",
            Self::CardOnDelivery => "CARD_ON_DELIVERY",
        }
    }

    #[must_use]
    pub const fn label_ar(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "الدفع نقداً عند الاستلام",
            Self::CardOnDelivery => "الدفع بالبطاقة عند الاستلام",
        }
    }

    /// Admin-facing English label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on delivery",
            Self::CardOnDelivery => "Card on delivery",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid payment method: {s}"))
    }
}

/// Account role. Admins sign in to the back-office with the same credentials
/// table as customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "dukkan.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Customer,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::InTransit));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Canceled));
        assert!(OrderStatus::InTransit.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::InTransit.can_transition_to(OrderStatus::Canceled));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::InTransit.can_transition_to(OrderStatus::Pending));
        for next in OrderStatus::ALL {
            assert!(!OrderStatus::Delivered.can_transition_to(next));
            assert!(!OrderStatus::Canceled.can_transition_to(next));
        }
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("in_transit".parse(), Ok(OrderStatus::InTransit));
        assert_eq!("DELIVERED".parse(), Ok(OrderStatus::Delivered));
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!(
            "CASH_ON_DELIVERY".parse(),
            Ok(PaymentMethod::CashOnDelivery)
        );
        assert!("crypto".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_role_roundtrip() {
        for role in [UserRole::Customer, UserRole::Admin] {
            assert_eq!(role.to_string().parse(), Ok(role));
        }
    }
}
