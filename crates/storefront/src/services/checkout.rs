//! Checkout: form validation and order placement.
//!
//! Validation reports every invalid field at once. Business checks
//! (ownership, shift, stock) and all writes happen in
//! [`OrderRepository::place`]; this service maps its outcome to
//! customer-facing errors and publishes the Pusher event after commit.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use dukkan_core::{
    AddressId, FullName, OrderNumber, PaymentMethod, PhoneNumber, ShiftId, UserId,
    ValidationErrors,
};

use crate::db::RepositoryError;
use crate::db::orders::{OrderRepository, PlaceOrderError};
use crate::models::{NewOrder, PlacedOrder};
use crate::services::pusher::{NewOrderEvent, PusherClient};

/// Raw checkout form as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address_id: String,
    #[serde(default)]
    pub shift_id: String,
    #[serde(default)]
    pub payment_method: String,
    /// Checkbox; present only when ticked.
    pub terms: Option<String>,
    #[serde(default)]
    pub idempotency_key: String,
}

/// A checkout form whose fields all parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCheckout {
    pub full_name: FullName,
    pub phone: PhoneNumber,
    pub address_id: AddressId,
    pub shift_id: ShiftId,
    pub payment_method: PaymentMethod,
    pub idempotency_key: Uuid,
}

impl CheckoutForm {
    /// Validate every field, collecting all errors.
    ///
    /// # Errors
    ///
    /// Returns the field errors if any field is invalid.
    pub fn validate(&self) -> Result<ValidCheckout, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let full_name = errors.check(
            "full_name",
            FullName::parse(&self.full_name),
            "الاسم يجب أن يكون بين 2 و 100 حرف",
        );
        let phone = errors.check(
            "phone",
            PhoneNumber::parse(&self.phone),
            "رقم الجوال غير صالح، مثال: 05XXXXXXXX",
        );
        let address_id = errors.check(
            "address_id",
            positive_id(&self.address_id).ok_or(()),
            "يرجى اختيار عنوان التوصيل",
        );
        let shift_id = errors.check(
            "shift_id",
            positive_id(&self.shift_id).ok_or(()),
            "يرجى اختيار فترة التوصيل",
        );
        let payment_method = errors.check(
            "payment_method",
            self.payment_method.parse::<PaymentMethod>(),
            "يرجى اختيار طريقة الدفع",
        );
        if !self.terms_accepted() {
            errors.add("terms", "يجب الموافقة على الشروط والأحكام");
        }
        let idempotency_key = errors.check(
            "idempotency_key",
            Uuid::parse_str(self.idempotency_key.trim()),
            "انتهت صلاحية الصفحة، يرجى إعادة المحاولة",
        );

        match (
            full_name,
            phone,
            address_id,
            shift_id,
            payment_method,
            idempotency_key,
        ) {
            (
                Some(full_name),
                Some(phone),
                Some(address_id),
                Some(shift_id),
                Some(payment_method),
                Some(idempotency_key),
            ) if errors.is_empty() => Ok(ValidCheckout {
                full_name,
                phone,
                address_id: AddressId::new(address_id),
                shift_id: ShiftId::new(shift_id),
                payment_method,
                idempotency_key,
            }),
            _ => Err(errors),
        }
    }

    fn terms_accepted(&self) -> bool {
        matches!(
            self.terms.as_deref().map(str::trim),
            Some("on" | "true" | "1" | "yes")
        )
    }
}

fn positive_id(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|id| *id > 0)
}

/// Why an order could not be placed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("cart is empty")]
    EmptyCart,

    #[error("address not found or not owned by customer")]
    AddressNotFound,

    #[error("shift not found or inactive")]
    ShiftNotFound,

    #[error("insufficient stock for {0}")]
    OutOfStock(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<PlaceOrderError> for CheckoutError {
    fn from(e: PlaceOrderError) -> Self {
        match e {
            PlaceOrderError::EmptyCart => Self::EmptyCart,
            PlaceOrderError::AddressNotFound => Self::AddressNotFound,
            PlaceOrderError::ShiftNotFound => Self::ShiftNotFound,
            PlaceOrderError::OutOfStock(name) => Self::OutOfStock(name),
            PlaceOrderError::Repository(e) => Self::Repository(e),
        }
    }
}

impl CheckoutError {
    /// Banner message for the re-rendered checkout page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(_) => "يرجى تصحيح الحقول المميزة".to_string(),
            Self::EmptyCart => "سلة التسوق فارغة".to_string(),
            Self::AddressNotFound => "العنوان غير موجود أو غير صالح".to_string(),
            Self::ShiftNotFound => "فترة التوصيل غير متاحة".to_string(),
            Self::OutOfStock(name) => format!("الكمية المطلوبة من \"{name}\" غير متوفرة"),
            Self::Repository(_) => "حدث خطأ أثناء إنشاء الطلب، يرجى المحاولة مرة أخرى".to_string(),
        }
    }
}

/// Places orders and announces them.
pub struct CheckoutService<'a> {
    orders: OrderRepository<'a>,
    pusher: Option<&'a PusherClient>,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a sqlx::PgPool, pusher: Option<&'a PusherClient>) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            pusher,
        }
    }

    /// Validate the form and place the customer's order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` with every invalid field, or a
    /// business error from the checkout transaction.
    #[tracing::instrument(skip(self, form), fields(customer_id = %customer_id))]
    pub async fn place_order(
        &self,
        customer_id: UserId,
        form: &CheckoutForm,
        now: DateTime<Utc>,
    ) -> Result<PlacedOrder, CheckoutError> {
        let valid = form.validate().map_err(CheckoutError::Validation)?;

        let new_order = NewOrder {
            idempotency_key: valid.idempotency_key,
            order_number: OrderNumber::generate(now),
            customer_id,
            address_id: valid.address_id,
            shift_id: valid.shift_id,
            payment_method: valid.payment_method,
            recipient_name: valid.full_name,
            recipient_phone: valid.phone,
        };

        let placed = self.orders.place(&new_order).await?;

        if placed.replayed {
            tracing::info!(order_number = %placed.order_number, "Checkout retry matched existing order");
            return Ok(placed);
        }

        tracing::info!(
            order_number = %placed.order_number,
            amount = %placed.amount.rounded(),
            items = placed.item_count,
            "Order placed"
        );

        if let Some(pusher) = self.pusher {
            let event = NewOrderEvent::new(
                placed.order_number.clone(),
                new_order.recipient_name.as_str().to_string(),
                placed.amount,
                placed.item_count,
                placed.created_at,
            );
            let pusher = pusher.clone();
            tokio::spawn(async move {
                if let Err(e) = pusher.trigger_new_order(&event).await {
                    tracing::warn!(error = %e, order_number = %event.order_number, "Pusher notification failed");
                }
            });
        }

        Ok(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            full_name: "سارة أحمد".to_string(),
            phone: "0512345678".to_string(),
            address_id: "3".to_string(),
            shift_id: "1".to_string(),
            payment_method: "CASH_ON_DELIVERY".to_string(),
            terms: Some("on".to_string()),
            idempotency_key: "8f14e45f-ceea-467f-a0e6-1d4c5e9f2b11".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let valid = valid_form().validate();
        assert!(valid.is_ok());
        let valid = valid.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(valid.address_id, AddressId::new(3));
        assert_eq!(valid.phone.as_str(), "+966512345678");
        assert_eq!(valid.payment_method, PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn test_collects_every_field_error() {
        let form = CheckoutForm {
            full_name: "س".to_string(),
            phone: "123".to_string(),
            address_id: "0".to_string(),
            shift_id: "abc".to_string(),
            payment_method: "BITCOIN".to_string(),
            terms: None,
            idempotency_key: "not-a-uuid".to_string(),
        };
        let errors = form.validate().err().unwrap_or_default();
        for field in [
            "full_name",
            "phone",
            "address_id",
            "shift_id",
            "payment_method",
            "terms",
            "idempotency_key",
        ] {
            assert!(errors.has(field), "missing error for {field}");
        }
        assert_eq!(errors.len(), 7);
    }

    #[test]
    fn test_terms_must_be_ticked() {
        let mut form = valid_form();
        form.terms = Some(String::new());
        let errors = form.validate().err().unwrap_or_default();
        assert_eq!(errors.len(), 1);
        assert!(errors.has("terms"));
    }

    #[test]
    fn test_negative_ids_rejected() {
        assert_eq!(positive_id("-4"), None);
        assert_eq!(positive_id(" 12 "), Some(12));
    }

    #[test]
    fn test_business_error_messages() {
        assert_eq!(
            CheckoutError::AddressNotFound.user_message(),
            "العنوان غير موجود أو غير صالح"
        );
        assert!(
            CheckoutError::OutOfStock("حليب".to_string())
                .user_message()
                .contains("حليب")
        );
    }

    #[test]
    fn test_place_order_error_mapping() {
        assert!(matches!(
            CheckoutError::from(PlaceOrderError::EmptyCart),
            CheckoutError::EmptyCart
        ));
        assert!(matches!(
            CheckoutError::from(PlaceOrderError::ShiftNotFound),
            CheckoutError::ShiftNotFound
        ));
    }
}
