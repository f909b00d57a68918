//! Checkout rules that hold without a database.

use chrono::{NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use dukkan_core::{
    Money, OrderStatus, OrderTotals, PaymentMethod, ShiftStatus, ShiftWindow, store_local_time,
};
use dukkan_storefront::services::checkout::CheckoutForm;

fn riyals(s: &str) -> Money {
    Money::new(s.parse::<Decimal>().unwrap_or_default())
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

fn filled_form() -> CheckoutForm {
    CheckoutForm {
        full_name: "  نورة   القحطاني ".to_string(),
        phone: "0551234567".to_string(),
        address_id: "3".to_string(),
        shift_id: "2".to_string(),
        payment_method: "CASH_ON_DELIVERY".to_string(),
        terms: Some("on".to_string()),
        idempotency_key: Uuid::new_v4().to_string(),
    }
}

// =============================================================================
// Form validation
// =============================================================================

#[test]
fn test_complete_form_is_accepted() {
    let valid = filled_form().validate().unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(valid.full_name.as_str(), "نورة القحطاني");
    assert_eq!(valid.phone.as_str(), "+966551234567");
    assert_eq!(valid.address_id.as_i32(), 3);
    assert_eq!(valid.shift_id.as_i32(), 2);
    assert_eq!(valid.payment_method, PaymentMethod::CashOnDelivery);
}

#[test]
fn test_empty_form_reports_every_field() {
    let errors = CheckoutForm::default().validate().err().unwrap_or_default();
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
}

#[test]
fn test_terms_must_be_ticked() {
    let form = CheckoutForm {
        terms: None,
        ..filled_form()
    };
    let errors = form.validate().err().unwrap_or_default();
    assert!(errors.has("terms"));
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_ids_must_be_positive() {
    let form = CheckoutForm {
        address_id: "0".to_string(),
        shift_id: "-4".to_string(),
        ..filled_form()
    };
    let errors = form.validate().err().unwrap_or_default();
    assert!(errors.has("address_id"));
    assert!(errors.has("shift_id"));
}

// =============================================================================
// Totals
// =============================================================================

#[test]
fn test_small_basket_pays_delivery_and_vat() {
    let totals = OrderTotals::from_subtotal(riyals("150"));
    assert_eq!(totals.delivery_fee, riyals("25"));
    assert_eq!(totals.tax, riyals("26.25"));
    assert_eq!(totals.total, riyals("201.25"));
    assert_eq!(totals.remaining_for_free_delivery(), Some(riyals("50")));
}

#[test]
fn test_threshold_basket_ships_free() {
    let totals = OrderTotals::from_subtotal(riyals("200"));
    assert_eq!(totals.delivery_fee, Money::ZERO);
    assert_eq!(totals.total, riyals("230"));
    assert_eq!(totals.remaining_for_free_delivery(), None);
}

// =============================================================================
// Shifts
// =============================================================================

#[test]
fn test_shift_availability_across_the_day() {
    let morning = ShiftWindow::new(t(9, 0), t(12, 0)).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(morning.status_at(t(6, 0)), ShiftStatus::Available);
    assert_eq!(morning.status_at(t(7, 0)), ShiftStatus::Soon);
    assert_eq!(morning.status_at(t(9, 0)), ShiftStatus::Passed);
    assert!(!morning.status_at(t(10, 30)).is_selectable());
}

#[test]
fn test_store_clock_uses_riyadh_offset() {
    // 05:30 UTC is 08:30 in Riyadh.
    let now = Utc
        .with_ymd_and_hms(2026, 3, 1, 5, 30, 0)
        .single()
        .unwrap_or_default();
    let local = store_local_time(now, 180).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(local, t(8, 30));

    let morning = ShiftWindow::new(t(9, 0), t(12, 0)).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(morning.status_at(local), ShiftStatus::Soon);
}

// =============================================================================
// Order lifecycle
// =============================================================================

#[test]
fn test_lifecycle_only_moves_forward() {
    use OrderStatus::{Canceled, Delivered, InTransit, Pending};

    let path = [Pending, InTransit, Delivered];
    for pair in path.windows(2) {
        if let [from, to] = pair {
            assert!(from.can_transition_to(*to), "{from} -> {to}");
            assert!(!to.can_transition_to(*from), "{to} -> {from}");
        }
    }
    assert!(Pending.can_transition_to(Canceled));
    assert!(!Delivered.can_transition_to(Canceled));
    assert!(Canceled.is_terminal());
}
