//! Money and order total arithmetic.
//!
//! All amounts are Saudi riyals held as [`Decimal`]. Totals are computed at
//! full precision and only rounded when formatted for display, so a stored
//! tax of `26.2515` is shown as `26.25` but never re-summed from the rounded
//! value.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount of money in riyals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero riyals.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Currency suffix used when rendering amounts.
    pub const CURRENCY: &'static str = "ر.س";

    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Whole riyals, convenient for constants and tests.
    #[must_use]
    pub fn from_riyals(riyals: i64) -> Self {
        Self(Decimal::from(riyals))
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount rounded to two decimal places, midpoint away from zero.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Format as `201.25 ر.س`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{:.2} {}", self.rounded(), Self::CURRENCY)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// Subtotal, delivery fee, tax and total for an order or cart preview.
///
/// ```
/// use dukkan_core::{Money, OrderTotals};
///
/// let totals = OrderTotals::from_subtotal(Money::from_riyals(150));
/// assert_eq!(totals.delivery_fee, Money::from_riyals(25));
/// assert_eq!(totals.total.display(), "201.25 ر.س");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Subtotals at or above this amount ship for free.
    pub const FREE_DELIVERY_THRESHOLD: i64 = 200;

    /// Flat delivery fee charged below the threshold.
    pub const DELIVERY_FEE: i64 = 25;

    /// VAT rate applied to subtotal plus delivery fee, in percent.
    pub const TAX_PERCENT: i64 = 15;

    /// Compute totals from a cart subtotal.
    #[must_use]
    pub fn from_subtotal(subtotal: Money) -> Self {
        let delivery_fee = Self::delivery_fee_for(subtotal);
        let taxable = subtotal + delivery_fee;
        let tax = Money(taxable.amount() * Decimal::new(Self::TAX_PERCENT, 2));

        Self {
            subtotal,
            delivery_fee,
            tax,
            total: taxable + tax,
        }
    }

    /// Delivery fee for a subtotal: free at or above the threshold.
    #[must_use]
    pub fn delivery_fee_for(subtotal: Money) -> Money {
        if subtotal.amount() < Decimal::from(Self::FREE_DELIVERY_THRESHOLD) {
            Money::from_riyals(Self::DELIVERY_FEE)
        } else {
            Money::ZERO
        }
    }

    /// Amount the customer still needs to add for free delivery, if any.
    #[must_use]
    pub fn remaining_for_free_delivery(&self) -> Option<Money> {
        let threshold = Decimal::from(Self::FREE_DELIVERY_THRESHOLD);
        (self.subtotal.amount() < threshold).then(|| Money(threshold - self.subtotal.amount()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn riyals(s: &str) -> Money {
        Money::new(s.parse().unwrap_or_default())
    }

    #[test]
    fn test_totals_below_threshold() {
        let totals = OrderTotals::from_subtotal(riyals("150"));
        assert_eq!(totals.delivery_fee, riyals("25"));
        assert_eq!(totals.tax, riyals("26.25"));
        assert_eq!(totals.total, riyals("201.25"));
    }

    #[test]
    fn test_totals_above_threshold() {
        let totals = OrderTotals::from_subtotal(riyals("250"));
        assert_eq!(totals.delivery_fee, Money::ZERO);
        assert_eq!(totals.tax, riyals("37.5"));
        assert_eq!(totals.total, riyals("287.5"));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(OrderTotals::delivery_fee_for(riyals("200")), Money::ZERO);
        assert_eq!(
            OrderTotals::delivery_fee_for(riyals("199.99")),
            riyals("25")
        );
    }

    #[test]
    fn test_tax_keeps_full_precision() {
        let totals = OrderTotals::from_subtotal(riyals("200.01"));
        assert_eq!(totals.tax, riyals("30.0015"));
        assert_eq!(totals.tax.display(), "30.00 ر.س");
        assert_eq!(totals.total.rounded(), "230.01".parse().unwrap_or_default());
    }

    #[test]
    fn test_remaining_for_free_delivery() {
        let totals = OrderTotals::from_subtotal(riyals("120.50"));
        assert_eq!(totals.remaining_for_free_delivery(), Some(riyals("79.50")));
        let totals = OrderTotals::from_subtotal(riyals("300"));
        assert_eq!(totals.remaining_for_free_delivery(), None);
    }

    #[test]
    fn test_line_arithmetic() {
        let lines = [riyals("12.50") * 2, riyals("3.25") * 4];
        assert_eq!(lines.into_iter().sum::<Money>(), riyals("38"));
    }
}
