//! Human-facing order numbers.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Errors from parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    #[error("order number must start with {prefix}")]
    MissingPrefix { prefix: &'static str },
    #[error("order number must end in digits")]
    InvalidDigits,
}

/// Display label for an order, `ORD-<unix millis>`.
///
/// The label is derived from the creation time and is unique in the
/// database; two checkouts in the same millisecond get consecutive numbers.
/// Retried submissions are matched on the idempotency key, not on this value.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use dukkan_core::OrderNumber;
///
/// let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
/// assert_eq!(OrderNumber::generate(at).as_str(), "ORD-1700000000123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub const PREFIX: &'static str = "ORD-";

    #[must_use]
    pub fn generate(at: DateTime<Utc>) -> Self {
        Self(format!("{}{}", Self::PREFIX, at.timestamp_millis()))
    }

    /// The number one millisecond later, used when this one is taken.
    #[must_use]
    pub fn successor(&self) -> Self {
        let millis = self
            .0
            .strip_prefix(Self::PREFIX)
            .and_then(|digits| digits.parse::<u64>().ok())
            .unwrap_or(0);
        Self(format!("{}{}", Self::PREFIX, millis.saturating_add(1)))
    }

    /// Parse an order number taken from a URL path.
    ///
    /// # Errors
    ///
    /// Returns [`OrderNumberError`] if the prefix or digits are missing.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let s = s.trim();
        let digits = s
            .strip_prefix(Self::PREFIX)
            .ok_or(OrderNumberError::MissingPrefix {
                prefix: Self::PREFIX,
            })?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::InvalidDigits);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_parse_accepts_generated() {
        let generated = OrderNumber::generate(Utc::now());
        assert_eq!(OrderNumber::parse(generated.as_str()), Ok(generated));
    }

    #[test]
    fn test_successor_is_next_millisecond() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_999).unwrap();
        let next = OrderNumber::generate(at).successor();
        assert_eq!(next.as_str(), "ORD-1700000001000");
        assert_eq!(OrderNumber::parse(next.as_str()), Ok(next));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            OrderNumber::parse("1700000000123"),
            Err(OrderNumberError::MissingPrefix { .. })
        ));
        assert_eq!(OrderNumber::parse("ORD-"), Err(OrderNumberError::InvalidDigits));
        assert_eq!(
            OrderNumber::parse("ORD-12a4"),
            Err(OrderNumberError::InvalidDigits)
        );
    }
}
