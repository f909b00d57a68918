//! Typed primary keys.
//!
//! Every table uses `SERIAL` keys; wrapping them keeps an `AddressId` from
//! being passed where a `ShiftId` is expected, which matters most in the
//! checkout ownership checks.

macro_rules! entity_ids {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(::serde::Serialize, ::serde::Deserialize)]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type))]
        #[serde(transparent)]
        #[cfg_attr(feature = "postgres", sqlx(transparent))]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        /// Form and path values; surrounding whitespace is ignored.
        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    )+};
}

entity_ids!(
    /// Customer or staff account.
    UserId,
    SupplierId,
    CategoryId,
    ProductId,
    ReviewId,
    CartId,
    /// Saved delivery address; always checked against the owning user.
    AddressId,
    ShiftId,
    DriverId,
    OrderId,
    NotificationId,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip_through_i32() {
        let id = AddressId::new(42);
        assert_eq!(i32::from(id), 42);
        assert_eq!(AddressId::from(42), id);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_id_from_str_trims_whitespace() {
        assert_eq!(" 7 ".parse::<ShiftId>().ok(), Some(ShiftId::new(7)));
        assert!("seven".parse::<ShiftId>().is_err());
        assert_eq!("12".parse::<ProductId>().ok(), Some(ProductId::new(12)));
    }

    #[test]
    fn test_id_serializes_transparently() {
        let json = serde_json::to_string(&OrderId::new(9)).unwrap_or_default();
        assert_eq!(json, "9");
    }
}
