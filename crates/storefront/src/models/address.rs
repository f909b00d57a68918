//! Delivery addresses.

use chrono::{DateTime, Utc};

use dukkan_core::{AddressId, GeoPoint, UserId};

/// A saved delivery address.
#[derive(Debug, Clone)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub label: Option<String>,
    pub district: String,
    pub street: String,
    pub building: String,
    pub floor: Option<String>,
    pub apartment: Option<String>,
    pub landmark: Option<String>,
    pub instructions: Option<String>,
    pub location: Option<GeoPoint>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// One-line rendering used in checkout and order pages.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![
            self.district.clone(),
            self.street.clone(),
            format!("مبنى {}", self.building),
        ];
        if let Some(floor) = &self.floor {
            parts.push(format!("الدور {floor}"));
        }
        if let Some(apartment) = &self.apartment {
            parts.push(format!("شقة {apartment}"));
        }
        parts.join("، ")
    }

    /// Label shown in pickers, falling back to the district.
    #[must_use]
    pub fn title(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.district)
    }
}

/// Validated fields for creating or updating an address.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressInput {
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            id: AddressId::new(1),
            user_id: UserId::new(1),
            label: None,
            district: "النرجس".to_string(),
            street: "شارع الأمير".to_string(),
            building: "12".to_string(),
            floor: Some("2".to_string()),
            apartment: None,
            landmark: None,
            instructions: None,
            location: None,
            is_default: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_skips_missing_parts() {
        assert_eq!(address().summary(), "النرجس، شارع الأمير، مبنى 12، الدور 2");
    }

    #[test]
    fn test_title_falls_back_to_district() {
        let mut a = address();
        assert_eq!(a.title(), "النرجس");
        a.label = Some("البيت".to_string());
        assert_eq!(a.title(), "البيت");
    }
}
