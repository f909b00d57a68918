//! Catalog management types: categories, suppliers and products.

use chrono::{DateTime, Utc};

use dukkan_core::{CategoryId, Money, ProductId, SupplierId};

/// Products at or below this stock count are flagged on the dashboard and
/// match the low-stock filter.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub slug: String,
    pub name: String,
    pub image_url: Option<String>,
    pub position: i32,
    pub product_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInput {
    pub slug: String,
    pub name: String,
    pub image_url: Option<String>,
    pub position: i32,
}

#[derive(Debug, Clone)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
}

/// One row of the product table.
#[derive(Debug, Clone)]
pub struct ProductListItem {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub category_name: String,
    pub supplier_name: Option<String>,
    pub price: Money,
    pub stock: i32,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl ProductListItem {
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock <= LOW_STOCK_THRESHOLD
    }
}

/// A product as loaded into the edit form.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub supplier_id: Option<SupplierId>,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
}

/// Validated product form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub category_id: CategoryId,
    pub supplier_id: Option<SupplierId>,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatusFilter {
    Active,
    Inactive,
}

impl ProductStatusFilter {
    /// Parse the `status` query value; anything else means "all".
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Product listing filters. Empty means everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Matches name or slug, case-insensitive.
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatusFilter>,
    pub low_stock: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_parse() {
        assert_eq!(
            ProductStatusFilter::parse("active"),
            Some(ProductStatusFilter::Active)
        );
        assert_eq!(
            ProductStatusFilter::parse("inactive"),
            Some(ProductStatusFilter::Inactive)
        );
        assert_eq!(ProductStatusFilter::parse(""), None);
        assert_eq!(ProductStatusFilter::parse("ACTIVE"), None);
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        let mut item = ProductListItem {
            id: ProductId::new(1),
            slug: "rice".to_string(),
            name: "Rice 5kg".to_string(),
            category_name: "Pantry".to_string(),
            supplier_name: None,
            price: Money::from_riyals(45),
            stock: LOW_STOCK_THRESHOLD,
            is_active: true,
            updated_at: Utc::now(),
        };
        assert!(item.is_low_stock());
        item.stock = LOW_STOCK_THRESHOLD + 1;
        assert!(!item.is_low_stock());
    }
}
