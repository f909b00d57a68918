//! Catalog domain types: categories, products and reviews.

use chrono::{DateTime, Utc};

use dukkan_core::{CategoryId, Money, ProductId, Rating};

#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub slug: String,
    pub name: String,
    pub image_url: Option<String>,
}

/// A product as shown in grids and search results.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub price: Money,
    pub stock: u32,
    pub image_url: Option<String>,
    pub supplier_name: Option<String>,
    /// Mean rating rounded to one decimal, `None` without reviews.
    pub avg_rating: Option<f64>,
    pub review_count: i64,
}

impl ProductCard {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// `4.5` style label, empty when unrated.
    #[must_use]
    pub fn rating_label(&self) -> String {
        self.avg_rating.map(|r| format!("{r:.1}")).unwrap_or_default()
    }
}

/// Full product page data.
#[derive(Debug, Clone)]
pub struct Product {
    pub card: ProductCard,
    pub description: String,
    pub category: Category,
}

#[derive(Debug, Clone)]
pub struct Review {
    pub user_name: String,
    pub rating: Rating,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
