//! Saved products.

use rust_decimal::Decimal;
use sqlx::PgPool;

use dukkan_core::{Money, ProductId, UserId};

use super::{RepositoryError, to_u32};
use crate::models::ProductCard;

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    id: i32,
    slug: String,
    name: String,
    price: Decimal,
    stock: i32,
    image_url: Option<String>,
}

impl TryFrom<WishlistRow> for ProductCard {
    type Error = RepositoryError;

    fn try_from(row: WishlistRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            slug: row.slug,
            name: row.name,
            price: Money::new(row.price),
            stock: to_u32(row.stock, "stock")?,
            image_url: row.image_url,
            supplier_name: None,
            avg_rating: None,
            review_count: 0,
        })
    }
}

pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Saved active products, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<ProductCard>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistRow>(
            "SELECT p.id, p.slug, p.name, p.price, p.stock, p.image_url
             FROM dukkan.wishlist_items w
             JOIN dukkan.products p ON p.id = w.product_id
             WHERE w.user_id = $1 AND p.is_active
             ORDER BY w.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM dukkan.wishlist_items WHERE user_id = $1 AND product_id = $2
             )",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Remove the product if saved, otherwise save it.
    ///
    /// Returns whether the product is saved afterwards.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn toggle(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let removed = sqlx::query(
            "DELETE FROM dukkan.wishlist_items WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?
        .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO dukkan.wishlist_items (user_id, product_id)
             SELECT $1, id FROM dukkan.products WHERE id = $2 AND is_active
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;
        Ok(true)
    }
}
