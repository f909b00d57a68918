//! Product management.
//!
//! Listing filters are combined into a single parameterised query; unused
//! filters bind `NULL` and drop out of the `WHERE` clause.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use dukkan_core::{CategoryId, Money, Page, ProductId, SupplierId};

use super::{RepositoryError, like_pattern};
use crate::models::{LOW_STOCK_THRESHOLD, Product, ProductFilter, ProductInput, ProductListItem};

#[derive(Debug, sqlx::FromRow)]
struct ListRow {
    id: i32,
    slug: String,
    name: String,
    category_name: String,
    supplier_name: Option<String>,
    price: Decimal,
    stock: i32,
    is_active: bool,
    updated_at: DateTime<Utc>,
}

impl From<ListRow> for ProductListItem {
    fn from(row: ListRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            slug: row.slug,
            name: row.name,
            category_name: row.category_name,
            supplier_name: row.supplier_name,
            price: Money::new(row.price),
            stock: row.stock,
            is_active: row.is_active,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    category_id: i32,
    supplier_id: Option<i32>,
    slug: String,
    name: String,
    description: String,
    price: Decimal,
    stock: i32,
    image_url: Option<String>,
    is_active: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            category_id: CategoryId::new(row.category_id),
            supplier_id: row.supplier_id.map(SupplierId::new),
            slug: row.slug,
            name: row.name,
            description: row.description,
            price: Money::new(row.price),
            stock: row.stock,
            image_url: row.image_url,
            is_active: row.is_active,
        }
    }
}

/// What a delete request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Order history references the product, so it was hidden instead.
    Deactivated,
}

const LIST_WHERE: &str = "WHERE ($1::text IS NULL OR p.name ILIKE $1 OR p.slug ILIKE $1)
       AND ($2::int IS NULL OR p.category_id = $2)
       AND ($3::bool IS NULL OR p.is_active = $3)
       AND (NOT $4 OR p.stock <= $5)";

pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of products matching `filter`, plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<(Vec<ProductListItem>, i64), RepositoryError> {
        let search = filter.search.as_deref().map(like_pattern);
        let status = filter.status.map(|s| s.is_active());

        let count_sql = format!("SELECT COUNT(*) FROM dukkan.products p {LIST_WHERE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(search.as_deref())
            .bind(filter.category_id)
            .bind(status)
            .bind(filter.low_stock)
            .bind(LOW_STOCK_THRESHOLD)
            .fetch_one(self.pool)
            .await?;

        let list_sql = format!(
            "SELECT p.id, p.slug, p.name, c.name AS category_name, s.name AS supplier_name,
                    p.price, p.stock, p.is_active, p.updated_at
             FROM dukkan.products p
             JOIN dukkan.categories c ON c.id = p.category_id
             LEFT JOIN dukkan.suppliers s ON s.id = p.supplier_id
             {LIST_WHERE}
             ORDER BY p.updated_at DESC, p.id DESC
             LIMIT $6 OFFSET $7"
        );
        let rows = sqlx::query_as::<_, ListRow>(&list_sql)
            .bind(search.as_deref())
            .bind(filter.category_id)
            .bind(status)
            .bind(filter.low_stock)
            .bind(LOW_STOCK_THRESHOLD)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Active products at or below the low-stock threshold, emptiest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, limit: i64) -> Result<Vec<ProductListItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, ListRow>(
            "SELECT p.id, p.slug, p.name, c.name AS category_name, s.name AS supplier_name,
                    p.price, p.stock, p.is_active, p.updated_at
             FROM dukkan.products p
             JOIN dukkan.categories c ON c.id = p.category_id
             LEFT JOIN dukkan.suppliers s ON s.id = p.supplier_id
             WHERE p.is_active AND p.stock <= $1
             ORDER BY p.stock, p.name
             LIMIT $2",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, category_id, supplier_id, slug, name, description, price, stock,
                    image_url, is_active
             FROM dukkan.products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &ProductInput) -> Result<ProductId, RepositoryError> {
        let id: ProductId = sqlx::query_scalar(
            "INSERT INTO dukkan.products
                 (category_id, supplier_id, slug, name, description, price, stock,
                  image_url, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id",
        )
        .bind(input.category_id)
        .bind(input.supplier_id)
        .bind(&input.slug)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .bind(input.image_url.as_deref())
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug"))?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist,
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE dukkan.products
             SET category_id = $2, supplier_id = $3, slug = $4, name = $5, description = $6,
                 price = $7, stock = $8, image_url = $9, is_active = $10, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(input.category_id)
        .bind(input.supplier_id)
        .bind(&input.slug)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .bind(input.image_url.as_deref())
        .bind(input.is_active)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Flip `is_active`. Returns the new value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn toggle_active(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let active: Option<bool> = sqlx::query_scalar(
            "UPDATE dukkan.products SET is_active = NOT is_active, updated_at = NOW()
             WHERE id = $1
             RETURNING is_active",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        active.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product, or deactivate it when orders reference it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<DeleteOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let referenced: Option<bool> = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM dukkan.order_items WHERE product_id = p.id)
             FROM dukkan.products p
             WHERE p.id = $1
             FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match referenced {
            None => return Err(RepositoryError::NotFound),
            Some(true) => {
                sqlx::query(
                    "UPDATE dukkan.products SET is_active = FALSE, updated_at = NOW()
                     WHERE id = $1",
                )
                .bind(id)
                .execute(&mut *tx)
                .await?;
                DeleteOutcome::Deactivated
            }
            Some(false) => {
                sqlx::query("DELETE FROM dukkan.products WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                DeleteOutcome::Deleted
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }
}
