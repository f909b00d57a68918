//! Catalog reader: categories, products and reviews.
//!
//! Only active products are visible here. Averages and review counts are
//! aggregated in SQL so listing pages need a single query.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::PgPool;

use dukkan_core::{CategoryId, Money, Page, ProductId, Rating, UserId};

use super::{RepositoryError, like_pattern, to_u32};
use crate::models::{Category, Product, ProductCard, Review};

/// Product card columns, joined with supplier and review aggregates.
///
/// Expects `p` (products), `s` (suppliers) and `r` (reviews) aliases.
const CARD_SELECT: &str = "
    SELECT p.id, p.slug, p.name, p.price, p.stock, p.image_url,
           s.name AS supplier_name,
           ROUND(AVG(r.rating), 1) AS avg_rating,
           COUNT(r.id) AS review_count
    FROM dukkan.products p
    LEFT JOIN dukkan.suppliers s ON s.id = p.supplier_id
    LEFT JOIN dukkan.reviews r ON r.product_id = p.id";

const CARD_GROUP_BY: &str = "GROUP BY p.id, s.name";

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    slug: String,
    name: String,
    image_url: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            slug: row.slug,
            name: row.name,
            image_url: row.image_url,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CardRow {
    id: i32,
    slug: String,
    name: String,
    price: Decimal,
    stock: i32,
    image_url: Option<String>,
    supplier_name: Option<String>,
    avg_rating: Option<Decimal>,
    review_count: i64,
}

impl TryFrom<CardRow> for ProductCard {
    type Error = RepositoryError;

    fn try_from(row: CardRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            slug: row.slug,
            name: row.name,
            price: Money::new(row.price),
            stock: to_u32(row.stock, "stock")?,
            image_url: row.image_url,
            supplier_name: row.supplier_name,
            avg_rating: row.avg_rating.and_then(|d| d.to_f64()),
            review_count: row.review_count,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    #[sqlx(flatten)]
    card: CardRow,
    description: String,
    category_id: i32,
    category_slug: String,
    category_name: String,
    category_image_url: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            card: row.card.try_into()?,
            description: row.description,
            category: Category {
                id: CategoryId::new(row.category_id),
                slug: row.category_slug,
                name: row.category_name,
                image_url: row.category_image_url,
            },
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    user_name: String,
    rating: Rating,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            user_name: row.user_name,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

/// Repository for read-side catalog queries and reviews.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, slug, name, image_url FROM dukkan.categories ORDER BY position, name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, slug, name, image_url FROM dukkan.categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// One page of active products in a category, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products_in_category(
        &self,
        category_id: CategoryId,
        page: Page,
    ) -> Result<(Vec<ProductCard>, i64), RepositoryError> {
        let sql = format!(
            "{CARD_SELECT}
             WHERE p.is_active AND p.category_id = $1
             {CARD_GROUP_BY}
             ORDER BY p.name
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, CardRow>(&sql)
            .bind(category_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM dukkan.products WHERE is_active AND category_id = $1",
        )
        .bind(category_id)
        .fetch_one(self.pool)
        .await?;

        let cards = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()?;
        Ok((cards, total))
    }

    /// Most recently added active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn newest(&self, limit: i64) -> Result<Vec<ProductCard>, RepositoryError> {
        let sql = format!(
            "{CARD_SELECT}
             WHERE p.is_active
             {CARD_GROUP_BY}
             ORDER BY p.created_at DESC
             LIMIT $1"
        );
        let rows = sqlx::query_as::<_, CardRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Case-insensitive name search over active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        term: &str,
        page: Page,
    ) -> Result<(Vec<ProductCard>, i64), RepositoryError> {
        let pattern = like_pattern(term);
        let sql = format!(
            "{CARD_SELECT}
             WHERE p.is_active AND p.name ILIKE $1
             {CARD_GROUP_BY}
             ORDER BY p.name
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, CardRow>(&sql)
            .bind(&pattern)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM dukkan.products WHERE is_active AND name ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(self.pool)
        .await?;

        let cards = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()?;
        Ok((cards, total))
    }

    /// Active product by slug with its category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "SELECT card.*, p.description,
                    c.id AS category_id, c.slug AS category_slug,
                    c.name AS category_name, c.image_url AS category_image_url
             FROM ({CARD_SELECT}
                   WHERE p.is_active AND p.slug = $1
                   {CARD_GROUP_BY}) card
             JOIN dukkan.products p ON p.id = card.id
             JOIN dukkan.categories c ON c.id = p.category_id"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Reviews for a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reviews(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT COALESCE(NULLIF(u.full_name, ''), 'عميل') AS user_name,
                    r.rating, r.comment, r.created_at
             FROM dukkan.reviews r
             JOIN dukkan.users u ON u.id = r.user_id
             WHERE r.product_id = $1
             ORDER BY r.updated_at DESC",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert or replace the user's review of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_review(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: Rating,
        comment: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO dukkan.reviews (user_id, product_id, rating, comment)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, product_id)
             DO UPDATE SET rating = EXCLUDED.rating,
                           comment = EXCLUDED.comment,
                           updated_at = NOW()",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(rating)
        .bind(comment)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
