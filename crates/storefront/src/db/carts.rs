//! Server-side cart repository.
//!
//! One cart per user, created lazily on the first add. Lines are priced at
//! the current catalog price every time the cart is read.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use dukkan_core::{CartId, Money, ProductId, UserId};

use super::{RepositoryError, to_u32};
use crate::models::cart::{Cart, CartLine, MAX_LINE_QUANTITY, clamp_quantity};

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    product_id: i32,
    slug: String,
    name: String,
    image_url: Option<String>,
    price: Decimal,
    quantity: i32,
    stock: i32,
    is_active: bool,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            product_id: ProductId::new(row.product_id),
            slug: row.slug,
            name: row.name,
            image_url: row.image_url,
            unit_price: Money::new(row.price),
            quantity: to_u32(row.quantity, "quantity")?,
            stock: to_u32(row.stock, "stock")?,
            is_active: row.is_active,
        })
    }
}

const LINES_SQL: &str = "
    SELECT ci.product_id, p.slug, p.name, p.image_url, p.price,
           ci.quantity, p.stock, p.is_active
    FROM dukkan.cart_items ci
    JOIN dukkan.products p ON p.id = ci.product_id
    WHERE ci.cart_id = $1
    ORDER BY ci.added_at";

/// Outcome of adding a product to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Line now holds this quantity.
    Added(u32),
    /// The product is inactive, missing, or out of stock.
    Unavailable,
}

/// Repository for carts and cart lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    async fn cart_id(&self, user_id: UserId) -> Result<Option<CartId>, RepositoryError> {
        let id: Option<CartId> =
            sqlx::query_scalar("SELECT id FROM dukkan.carts WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;
        Ok(id)
    }

    async fn get_or_create_id(&self, user_id: UserId) -> Result<CartId, RepositoryError> {
        let id: CartId = sqlx::query_scalar(
            "INSERT INTO dukkan.carts (user_id) VALUES ($1)
             ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
             RETURNING id",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// The user's cart; an empty cart if none has been created yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let Some(id) = self.cart_id(user_id).await? else {
            return Ok(Cart {
                id: CartId::new(0),
                lines: Vec::new(),
            });
        };

        let rows = sqlx::query_as::<_, CartLineRow>(LINES_SQL)
            .bind(id)
            .fetch_all(self.pool)
            .await?;

        let lines = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()?;
        Ok(Cart { id, lines })
    }

    /// Load the cart inside a checkout transaction, locking its product rows.
    pub(crate) async fn get_for_update(
        tx: &mut Transaction<'_, Postgres>,
        user_id: UserId,
    ) -> Result<Cart, RepositoryError> {
        let id: Option<CartId> =
            sqlx::query_scalar("SELECT id FROM dukkan.carts WHERE user_id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut **tx)
                .await?;
        let Some(id) = id else {
            return Ok(Cart {
                id: CartId::new(0),
                lines: Vec::new(),
            });
        };

        let sql = format!("{LINES_SQL} FOR UPDATE OF p");
        let rows = sqlx::query_as::<_, CartLineRow>(&sql)
            .bind(id)
            .fetch_all(&mut **tx)
            .await?;

        let lines = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()?;
        Ok(Cart { id, lines })
    }

    /// Add `quantity` of a product, incrementing an existing line.
    ///
    /// The resulting line quantity is clamped to `1..=99` and to stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<AddOutcome, RepositoryError> {
        let stock: Option<i32> = sqlx::query_scalar(
            "SELECT stock FROM dukkan.products WHERE id = $1 AND is_active",
        )
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;
        let Some(stock) = stock else {
            return Ok(AddOutcome::Unavailable);
        };
        let stock = to_u32(stock, "stock")?;

        let cart_id = self.get_or_create_id(user_id).await?;
        let existing: Option<i32> = sqlx::query_scalar(
            "SELECT quantity FROM dukkan.cart_items WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;
        let existing = existing.map(|q| to_u32(q, "quantity")).transpose()?;

        let requested = existing.unwrap_or(0).saturating_add(quantity.max(1));
        let target = clamp_quantity(requested, stock);
        if target == 0 {
            return Ok(AddOutcome::Unavailable);
        }

        self.write_line(cart_id, product_id, target).await?;
        Ok(AddOutcome::Added(target))
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// The quantity is clamped to `MAX_LINE_QUANTITY` and to current stock. A
    /// line whose product is hidden or sold out is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        if quantity == 0 {
            return self.remove(user_id, product_id).await;
        }
        let Some(cart_id) = self.cart_id(user_id).await? else {
            return Ok(());
        };

        sqlx::query(
            "UPDATE dukkan.cart_items ci SET quantity = LEAST($3, p.stock)
             FROM dukkan.products p
             WHERE ci.cart_id = $1 AND ci.product_id = $2
               AND p.id = ci.product_id AND p.is_active AND p.stock > 0",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(i32_quantity(quantity.min(MAX_LINE_QUANTITY)))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            "DELETE FROM dukkan.cart_items ci
             USING dukkan.carts c
             WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Total units in the cart, for the header badge.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(ci.quantity), 0)::BIGINT
             FROM dukkan.cart_items ci
             JOIN dukkan.carts c ON c.id = ci.cart_id
             WHERE c.user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Empty a cart inside the checkout transaction.
    pub(crate) async fn clear(
        tx: &mut Transaction<'_, Postgres>,
        cart_id: CartId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM dukkan.cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn write_line(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO dukkan.cart_items (cart_id, product_id, quantity)
             VALUES ($1, $2, $3)
             ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(i32_quantity(quantity))
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

fn i32_quantity(quantity: u32) -> i32 {
    i32::try_from(quantity).unwrap_or(i32::MAX)
}
