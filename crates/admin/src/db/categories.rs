//! Category and supplier management.

use sqlx::PgPool;

use dukkan_core::{CategoryId, SupplierId};

use super::RepositoryError;
use crate::models::{Category, CategoryInput, Supplier};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    slug: String,
    name: String,
    image_url: Option<String>,
    position: i32,
    product_count: i64,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            slug: row.slug,
            name: row.name,
            image_url: row.image_url,
            position: row.position,
            product_count: row.product_count,
        }
    }
}

const CATEGORY_SELECT: &str = "SELECT c.id, c.slug, c.name, c.image_url, c.position,
            (SELECT COUNT(*) FROM dukkan.products p WHERE p.category_id = c.id) AS product_count
     FROM dukkan.categories c";

pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories in menu order with their product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let sql = format!("{CATEGORY_SELECT} ORDER BY c.position, c.name");
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let sql = format!("{CATEGORY_SELECT} WHERE c.id = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &CategoryInput) -> Result<CategoryId, RepositoryError> {
        let id: CategoryId = sqlx::query_scalar(
            "INSERT INTO dukkan.categories (slug, name, image_url, position)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&input.slug)
        .bind(&input.name)
        .bind(input.image_url.as_deref())
        .bind(input.position)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug"))?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist,
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(&self, id: CategoryId, input: &CategoryInput) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE dukkan.categories
             SET slug = $2, name = $3, image_url = $4, position = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.slug)
        .bind(&input.name)
        .bind(input.image_url.as_deref())
        .bind(input.position)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete an empty category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if any product (active or not)
    /// still belongs to it, `RepositoryError::NotFound` if it does not exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM dukkan.categories c
             WHERE c.id = $1
               AND NOT EXISTS (SELECT 1 FROM dukkan.products p WHERE p.category_id = c.id)",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }
        match self.get(id).await? {
            Some(_) => Err(RepositoryError::Conflict(
                "category still has products".to_string(),
            )),
            None => Err(RepositoryError::NotFound),
        }
    }

    /// Suppliers for the product form.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn suppliers(&self) -> Result<Vec<Supplier>, RepositoryError> {
        let rows: Vec<(i32, String)> =
            sqlx::query_as("SELECT id, name FROM dukkan.suppliers ORDER BY name")
                .fetch_all(self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| Supplier {
                id: SupplierId::new(id),
                name,
            })
            .collect())
    }
}
