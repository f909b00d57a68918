//! Editable site content.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::RepositoryError;

/// Key of the about page row.
pub const ABOUT_KEY: &str = "about";

#[derive(Debug, sqlx::FromRow)]
pub struct ContentRow {
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

pub struct ContentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, key: &str) -> Result<Option<ContentRow>, RepositoryError> {
        let row = sqlx::query_as::<_, ContentRow>(
            "SELECT body, updated_at FROM dukkan.site_content WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Insert or replace the markdown for `key`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, key: &str, body: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO dukkan.site_content (key, body, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (key) DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()",
        )
        .bind(key)
        .bind(body)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
