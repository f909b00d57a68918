//! Editable site content (markdown).

use sqlx::PgPool;

use super::RepositoryError;

/// Key of the about page row.
pub const ABOUT_KEY: &str = "about";

pub struct ContentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Markdown body for `key`, if the row exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM dukkan.site_content WHERE key = $1")
                .bind(key)
                .fetch_optional(self.pool)
                .await?;
        Ok(body)
    }
}
