//! In-memory cache for rarely changing catalog data.
//!
//! Entries expire after five minutes. Admin edits become visible once the
//! entry expires; there is no cross-process invalidation.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::content::render_markdown;
use crate::db::content::ABOUT_KEY;
use crate::db::{CatalogRepository, ContentRepository, RepositoryError};
use crate::models::Category;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
    Page(String),
}

#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Page(Arc<String>),
}

/// Read-through cache over the catalog and content repositories.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();
        Self { cache }
    }

    /// All categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the categories must be loaded and the query fails.
    pub async fn categories(&self, pool: &PgPool) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache.get(&CacheKey::Categories).await
        {
            return Ok(categories);
        }

        let categories = Arc::new(CatalogRepository::new(pool).categories().await?);
        self.cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;
        Ok(categories)
    }

    /// The about page rendered to HTML; empty if the row is missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the page must be loaded and the query fails.
    pub async fn about_html(&self, pool: &PgPool) -> Result<Arc<String>, RepositoryError> {
        let key = CacheKey::Page(ABOUT_KEY.to_string());
        if let Some(CacheValue::Page(html)) = self.cache.get(&key).await {
            return Ok(html);
        }

        let markdown = ContentRepository::new(pool)
            .get(ABOUT_KEY)
            .await?
            .unwrap_or_default();
        let html = Arc::new(render_markdown(&markdown));
        self.cache
            .insert(key, CacheValue::Page(Arc::clone(&html)))
            .await;
        Ok(html)
    }

    /// Drop every cached entry.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}
