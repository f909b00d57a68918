//! Handler state: config, pool, the optional Pusher client and the catalog cache.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::CatalogCache;
use crate::config::StorefrontConfig;
use crate::services::pusher::{PusherClient, PusherError};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    pusher: Option<PusherClient>,
    cache: CatalogCache,
}

impl AppState {
    /// # Errors
    ///
    /// Returns an error if the Pusher HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, PusherError> {
        let pusher = config.pusher.as_ref().map(PusherClient::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                pusher,
                cache: CatalogCache::new(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// `None` when the `PUSHER_*` variables are unset.
    #[must_use]
    pub fn pusher(&self) -> Option<&PusherClient> {
        self.inner.pusher.as_ref()
    }

    #[must_use]
    pub fn cache(&self) -> &CatalogCache {
        &self.inner.cache
    }
}
