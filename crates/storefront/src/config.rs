//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STORE_UTC_OFFSET_MINUTES` - Store local time offset for shift status (default: 180)
//! - `PUSHER_APP_ID`, `PUSHER_KEY`, `PUSHER_SECRET`, `PUSHER_CLUSTER` - New-order
//!   notifications to the dispatch dashboard (set all four or none)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)
//! - `DUKKAN_LOG_JSON` - Emit JSON logs when set

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

use dukkan_core::env::{self, EnvError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error("set PUSHER_APP_ID, PUSHER_KEY, PUSHER_SECRET and PUSHER_CLUSTER together")]
    PartialPusher,
}

#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public URL, used for absolute links and the `Secure` cookie flag.
    pub base_url: String,
    pub session_secret: SecretString,
    /// Store wall-clock offset from UTC, used for shift status.
    pub store_utc_offset_minutes: i32,
    /// `None` disables new-order events.
    pub pusher: Option<PusherConfig>,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
    pub log_json: bool,
}

/// Pusher Channels REST credentials.
#[derive(Clone)]
pub struct PusherConfig {
    pub app_id: String,
    pub key: String,
    pub secret: SecretString,
    pub cluster: String,
}

impl std::fmt::Debug for PusherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PusherConfig")
            .field("app_id", &self.app_id)
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .field("cluster", &self.cluster)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load from the environment after reading `.env`, if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a missing or unparseable variable, a weak
    /// session secret or a partial Pusher set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let pusher = PusherConfig::from_parts(
            env::optional("PUSHER_APP_ID"),
            env::optional("PUSHER_KEY"),
            env::optional("PUSHER_SECRET"),
            env::optional("PUSHER_CLUSTER"),
        )?;

        Ok(Self {
            database_url: env::database_url("STOREFRONT_DATABASE_URL")?,
            host: env::parse_or("STOREFRONT_HOST", "127.0.0.1")?,
            port: env::parse_or("STOREFRONT_PORT", "3000")?,
            base_url: env::required("STOREFRONT_BASE_URL")?,
            session_secret: env::secret("STOREFRONT_SESSION_SECRET")?,
            store_utc_offset_minutes: env::parse_or("STORE_UTC_OFFSET_MINUTES", "180")?,
            pusher,
            sentry_dsn: env::optional("SENTRY_DSN"),
            sentry_environment: env::optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env::parse_or("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env::parse_or("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
            log_json: env::optional("DUKKAN_LOG_JSON").is_some(),
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PusherConfig {
    /// All four present enables Pusher, none disables it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::PartialPusher` for anything in between.
    pub fn from_parts(
        app_id: Option<String>,
        key: Option<String>,
        secret: Option<String>,
        cluster: Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        match (app_id, key, secret, cluster) {
            (Some(app_id), Some(key), Some(secret), Some(cluster)) => Ok(Some(Self {
                app_id,
                key,
                secret: SecretString::from(secret),
                cluster,
            })),
            (None, None, None, None) => Ok(None),
            _ => Err(ConfigError::PartialPusher),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_pusher_all_or_none() {
        assert!(PusherConfig::from_parts(None, None, None, None).unwrap().is_none());

        let full =
            PusherConfig::from_parts(some("123"), some("key"), some("s3cr3t"), some("ap2"))
                .unwrap()
                .unwrap();
        assert_eq!(full.cluster, "ap2");

        let partial = PusherConfig::from_parts(some("123"), some("key"), None, None);
        assert!(matches!(partial, Err(ConfigError::PartialPusher)));
    }

    #[test]
    fn test_pusher_debug_redacts_secret() {
        let config =
            PusherConfig::from_parts(some("123"), some("pub-key"), some("very-private"), some("eu"))
                .unwrap()
                .unwrap();
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("pub-key"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("very-private"));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/dukkan"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            store_utc_offset_minutes: 180,
            pusher: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
            log_json: false,
        };
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
    }
}
