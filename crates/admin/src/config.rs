//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//! - `ADMIN_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `STORE_UTC_OFFSET_MINUTES` - Store timezone for "today" metrics (default: 180)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` (default 1.0; staff traffic is low)
//! - `DUKKAN_LOG_JSON` - Emit JSON logs when set
//! - `ADMIN_TLS_CERT`, `ADMIN_TLS_KEY` - PEM certificate chain and key; set
//!   both to serve HTTPS directly

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

use dukkan_core::env::{self, EnvError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error("ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together")]
    PartialTls,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public URL; an `https` scheme marks session cookies `Secure`.
    pub base_url: String,
    pub session_secret: SecretString,
    /// Store-local offset from UTC, for "today" on the dashboard.
    pub store_utc_offset_minutes: i32,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
    pub log_json: bool,
    pub tls: Option<TlsConfig>,
}

/// Certificate and key served by `axum-server`.
#[derive(Clone)]
pub struct TlsConfig {
    pub cert_pem: String,
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &format_args!("{} bytes", self.cert_pem.len()))
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::PartialTls` when only one half is set.
    pub fn from_parts(
        cert_pem: Option<String>,
        key_pem: Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        match (cert_pem, key_pem) {
            (Some(cert_pem), Some(key)) => Ok(Some(Self {
                cert_pem,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::PartialTls),
        }
    }
}

impl AdminConfig {
    /// Load from the environment after reading `.env`, if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a missing or unparseable variable, a weak
    /// session secret or half a TLS pair.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: env::database_url("ADMIN_DATABASE_URL")?,
            host: env::parse_or("ADMIN_HOST", "127.0.0.1")?,
            port: env::parse_or("ADMIN_PORT", "3001")?,
            base_url: env::required("ADMIN_BASE_URL")?,
            session_secret: env::secret("ADMIN_SESSION_SECRET")?,
            store_utc_offset_minutes: env::parse_or("STORE_UTC_OFFSET_MINUTES", "180")?,
            sentry_dsn: env::optional("SENTRY_DSN"),
            sentry_environment: env::optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env::parse_or("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env::parse_or("SENTRY_TRACES_SAMPLE_RATE", "1.0")?,
            log_json: env::optional("DUKKAN_LOG_JSON").is_some(),
            tls: TlsConfig::from_parts(
                env::optional("ADMIN_TLS_CERT"),
                env::optional("ADMIN_TLS_KEY"),
            )?,
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_both_or_neither() {
        assert!(TlsConfig::from_parts(None, None).unwrap().is_none());
        assert!(
            TlsConfig::from_parts(Some("cert".into()), Some("key".into()))
                .unwrap()
                .is_some()
        );
        assert!(matches!(
            TlsConfig::from_parts(Some("cert".into()), None),
            Err(ConfigError::PartialTls)
        ));
        assert!(TlsConfig::from_parts(None, Some("key".into())).is_err());
    }

    #[test]
    fn test_tls_debug_redacts_key() {
        let tls = TlsConfig::from_parts(Some("cert".into()), Some("private".into()))
            .unwrap()
            .unwrap();
        let debug = format!("{tls:?}");
        assert!(!debug.contains("private"));
        assert!(debug.contains("4 bytes"));
    }

    #[test]
    fn test_socket_addr() {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://localhost/dukkan"),
            host: "0.0.0.0".parse().unwrap(),
            port: 3001,
            base_url: "https://admin.dukkan.sa".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            store_utc_offset_minutes: 180,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            log_json: false,
            tls: None,
        };
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3001");
    }
}
