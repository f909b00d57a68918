//! Pusher Channels client for new-order events.
//!
//! Events are published with the signed REST API. Publishing is best-effort:
//! checkout spawns [`PusherClient::trigger`] after commit and only logs
//! failures.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

use dukkan_core::{Money, OrderNumber};

use crate::config::PusherConfig;

/// Channel the admin dashboard listens on.
pub const ORDERS_CHANNEL: &str = "orders";

/// Event name for newly placed orders.
pub const NEW_ORDER_EVENT: &str = "new-order";

const AUTH_VERSION: &str = "1.0";

/// Errors that can occur when publishing to Pusher.
#[derive(Debug, Error)]
pub enum PusherError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Secret unusable as an HMAC key.
    #[error("invalid signing key")]
    InvalidKey,
}

/// Order summary sent to the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderEvent {
    pub order_number: OrderNumber,
    pub customer_name: String,
    /// Total rounded to two decimals, as a string.
    pub amount: String,
    pub item_count: u32,
    pub created_at: DateTime<Utc>,
}

impl NewOrderEvent {
    #[must_use]
    pub fn new(
        order_number: OrderNumber,
        customer_name: String,
        amount: Money,
        item_count: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_number,
            customer_name,
            amount: format!("{:.2}", amount.rounded()),
            item_count,
            created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct TriggerBody<'a> {
    name: &'a str,
    channels: [&'a str; 1],
    /// JSON-encoded event data, as the API expects a string.
    data: String,
}

/// Pusher Channels REST client.
#[derive(Clone)]
pub struct PusherClient {
    client: reqwest::Client,
    app_id: String,
    key: String,
    secret: SecretString,
    host: String,
}

impl PusherClient {
    /// Create a new Pusher client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PusherConfig) -> Result<Self, PusherError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            app_id: config.app_id.clone(),
            key: config.key.clone(),
            secret: config.secret.clone(),
            host: format!("https://api-{}.pusher.com", config.cluster),
        })
    }

    /// Publish a new-order event on the orders channel.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Pusher rejects it.
    pub async fn trigger_new_order(&self, event: &NewOrderEvent) -> Result<(), PusherError> {
        self.trigger(ORDERS_CHANNEL, NEW_ORDER_EVENT, event).await
    }

    /// Publish an event on one channel.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Pusher rejects it.
    #[tracing::instrument(skip(self, data))]
    pub async fn trigger<T: Serialize + Sync>(
        &self,
        channel: &str,
        event: &str,
        data: &T,
    ) -> Result<(), PusherError> {
        let body = serde_json::to_string(&TriggerBody {
            name: event,
            channels: [channel],
            data: serde_json::to_string(data)?,
        })?;

        let path = format!("/apps/{}/events", self.app_id);
        let query = signed_query(
            &self.key,
            self.secret.expose_secret(),
            &path,
            &body,
            Utc::now().timestamp(),
        )?;
        let url = format!("{}{path}?{query}", self.host);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PusherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!("Pusher event delivered");
        Ok(())
    }
}

/// Build the authenticated query string for a POST to `path`.
///
/// Parameters are in key order, which is also the order they are signed in.
fn signed_query(
    key: &str,
    secret: &str,
    path: &str,
    body: &str,
    timestamp: i64,
) -> Result<String, PusherError> {
    let body_md5 = hex::encode(Md5::digest(body.as_bytes()));
    let params = format!(
        "auth_key={key}&auth_timestamp={timestamp}&auth_version={AUTH_VERSION}&body_md5={body_md5}"
    );
    let string_to_sign = format!("POST\n{path}\n{params}");

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| PusherError::InvalidKey)?;
    mac.update(string_to_sign.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(format!("{params}&auth_signature={signature}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_signed_query_layout() {
        let query = signed_query("key", "secret", "/apps/1/events", "{}", 1_700_000_000).unwrap();
        let expected_md5 = "99914b932bd37a50b983c5e7c90ae93b";
        assert!(query.starts_with(&format!(
            "auth_key=key&auth_timestamp=1700000000&auth_version=1.0&body_md5={expected_md5}&auth_signature="
        )));
        let signature = query.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_signature_matches_hmac_of_request() {
        let query = signed_query("k", "s", "/apps/9/events", "body", 42).unwrap();
        let (params, signature) = query.split_once("&auth_signature=").unwrap();

        let mut mac = Hmac::<Sha256>::new_from_slice(b"s").unwrap();
        mac.update(format!("POST\n/apps/9/events\n{params}").as_bytes());
        assert_eq!(signature, hex::encode(mac.finalize().into_bytes()));
    }

    #[test]
    fn test_event_payload_shape() {
        let event = NewOrderEvent::new(
            OrderNumber::parse("ORD-1700000000000").unwrap(),
            "سارة".to_string(),
            Money::new("201.25".parse().unwrap()),
            4,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["orderNumber"], "ORD-1700000000000");
        assert_eq!(json["amount"], "201.25");
        assert_eq!(json["itemCount"], 4);
        assert!(json.get("createdAt").is_some());
    }
}
