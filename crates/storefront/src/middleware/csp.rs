//! Per-request script nonce.
//!
//! The storefront base layout carries one inline script (cart badge and the
//! htmx config); it runs only when its `nonce` matches the CSP header.

use std::convert::Infallible;
use std::fmt;

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

const NONCE_BYTES: usize = 18;

/// Random base64 token shared by the CSP header and the page's `<script>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CspNonce(pub String);

impl CspNonce {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CspNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stores a fresh [`CspNonce`] in the request extensions.
///
/// Sits inside the security headers layer so the header builder can read it
/// back after the handler has rendered the page.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(CspNonce::generate());
    next.run(request).await
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(nonce) = parts.extensions.get::<Self>() {
            return Ok(nonce.clone());
        }
        // Without the layer the page still renders; its inline script is blocked.
        tracing::warn!(path = %parts.uri.path(), "No CSP nonce on request");
        Ok(Self(String::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_is_unpadded_base64() {
        let nonce = CspNonce::generate();
        assert_eq!(nonce.value().len(), NONCE_BYTES / 3 * 4);
        assert!(!nonce.value().ends_with('='));
        assert!(STANDARD.decode(nonce.value()).is_ok());
    }

    #[test]
    fn test_nonces_differ_per_request() {
        assert_ne!(CspNonce::generate(), CspNonce::generate());
    }

    #[tokio::test]
    async fn test_missing_nonce_extracts_empty() {
        let (mut parts, ()) = axum::http::Request::new(()).into_parts();
        let nonce = CspNonce::from_request_parts(&mut parts, &()).await;
        assert_eq!(nonce.map(|n| n.0), Ok(String::new()));
    }
}
