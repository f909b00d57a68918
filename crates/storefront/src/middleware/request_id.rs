//! Request correlation ids.
//!
//! Cloudflare sits in front of the storefront and forwards its own
//! `x-request-id`; the value is reused when it looks sane so customer
//! reports can be matched against both logs.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_UPSTREAM_ID_CHARS: usize = 128;

/// Accept an upstream id only if it is short, visible ASCII.
fn upstream_id(value: Option<&HeaderValue>) -> Option<String> {
    let id = value?.to_str().ok()?.trim();
    let sane = !id.is_empty()
        && id.len() <= MAX_UPSTREAM_ID_CHARS
        && id.bytes().all(|b| b.is_ascii_graphic());
    sane.then(|| id.to_string())
}

/// Tags the span, the Sentry scope and the response with the request id.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let id = upstream_id(request.headers().get(REQUEST_ID_HEADER))
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &id));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_id_is_reused() {
        let value = HeaderValue::from_static("cf-8a1b2c3d");
        assert_eq!(upstream_id(Some(&value)).as_deref(), Some("cf-8a1b2c3d"));
    }

    #[test]
    fn test_unusable_upstream_ids_are_replaced() {
        assert_eq!(upstream_id(None), None);
        assert_eq!(upstream_id(Some(&HeaderValue::from_static("  "))), None);
        assert_eq!(upstream_id(Some(&HeaderValue::from_static("a b"))), None);

        let long = HeaderValue::from_str(&"x".repeat(MAX_UPSTREAM_ID_CHARS + 1))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(upstream_id(Some(&long)), None);
    }
}
