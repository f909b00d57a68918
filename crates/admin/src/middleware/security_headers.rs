//! Security headers for admin responses.
//!
//! The admin loads no third-party scripts, so the CSP is tighter than the
//! storefront's: only same-origin assets plus the per-request nonce.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::CspNonce;

/// Add security headers to all admin responses.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let nonce = request
        .extensions()
        .get::<CspNonce>()
        .map(|n| n.value().to_string());

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    headers.insert(
        STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("camera=(), geolocation=(), microphone=(), payment=(), usb=()"),
    );

    if let Ok(value) = HeaderValue::from_str(&content_security_policy(nonce.as_deref())) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    response
}

/// Build the admin CSP. Product image previews may come from any HTTPS host.
#[must_use]
pub fn content_security_policy(nonce: Option<&str>) -> String {
    let script_nonce = nonce
        .filter(|n| !n.is_empty())
        .map(|n| format!(" 'nonce-{n}'"))
        .unwrap_or_default();

    format!(
        "default-src 'none'; \
         script-src 'self'{script_nonce}; \
         style-src 'self'; \
         img-src 'self' https: data:; \
         connect-src 'self'; \
         form-action 'self'; \
         base-uri 'self'; \
         frame-ancestors 'none'"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_has_no_third_party_scripts() {
        let csp = content_security_policy(Some("n0nce"));
        assert!(csp.contains("script-src 'self' 'nonce-n0nce';"));
        assert!(!csp.contains("unpkg"));
    }

    #[test]
    fn test_csp_ignores_empty_nonce() {
        let csp = content_security_policy(Some(""));
        assert!(csp.contains("script-src 'self';"));
    }
}
