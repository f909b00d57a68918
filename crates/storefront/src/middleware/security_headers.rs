//! Response hardening headers for the storefront.
//!
//! Pages are personalised (cart badge, greeting, notifications) so they are
//! never cached; files under `/static` are.

use axum::{
    extract::Request,
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{CACHE_CONTROL, CONTENT_SECURITY_POLICY},
    },
    middleware::Next,
    response::Response,
};

use super::CspNonce;

/// Script host for htmx.
const HTMX_ORIGIN: &str = "https://unpkg.com";

const STATIC_PREFIX: &str = "/static/";

const FIXED_HEADERS: &[(&str, &str)] = &[
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "no-referrer"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("x-dns-prefetch-control", "off"),
    (
        "permissions-policy",
        "camera=(), microphone=(), geolocation=(), payment=(), usb=(), \
         serial=(), hid=(), midi=(), display-capture=(), browsing-topics=(), \
         interest-cohort=(), publickey-credentials-get=(), xr-spatial-tracking=()",
    ),
];

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let nonce = request.extensions().get::<CspNonce>().cloned();
    let is_static = request.uri().path().starts_with(STATIC_PREFIX);

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for &(name, value) in FIXED_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    apply_cache_policy(headers, is_static);

    let csp = content_security_policy(nonce.as_ref().map(CspNonce::value));
    if let Ok(value) = HeaderValue::from_str(&csp) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    response
}

/// Static files get a day of caching; everything else defaults to `no-store`
/// unless the handler chose a policy itself.
fn apply_cache_policy(headers: &mut HeaderMap, is_static: bool) {
    if is_static {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=86400"));
    } else if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }
}

/// Nonce-based CSP. Product images may come from any HTTPS host.
#[must_use]
pub fn content_security_policy(nonce: Option<&str>) -> String {
    let nonce_source = match nonce {
        Some(n) if !n.is_empty() => format!(" 'nonce-{n}'"),
        _ => String::new(),
    };

    [
        "default-src 'none'".to_string(),
        format!("script-src 'self'{nonce_source} {HTMX_ORIGIN}"),
        "style-src 'self'".to_string(),
        "font-src 'self'".to_string(),
        "img-src 'self' https: data:".to_string(),
        // htmx requests
        "connect-src 'self'".to_string(),
        "object-src 'none'".to_string(),
        "base-uri 'self'".to_string(),
        "form-action 'self'".to_string(),
        "frame-ancestors 'none'".to_string(),
    ]
    .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_includes_nonce() {
        let csp = content_security_policy(Some("abc123"));
        assert!(csp.contains("script-src 'self' 'nonce-abc123' https://unpkg.com;"));
        assert!(csp.ends_with("frame-ancestors 'none'"));
    }

    #[test]
    fn test_csp_without_nonce() {
        for nonce in [None, Some("")] {
            let csp = content_security_policy(nonce);
            assert!(csp.contains("script-src 'self' https://unpkg.com;"));
            assert!(!csp.contains("nonce-"));
        }
    }

    #[test]
    fn test_pages_are_not_cached() {
        let mut headers = HeaderMap::new();
        apply_cache_policy(&mut headers, false);
        assert_eq!(headers[CACHE_CONTROL], "no-store, max-age=0");
    }

    #[test]
    fn test_static_files_are_cached() {
        let mut headers = HeaderMap::new();
        apply_cache_policy(&mut headers, true);
        assert_eq!(headers[CACHE_CONTROL], "public, max-age=86400");
    }

    #[test]
    fn test_handler_cache_policy_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("private, max-age=60"));
        apply_cache_policy(&mut headers, false);
        assert_eq!(headers[CACHE_CONTROL], "private, max-age=60");
    }
}
