//! Request ids for the back-office.
//!
//! The admin is reached directly, so inbound `x-request-id` headers are not
//! trusted; every request gets a fresh UUID.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let id = Uuid::new_v4();

    Span::current().record("request_id", tracing::field::display(id));
    sentry::configure_scope(|scope| scope.set_tag("request_id", id));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
