//! Request ID middleware for request tracing and correlation.
//!
//! Reuses an upstream `x-request-id` only when it is a well-formed UUID;
//! anything else is replaced with a fresh UUID v4 so log correlation keys
//! are never attacker-chosen free text. The id is recorded in the current
//! tracing span, tagged on the Sentry scope, and returned in the response
//! headers.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that ensures every request has a unique request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = inbound_request_id(request.headers())
        .unwrap_or_else(Uuid::new_v4)
        .to_string();

    // Record in current span for structured logging
    Span::current().record("request_id", &request_id);

    // Set in Sentry scope for error correlation
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// The upstream request id, if the header carries a well-formed UUID.
fn inbound_request_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_upstream_id_is_kept() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            REQUEST_ID_HEADER,
            HeaderValue::from_str(&id.to_string()).expect("header"),
        );
        assert_eq!(inbound_request_id(&headers), Some(id));
    }

    #[test]
    fn test_malformed_upstream_id_is_discarded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            REQUEST_ID_HEADER,
            HeaderValue::from_static("not-a-uuid; DROP TABLE product"),
        );
        assert_eq!(inbound_request_id(&headers), None);

        assert_eq!(inbound_request_id(&HeaderMap::new()), None);
    }
}
