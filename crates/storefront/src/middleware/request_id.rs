//! Request ID middleware for request tracing and correlation.
//!
//! Reuses an `x-request-id` from an upstream proxy when it looks sane,
//! otherwise generates a UUID v4. The id is recorded on the request span,
//! tagged on the Sentry scope and echoed back in the response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream request id we accept.
const MAX_REQUEST_ID_LENGTH: usize = 128;

/// Accept an upstream id only if it is short, non-empty visible ASCII.
fn sanitize(candidate: &str) -> Option<&str> {
    let candidate = candidate.trim();
    let ok = !candidate.is_empty()
        && candidate.len() <= MAX_REQUEST_ID_LENGTH
        && candidate.bytes().all(|b| b.is_ascii_graphic());
    ok.then_some(candidate)
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(sanitize)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", request_id.as_str());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(" abc-123 "), Some("abc-123"));
        assert_eq!(sanitize(""), None);
        assert_eq!(sanitize("has space"), None);
        assert_eq!(sanitize(&"x".repeat(MAX_REQUEST_ID_LENGTH + 1)), None);
    }
}
