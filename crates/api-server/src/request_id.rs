//! Per-request correlation ids.
//!
//! The id is taken from a well-formed incoming `X-Request-Id` or generated,
//! then shows up in three places: the request's trace span, the
//! `X-Request-Id` response header and the `request_id` field of error bodies.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_LEN: usize = 128;

tokio::task_local! {
    static CURRENT_REQUEST_ID: String;
}

/// Request id carried in extensions for handlers and span creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Id of the request being handled, if called inside
/// [`request_id_middleware`].
pub fn current() -> Option<String> {
    CURRENT_REQUEST_ID.try_with(|id| id.clone()).ok()
}

/// Keep a client-supplied id only if it is a short token of
/// `[A-Za-z0-9._-]`; anything else is replaced so it cannot forge log lines.
pub fn resolve_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| {
            !s.is_empty()
                && s.len() <= MAX_LEN
                && s.bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        })
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// `make_span_with` hook for the trace layer. Must run inside
/// [`request_id_middleware`] so the extension is present.
pub fn request_span(request: &Request<Body>) -> Span {
    let id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.as_str())
        .unwrap_or("-");
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri().path(),
        request_id = %id,
    )
}

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = resolve_request_id(request.headers());
    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = CURRENT_REQUEST_ID.scope(id.clone(), next.run(request)).await;
    if let Ok(val) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(id).unwrap());
        headers
    }

    #[test]
    fn keeps_well_formed_ids() {
        assert_eq!(resolve_request_id(&headers_with(" trace-42.a_b ")), "trace-42.a_b");
    }

    #[test]
    fn replaces_missing_or_suspicious_ids() {
        let too_long = "x".repeat(MAX_LEN + 1);
        for raw in ["", "has space", "quote\"injection", too_long.as_str()] {
            let id = resolve_request_id(&headers_with(raw));
            assert!(Uuid::parse_str(&id).is_ok(), "{:?} was kept", raw);
        }
        assert!(Uuid::parse_str(&resolve_request_id(&HeaderMap::new())).is_ok());
    }

    #[tokio::test]
    async fn current_is_scoped_to_the_request() {
        assert_eq!(current(), None);
        let seen = CURRENT_REQUEST_ID
            .scope("abc".to_string(), async { current() })
            .await;
        assert_eq!(seen, Some("abc".to_string()));
    }
}
