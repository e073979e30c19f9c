use super::*;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::IntoResponse;

#[test]
fn test_session_token_from_cookie_header() {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_static("theme=dark; session=abc123"),
    );
    let jar = CookieJar::from_headers(&headers);
    assert_eq!(session_token(&jar), Some("abc123".to_string()));
}

#[test]
fn test_session_token_missing_or_blank() {
    let jar = CookieJar::from_headers(&HeaderMap::new());
    assert_eq!(session_token(&jar), None);

    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_static("session="));
    let jar = CookieJar::from_headers(&headers);
    assert_eq!(session_token(&jar), None);
}

#[test]
fn test_session_cookie_flags() {
    let cookie = session_cookie("tok".to_string(), true);
    assert_eq!(cookie.name(), SESSION_COOKIE);
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
}

#[test]
fn test_auth_error_statuses() {
    assert_eq!(AuthError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(AuthError::Locked.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[test]
fn test_auth_error_renders_through_app_error() {
    let err: AppError = AuthError::Unauthorized.into();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
