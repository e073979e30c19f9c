use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use patient_store::User;

use crate::{AppError, AppState};

pub const SESSION_COOKIE: &str = "session";

#[cfg(test)]
#[path = "auth_tests.rs"]
mod auth_tests;

/// The logged-in user, inserted into request extensions by
/// [`require_session`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Session-cookie middleware for protected routes.
///
/// Resolves the `session` cookie against the session store. Missing,
/// unknown and expired sessions are all rejected with 401.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(&jar).ok_or(AuthError::Unauthorized)?;

    let user = state
        .sessions
        .resolve(&token)
        .await?
        .ok_or(AuthError::Unauthorized)?;

    tracing::debug!("Session resolved for {}", user.username);
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

pub(crate) fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// HttpOnly, SameSite=Lax cookie carrying the raw session token.
pub(crate) fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub(crate) fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Authentication failures.
#[derive(Debug)]
pub enum AuthError {
    Unauthorized,
    InvalidCredentials,
    Locked,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthorized | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Locked => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Unauthorized => write!(f, "Unauthorized - please log in"),
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::Locked => write!(
                f,
                "Too many failed login attempts. Please try again later."
            ),
        }
    }
}

impl std::error::Error for AuthError {}
