//! Account routes: register, login, logout and the current user.

use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use lazy_static::lazy_static;
use patient_store::User;
use regex::Regex;
use serde::Serialize;
use std::net::SocketAddr;

use crate::auth::{self, AuthError, CurrentUser};
use crate::sanitize::SanitizedPayload;
use crate::{ApiResponse, AppError, AppState};

lazy_static! {
    static ref USERNAME: Regex = Regex::new(r"^[A-Za-z0-9]+$").expect("valid username pattern");
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct UserSummary {
    pub username: String,
}

#[derive(Serialize)]
pub struct CurrentUserResponse {
    pub user: UserSummary,
}

/// Routes reachable without a session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

/// Routes that need a session; mounted behind [`auth::require_session`].
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/current_user", get(current_user))
}

fn credentials(payload: &SanitizedPayload) -> Result<(String, String), AppError> {
    match (payload.text("username"), payload.text("password")) {
        (Some(username), Some(password)) => Ok((username.to_string(), password.to_string())),
        _ => Err(AppError::bad_request("Username and password required")),
    }
}

fn message(text: &str) -> Json<ApiResponse<MessageResponse>> {
    Json(ApiResponse::success(MessageResponse {
        message: text.to_string(),
    }))
}

async fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: &User,
) -> Result<CookieJar, AppError> {
    let token = state.sessions.create(user).await?;
    Ok(jar.add(auth::session_cookie(
        token,
        state.config.session_cookie_secure,
    )))
}

/// Create an account and log it in.
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: SanitizedPayload,
) -> Result<(StatusCode, CookieJar, Json<ApiResponse<MessageResponse>>), AppError> {
    let (username, password) = credentials(&payload)?;

    if !USERNAME.is_match(&username) {
        return Err(AppError::bad_request(
            "Username can only contain alphabets and numbers.",
        ));
    }

    let user = state.users.create(&username, &password).await?;
    let jar = start_session(&state, jar, &user).await?;

    Ok((StatusCode::CREATED, jar, message("User registered and logged in")))
}

async fn login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    jar: CookieJar,
    payload: SanitizedPayload,
) -> Result<(CookieJar, Json<ApiResponse<MessageResponse>>), AppError> {
    let client = connect_info
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if state.brute_force_guard.is_locked(&client) {
        return Err(AuthError::Locked.into());
    }

    let (username, password) = credentials(&payload)?;

    let Some(user) = state.users.verify_credentials(&username, &password).await? else {
        tracing::warn!("Failed login attempt from {}", client);
        state.brute_force_guard.record_failure(&client);
        return Err(AuthError::InvalidCredentials.into());
    };

    state.brute_force_guard.record_success(&client);
    let jar = start_session(&state, jar, &user).await?;
    tracing::info!("User logged in: {}", user.username);

    Ok((jar, message("Logged in successfully")))
}

async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<MessageResponse>>), AppError> {
    if let Some(token) = auth::session_token(&jar) {
        state.sessions.revoke(&token).await?;
    }
    Ok((
        jar.remove(auth::clear_session_cookie()),
        message("Logged out successfully"),
    ))
}

async fn current_user(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ApiResponse<CurrentUserResponse>> {
    Json(ApiResponse::success(CurrentUserResponse {
        user: UserSummary {
            username: user.username,
        },
    }))
}
