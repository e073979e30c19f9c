//! HTTP API for the stroke risk service.
//!
//! Session-authenticated patient CRUD and risk predictions over a SQLite
//! store. Routes are split by concern into `*_routes` modules that share
//! [`AppState`], [`ApiResponse`] and [`AppError`].

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use patient_store::{PatientDb, PatientRepository, SessionStore, StoreError, UserRepository};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use stroke_risk::{RiskScorer, ScoringError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod auth_routes;
pub mod brute_force;
pub mod config;
pub mod patient_routes;
pub mod predict_routes;
pub mod request_id;
pub mod sanitize;
pub mod security_headers;

use auth::AuthError;
use brute_force::BruteForceGuard;
use config::ServerConfig;
use security_headers::SecurityHeaders;

#[derive(Clone)]
pub struct AppState {
    pub patients: PatientRepository,
    pub users: UserRepository,
    pub sessions: SessionStore,
    pub scorer: RiskScorer,
    pub brute_force_guard: Arc<BruteForceGuard>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: &PatientDb, config: ServerConfig) -> Self {
        Self {
            patients: db.patients(),
            users: db.users(config.bcrypt_cost),
            sessions: db.sessions(chrono::Duration::hours(config.session_ttl_hours)),
            scorer: RiskScorer::default(),
            brute_force_guard: Arc::new(BruteForceGuard::new(config.brute_force)),
            config: Arc::new(config),
        }
    }
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Handler error: a status code plus the underlying cause.
///
/// Anything convertible to `anyhow::Error` converts into an `AppError`; the
/// status is picked from the concrete error type. Server errors are logged
/// and rendered with a generic message. Bodies carry the request id so a
/// client report can be matched to the log line.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::Error::msg(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        Self {
            status: status_for(&error),
            error,
        }
    }
}

fn status_for(error: &anyhow::Error) -> StatusCode {
    if let Some(err) = error.downcast_ref::<StoreError>() {
        return match err {
            StoreError::PatientNotFound => StatusCode::NOT_FOUND,
            StoreError::InvalidPatientId
            | StoreError::Validation(_)
            | StoreError::DuplicateUsername => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
    }
    if error.downcast_ref::<ScoringError>().is_some() {
        return StatusCode::BAD_REQUEST;
    }
    if let Some(err) = error.downcast_ref::<AuthError>() {
        return err.status();
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
            "Internal server error".to_string()
        } else {
            self.error.to_string()
        };

        let mut body = json!({
            "success": false,
            "error": message,
        });
        if let Some(id) = request_id::current() {
            body["request_id"] = json!(id);
        }

        (self.status, Json(body)).into_response()
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "stroke-risk-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Assemble every route and middleware layer around `state`.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth_routes::session_routes())
        .merge(patient_routes::patient_routes())
        .merge(predict_routes::predict_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let headers = Arc::new(SecurityHeaders::new(state.config.enable_hsts));

    // Outermost last: the request id must exist before the trace span opens.
    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes::public_routes())
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            headers,
            security_headers::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(request_id::request_span))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,sqlx=warn".into());

    let json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Periodic housekeeping: stale lockout records and expired sessions.
fn spawn_cleanup(state: &AppState) {
    let guard = state.brute_force_guard.clone();
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            guard.cleanup();
            tracing::debug!("Login guard tracking {} clients", guard.tracked());
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Purged {} expired sessions", n),
                Err(e) => tracing::warn!("Session purge failed: {}", e),
            }
        }
    });
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    let bind_addr = config.bind_addr;

    tracing::info!("Opening patient database");
    let db = PatientDb::new(&config.database_url).await?;
    let state = AppState::new(&db, config);
    spawn_cleanup(&state);

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Stroke risk API listening on {}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
