//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::error::SaveError;
use crate::protocol::ErrorOut;
use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws?profile=...`
/// - REST-ish API under `/api/v1/...`
/// - Static page from `./static` with index fallback (the renderer lives there)
/// - CORS (allow any origin/method/headers), adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // Stateless
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/curriculum", get(http::http_get_curriculum))
        .route("/api/v1/analyze", post(http::http_post_analyze))
        .route("/api/v1/feedback", post(http::http_post_feedback))
        // Sessions
        .route("/api/v1/sessions", post(http::http_open_session))
        .route("/api/v1/sessions/:profile", get(http::http_get_session))
        .route("/api/v1/sessions/:profile/progress", get(http::http_get_progress))
        .route("/api/v1/sessions/:profile/identity", put(http::http_put_identity))
        .route("/api/v1/sessions/:profile/identity/save", post(http::http_save_identity))
        .route(
            "/api/v1/sessions/:profile/fields/:field_id",
            get(http::http_get_field).put(http::http_put_answer),
        )
        .route("/api/v1/sessions/:profile/fields/:field_id/review", post(http::http_review))
        .route("/api/v1/sessions/:profile/fields/:field_id/solution", post(http::http_toggle_solution))
        .route("/api/v1/sessions/:profile/fields/:field_id/hint", post(http::http_toggle_hint))
        .route("/api/v1/sessions/:profile/fields/:field_id/clear", post(http::http_clear))
        .route("/api/v1/sessions/:profile/fields/:field_id/save_local", post(http::http_save_local))
        .route("/api/v1/sessions/:profile/fields/:field_id/load_local", post(http::http_load_local))
        .route("/api/v1/sessions/:profile/fields/:field_id/save_remote", post(http::http_save_remote))
        .route(
            "/api/v1/sessions/:profile/exercises/:exercise_id/complete",
            post(http::http_toggle_complete),
        )
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

/// HTTP status for a failed save.
pub fn save_status_code(e: &SaveError) -> StatusCode {
    match e {
        SaveError::InvalidIdentity | SaveError::EmptyContent => StatusCode::BAD_REQUEST,
        SaveError::RemoteNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        SaveError::Remote(_) => StatusCode::BAD_GATEWAY,
        SaveError::Local(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Lookup failures shared by the handlers.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
        };
        (status, Json(ErrorOut { message })).into_response()
    }
}
