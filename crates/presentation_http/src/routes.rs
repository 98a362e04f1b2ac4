//! Route definitions

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::{handlers, middleware::RequestIdLayer, state::AppState};

/// Create the main router with all routes
///
/// Every response, including rejections, carries `X-Request-Id`.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_body_bytes;

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        // Voice API
        .route("/voice/asr", post(handlers::voice::asr))
        .route("/voice/tts", post(handlers::voice::tts))
        .route("/voice/ask", post(handlers::voice::ask))
        .route(
            "/voice/rate-limit-status",
            get(handlers::voice::rate_limit_status),
        )
        .route("/voice/upload-url", get(handlers::voice::upload_url))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestIdLayer::new())
        .with_state(state)
}
