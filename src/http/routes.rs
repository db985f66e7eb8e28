use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and text fields beyond the audio itself
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let body_limit = (state.storage.max_bytes() + MULTIPART_OVERHEAD_BYTES) as usize;

    Router::new()
        // Liveness
        .route("/", get(handlers::health_check))
        // Analysis pipeline
        .route("/predict", post(handlers::predict))
        // Session records
        .route("/session", post(handlers::create_session))
        .route("/session/:user_id", get(handlers::list_sessions))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
