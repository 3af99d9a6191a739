use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    // Twice the validation cap: moderately oversized uploads should reach
    // payload validation and get its distinguishable 400
    let body_limit = (state.config.upload.max_bytes as usize).saturating_mul(2);
    let artifact_root = state.config.storage.root.clone();

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Transcription pipeline
        .route("/transcriptions", post(handlers::submit_transcription))
        .route("/transcriptions/:id", get(handlers::get_transcription))
        // Stored raw audio, resolvable at the URLs records carry
        .nest_service("/artifacts", ServeDir::new(artifact_root))
        .layer(DefaultBodyLimit::max(body_limit))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
