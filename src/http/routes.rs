use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session control
        .route("/session/connect", post(handlers::connect))
        .route("/session/disconnect", post(handlers::disconnect))
        // Session queries
        .route("/session", get(handlers::get_status))
        .route("/session/transcript", get(handlers::get_transcript))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        // The rendering client is usually a browser page on another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}
