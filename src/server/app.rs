use axum::{extract::DefaultBodyLimit, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::api::api_routes;
use crate::template::MAX_CONTENT_BYTES;

use super::AppState;

/// Longest JSON escape of a single content byte (`\u0001`)
const MAX_ESCAPE_BYTES: usize = 6;

/// Request body cap: both content fields at their limit, fully escaped,
/// plus room for the envelope. Field sizes are enforced after decoding.
const MAX_BODY_BYTES: usize = 2 * MAX_ESCAPE_BYTES * MAX_CONTENT_BYTES + MAX_CONTENT_BYTES;

pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state.clone()))
        // Add middleware
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Add state
        .with_state(state)
}
