//! # Quill Server
//!
//! HTTP surface for Quill's journal reflections.
//!
//! - `POST /api/analyze-mood`: one-line reflection on a journal entry,
//!   always answering with a usable reply unless the request itself is
//!   malformed
//! - `GET /health` and `GET /ping`: liveness probes

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use handlers::{health_handler, ping_handler};

/// Build the full application router.
pub fn create_app(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state);

    Router::new()
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
        .nest("/api", routes::create_api_router())
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Permissive in dev, allow-list otherwise.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    if state.config().dev_mode {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = state
        .config()
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
