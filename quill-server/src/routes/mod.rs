use axum::{Router, routing::post};

use crate::handlers::analyze_mood_handler;
use crate::infra::app_state::AppState;

/// Routes served under `/api`.
pub fn create_api_router() -> Router<AppState> {
    Router::new().route("/analyze-mood", post(analyze_mood_handler))
}
