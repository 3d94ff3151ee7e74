use axum::{Json, body::Bytes, extract::State};
use quill_core::reflection::{JournalEntry, MoodAnalysis};
use serde_json::Value;
use tracing::error;

use crate::infra::{app_state::AppState, errors::AppResult};

/// `POST /api/analyze-mood`
///
/// The body is taken raw so that unparseable JSON falls through to the
/// fallback reflection instead of axum's own 4xx rejection.
pub async fn analyze_mood_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<MoodAnalysis>> {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            error!(error = %err, "error analyzing mood: unreadable request body");
            return Ok(Json(MoodAnalysis::fallback()));
        }
    };

    let entry = JournalEntry::from_json(&payload)?;
    Ok(Json(state.reflector().reflect(&entry).await))
}
