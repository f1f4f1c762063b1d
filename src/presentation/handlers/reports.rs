use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::presentation::extractors::Session;
use crate::presentation::state::AppState;

pub async fn stats_handler(State(state): State<AppState>, Session(session): Session) -> Response {
    match state.gateway.usage_stats(&session).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn logs_handler(State(state): State<AppState>, Session(session): Session) -> Response {
    match state.gateway.error_logs(&session).await {
        Ok(logs) => Json(logs).into_response(),
        Err(e) => e.into_response(),
    }
}
