use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::presentation::extractors::Session;
use crate::presentation::state::AppState;

use super::users::IdQuery;

pub async fn list_all_transcriptions_handler(
    State(state): State<AppState>,
    Session(session): Session,
) -> Response {
    match state.gateway.list_all_jobs(&session).await {
        Ok(jobs) => Json(jobs).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_transcription_handler(
    State(state): State<AppState>,
    Session(session): Session,
    Query(query): Query<IdQuery>,
) -> Response {
    match state.gateway.delete_job(&session, query.id).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_own_transcriptions_handler(
    State(state): State<AppState>,
    Session(session): Session,
) -> Response {
    match state.gateway.list_own_jobs(&session).await {
        Ok(jobs) => Json(jobs).into_response(),
        Err(e) => e.into_response(),
    }
}
