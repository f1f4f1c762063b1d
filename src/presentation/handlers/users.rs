use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::application::services::CreateUserInput;
use crate::presentation::extractors::Session;
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

pub async fn list_users_handler(
    State(state): State<AppState>,
    Session(session): Session,
) -> Response {
    match state.gateway.list_users(&session).await {
        Ok(users) => Json(users).into_response(),
        Err(e) => e.into_response(),
    }
}

/// The body is read as raw bytes so authorization runs before any
/// validation of its contents.
pub async fn create_user_handler(
    State(state): State<AppState>,
    Session(session): Session,
    body: Bytes,
) -> Response {
    let input: CreateUserInput = serde_json::from_slice(&body).unwrap_or_default();
    match state.gateway.create_user(&session, input).await {
        Ok(ack) => (StatusCode::CREATED, Json(ack)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Session(session): Session,
    Query(query): Query<IdQuery>,
) -> Response {
    match state.gateway.delete_user(&session, query.id).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(e) => e.into_response(),
    }
}
