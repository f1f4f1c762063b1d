use axum::Json;
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::application::services::TokenResolution;
use crate::domain::{PromptFamily, PromptId};
use crate::presentation::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct CreatePromptBody {
    version: Option<String>,
    prompt: Option<String>,
}

// Prompt routes are registered once per family in the router, so these take
// the family as a plain argument rather than from the path.

pub async fn list_prompts(
    state: AppState,
    session: TokenResolution,
    family: PromptFamily,
) -> Response {
    match state.gateway.list_prompts(&session, family).await {
        Ok(prompts) => Json(prompts).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_prompt(
    state: AppState,
    session: TokenResolution,
    family: PromptFamily,
    body: Bytes,
) -> Response {
    let body: CreatePromptBody = serde_json::from_slice(&body).unwrap_or_default();
    match state
        .gateway
        .create_prompt(&session, family, body.version, body.prompt)
        .await
    {
        Ok(ack) => (StatusCode::CREATED, Json(ack)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn active_prompt(
    state: AppState,
    session: TokenResolution,
    family: PromptFamily,
) -> Response {
    match state.gateway.active_prompt(&session, family).await {
        Ok(active) => Json(active).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn set_active_prompt(
    state: AppState,
    session: TokenResolution,
    family: PromptFamily,
    body: Bytes,
) -> Response {
    let prompt_id = selected_prompt_id(family, &body);
    match state
        .gateway
        .set_active_prompt(&session, family, prompt_id)
        .await
    {
        Ok(ack) => (StatusCode::CREATED, Json(ack)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Reads `{family}_prompt_id` (or `prompt_id`), as a string or a number.
fn selected_prompt_id(family: PromptFamily, body: &[u8]) -> Option<PromptId> {
    let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) else {
        return None;
    };
    let raw = fields
        .get(&family.id_field())
        .or_else(|| fields.get("prompt_id"))?;
    serde_json::from_value(raw.clone()).ok()
}
