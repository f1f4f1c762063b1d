use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::services::{AccessRequirement, Acknowledgement, GatewayError, LoginInput};
use crate::domain::Principal;
use crate::presentation::config::SessionSettings;
use crate::presentation::extractors::Session;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct SessionUserResponse {
    pub id: String,
    pub name: String,
    pub is_admin: bool,
}

impl From<&Principal> for SessionUserResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id.clone(),
            name: principal.display_name.clone(),
            is_admin: principal.is_admin(),
        }
    }
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: SessionUserResponse,
}

#[tracing::instrument(skip(state, body))]
pub async fn login_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let input: LoginInput = serde_json::from_slice(&body).unwrap_or_default();

    let (principal, session) = match state.gateway.login(input).await {
        Ok(issued) => issued,
        Err(e) => return e.into_response(),
    };

    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    let cookie = match cookie_header(&session_cookie(&state.session, &session.token, max_age)) {
        Ok(value) => value,
        Err(e) => return e.into_response(),
    };

    (
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            token: session.token,
            expires_at: session.expires_at,
            user: SessionUserResponse::from(&principal),
        }),
    )
        .into_response()
}

pub async fn logout_handler(State(state): State<AppState>) -> Response {
    match cookie_header(&clear_cookie(&state.session.cookie_name)) {
        Ok(cookie) => (
            StatusCode::OK,
            [(SET_COOKIE, cookie)],
            Json(Acknowledgement {
                message: "Logged out".to_string(),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn session_handler(Session(session): Session) -> Response {
    match AccessRequirement::AnyPrincipal.authorize(&session) {
        Ok(principal) => Json(SessionUserResponse::from(principal)).into_response(),
        Err(e) => e.into_response(),
    }
}

fn session_cookie(settings: &SessionSettings, token: &str, max_age_seconds: i64) -> String {
    let secure = if settings.secure_cookie { "; Secure" } else { "" };
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        settings.cookie_name, token, max_age_seconds, secure
    )
}

fn clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn cookie_header(cookie: &str) -> Result<HeaderValue, GatewayError> {
    HeaderValue::from_str(cookie)
        .map_err(|e| GatewayError::Internal(format!("invalid cookie header: {}", e)))
}
