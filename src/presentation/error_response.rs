use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::services::GatewayError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self {
            GatewayError::Transport(detail) => {
                tracing::error!(error = %detail, "Backend unreachable");
            }
            GatewayError::Internal(detail) => {
                tracing::error!(error = %detail, "Gateway failure");
            }
            GatewayError::BackendRejected { status, message } => {
                tracing::debug!(status = *status, message = %message, "Relaying backend rejection");
            }
            _ => {}
        }

        (
            status,
            Json(ErrorResponse {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}
