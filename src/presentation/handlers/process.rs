use axum::Json;
use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};

use crate::application::ports::AudioUpload;
use crate::application::services::{AccessRequirement, GatewayError, SubmissionInput};
use crate::presentation::extractors::Session;
use crate::presentation::state::AppState;

/// Upper bound for an uploaded recording.
pub const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

#[tracing::instrument(skip(state, session, multipart))]
pub async fn process_handler(
    State(state): State<AppState>,
    Session(session): Session,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    // Reject unauthenticated callers before reading a potentially large body.
    if let Err(e) = AccessRequirement::AnyPrincipal.authorize(&session) {
        return e.into_response();
    }

    let input = match multipart {
        Ok(multipart) => match read_submission(multipart).await {
            Ok(input) => input,
            Err(e) => return e.into_response(),
        },
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Submission is not multipart");
            return GatewayError::bad_request("Expected a multipart/form-data body").into_response();
        }
    };

    match state.gateway.submit_job(&session, input).await {
        Ok(accepted) => Json(accepted).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<SubmissionInput, GatewayError> {
    let mut input = SubmissionInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| "recording".to_string());
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| GatewayError::BadRequest(format!("Failed to read file: {}", e)))?;
                tracing::debug!(filename = %filename, bytes = data.len(), "Received recording");
                input.file = Some(AudioUpload {
                    filename,
                    content_type,
                    data,
                });
            }
            "drive_link" => input.drive_link = Some(text(field).await?),
            "start_time" => input.start_time = Some(text(field).await?),
            "end_time" => input.end_time = Some(text(field).await?),
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(input)
}

async fn text(field: Field<'_>) -> Result<String, GatewayError> {
    field
        .text()
        .await
        .map_err(|e| GatewayError::BadRequest(format!("Invalid form field: {}", e)))
}
