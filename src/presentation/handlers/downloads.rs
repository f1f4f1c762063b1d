use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::HeaderValue;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

use crate::application::services::{
    ArtifactDownload, DownloadTarget, GatewayError, TokenResolution,
};
use crate::presentation::extractors::Session;
use crate::presentation::state::AppState;

pub async fn download_by_job_handler(
    State(state): State<AppState>,
    Session(session): Session,
    Path((file_type, job_id)): Path<(String, String)>,
) -> Response {
    serve(&state, &session, DownloadTarget::ByJob { file_type, job_id }).await
}

pub async fn download_user_text_handler(
    State(state): State<AppState>,
    Session(session): Session,
    Path((user, job_id, filename)): Path<(String, String, String)>,
) -> Response {
    let target = DownloadTarget::UserText {
        user,
        job_id,
        filename,
    };
    serve(&state, &session, target).await
}

pub async fn download_word_handler(
    State(state): State<AppState>,
    Session(session): Session,
    Path(filename): Path<String>,
) -> Response {
    serve(&state, &session, DownloadTarget::Word { filename }).await
}

pub async fn admin_download_word_handler(
    State(state): State<AppState>,
    Session(session): Session,
    Path((user, filename)): Path<(String, String)>,
) -> Response {
    serve(&state, &session, DownloadTarget::AdminWord { user, filename }).await
}

async fn serve(
    state: &AppState,
    session: &TokenResolution,
    target: DownloadTarget,
) -> Response {
    let outcome = match state.gateway.download(session, target).await {
        Ok(download) => stream_response(download),
        Err(e) => Err(e),
    };
    outcome.unwrap_or_else(IntoResponse::into_response)
}

/// Streams the backend body through unchanged; it is never buffered whole.
fn stream_response(download: ArtifactDownload) -> Result<Response, GatewayError> {
    let disposition = HeaderValue::from_bytes(download.content_disposition.as_bytes())
        .map_err(|e| GatewayError::Internal(format!("invalid content disposition: {}", e)))?;

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static(download.kind.content_type())),
            (CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(download.stream),
    )
        .into_response())
}
