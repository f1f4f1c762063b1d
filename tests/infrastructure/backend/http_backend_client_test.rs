use std::time::Duration;

use axum::extract::{Multipart, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures::TryStreamExt;
use serde_json::{Value, json};

use scribe_gateway::application::ports::{
    AudioUpload, BackendClient, BackendError, JobSubmission, LoginCredentials, SubmissionSource,
};
use scribe_gateway::domain::{
    ArtifactKind, ArtifactLocator, Credential, PathSegment, PromptFamily, PromptId, UserId,
};
use scribe_gateway::infrastructure::backend::HttpBackendClient;

use crate::helpers::serve_app;

fn bearer(headers: &HeaderMap) -> Value {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| Value::String(v.to_string()))
        .unwrap_or(Value::Null)
}

fn mock_backend() -> Router {
    Router::new()
        .route(
            "/login",
            post(|Json(body): Json<Value>| async move {
                if body["password"] == "right" {
                    (
                        StatusCode::OK,
                        Json(json!({ "access_token": "backend-tok", "is_admin": true })),
                    )
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({ "msg": "Bad username or password" })),
                    )
                }
            }),
        )
        .route(
            "/admin/users",
            get(|headers: HeaderMap| async move {
                Json(json!([{ "id": 1, "username": "admin", "auth": bearer(&headers) }]))
            }),
        )
        .route(
            "/admin/users/{id}",
            delete(|Path(id): Path<String>| async move {
                if id == "a b" {
                    StatusCode::NO_CONTENT
                } else {
                    StatusCode::NOT_FOUND
                }
            }),
        )
        .route(
            "/admin/settings/active-proofread-prompt",
            post(|Json(body): Json<Value>| async move { Json(json!({ "received": body })) }),
        )
        .route(
            "/admin/stats",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database is locked") }),
        )
        .route(
            "/process",
            post(|headers: HeaderMap, mut multipart: Multipart| async move {
                let mut fields = serde_json::Map::new();
                while let Some(field) = multipart.next_field().await.unwrap() {
                    let name = field.name().unwrap_or_default().to_string();
                    let filename = field.file_name().map(str::to_string);
                    let text = String::from_utf8_lossy(&field.bytes().await.unwrap()).to_string();
                    fields.insert(name, json!({ "filename": filename, "text": text }));
                }
                Json(json!({ "fields": fields, "auth": bearer(&headers) }))
            }),
        )
        .route(
            "/download/docx/{id}",
            get(|Path(id): Path<String>| async move { format!("docx-bytes-{}", id) }),
        )
}

async fn client() -> (HttpBackendClient, tokio::sync::oneshot::Sender<()>) {
    let (base_url, shutdown) = serve_app(mock_backend()).await;
    let client = HttpBackendClient::new(&base_url, Duration::from_secs(5)).unwrap();
    (client, shutdown)
}

fn credential() -> Credential {
    Credential::new("backend-tok")
}

#[tokio::test]
async fn given_right_password_when_logging_in_then_grant_is_decoded() {
    let (client, _shutdown) = client().await;

    let grant = client
        .login(&LoginCredentials {
            username: "admin".into(),
            password: "right".into(),
        })
        .await
        .unwrap();

    assert_eq!(grant.access_token, "backend-tok");
    assert!(grant.is_admin);
}

#[tokio::test]
async fn given_wrong_password_when_logging_in_then_msg_field_becomes_rejection_message() {
    let (client, _shutdown) = client().await;

    let outcome = client
        .login(&LoginCredentials {
            username: "admin".into(),
            password: "wrong".into(),
        })
        .await;

    assert_eq!(
        outcome.unwrap_err(),
        BackendError::rejected(401, "Bad username or password")
    );
}

#[tokio::test]
async fn given_credential_when_listing_users_then_bearer_header_is_attached() {
    let (client, _shutdown) = client().await;

    let users = client.list_users(&credential()).await.unwrap();

    assert_eq!(users[0]["auth"], "Bearer backend-tok");
}

#[tokio::test]
async fn given_plain_text_failure_when_forwarding_then_body_text_is_the_message() {
    let (client, _shutdown) = client().await;

    let outcome = client.usage_stats(&credential()).await;

    assert_eq!(
        outcome.unwrap_err(),
        BackendError::rejected(500, "database is locked")
    );
}

#[tokio::test]
async fn given_id_with_space_when_deleting_user_then_segment_is_encoded_and_empty_body_accepted() {
    let (client, _shutdown) = client().await;

    client
        .delete_user(&credential(), &UserId::new("a b"))
        .await
        .unwrap();
    let missing = client.delete_user(&credential(), &UserId::new("zzz")).await;

    assert!(matches!(
        missing,
        Err(BackendError::Rejected { status: 404, .. })
    ));
}

#[tokio::test]
async fn given_numeric_prompt_id_when_activating_then_family_field_carries_integer() {
    let (client, _shutdown) = client().await;

    let echoed = client
        .activate_prompt(&credential(), PromptFamily::Proofread, &PromptId::new("12"))
        .await
        .unwrap();

    assert_eq!(echoed["received"], json!({ "proofread_prompt_id": 12 }));
}

#[tokio::test]
async fn given_upload_with_trim_window_when_submitting_then_multipart_fields_are_forwarded() {
    let (client, _shutdown) = client().await;

    let echoed = client
        .submit_job(
            &credential(),
            JobSubmission {
                source: SubmissionSource::Upload(AudioUpload {
                    filename: "minutes.mp3".into(),
                    content_type: Some("audio/mpeg".into()),
                    data: Bytes::from_static(b"ID3-audio"),
                }),
                start_time: Some("00:00:10".into()),
                end_time: Some("00:10:00".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(echoed["auth"], "Bearer backend-tok");
    assert_eq!(echoed["fields"]["file"]["filename"], "minutes.mp3");
    assert_eq!(echoed["fields"]["file"]["text"], "ID3-audio");
    assert_eq!(echoed["fields"]["start_time"]["text"], "00:00:10");
    assert_eq!(echoed["fields"]["end_time"]["text"], "00:10:00");
    assert!(echoed["fields"].get("drive_link").is_none());
}

#[tokio::test]
async fn given_artifact_locator_when_downloading_then_body_is_streamed_through() {
    let (client, _shutdown) = client().await;
    let locator = ArtifactLocator::ByJob {
        kind: ArtifactKind::WordDocument,
        job_id: PathSegment::parse("42").unwrap(),
    };

    let chunks: Vec<Bytes> = client
        .download(&credential(), &locator)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(chunks.concat(), b"docx-bytes-42".to_vec());
}

#[tokio::test]
async fn given_unreachable_backend_when_forwarding_then_transport_error() {
    let client = HttpBackendClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

    let outcome = client.list_users(&credential()).await;

    assert!(matches!(outcome, Err(BackendError::Transport(_))));
}

#[tokio::test]
async fn given_truncated_delete_body_when_deleting_then_transport_error_is_reported() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 64\r\n\r\n{\"ok\"")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });
    let client =
        HttpBackendClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();

    let outcome = client
        .delete_user(&credential(), &UserId::new("7"))
        .await;

    assert!(matches!(outcome, Err(BackendError::Transport(_))));
}
