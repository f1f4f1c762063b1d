use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{StreamExt, TryStreamExt};
use reqwest::header::{CONNECTION, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, Url, multipart};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::application::ports::{
    ArtifactStream, BackendClient, BackendError, JobSubmission, LoginCredentials, LoginGrant,
    NewPrompt, NewUser, SubmissionSource,
};
use crate::domain::{ArtifactLocator, Credential, JobId, PromptFamily, PromptId, UserId};
use crate::infrastructure::observability::redact_credentials;

const TCP_KEEPALIVE: Duration = Duration::from_secs(60);

/// Backend adapter over HTTP.
///
/// Job submission goes through a second client without an overall timeout:
/// an upload of a long recording can legitimately take longer than any
/// sensible API timeout.
pub struct HttpBackendClient {
    client: Client,
    submission_client: Client,
    base_url: Url,
}

impl HttpBackendClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, BackendError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| BackendError::Transport(format!("invalid backend url: {}", e)))?;

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("client: {}", e)))?;

        let mut keep_alive = HeaderMap::new();
        keep_alive.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        let submission_client = Client::builder()
            .tcp_keepalive(TCP_KEEPALIVE)
            .default_headers(keep_alive)
            .build()
            .map_err(|e| BackendError::Transport(format!("submission client: {}", e)))?;

        Ok(Self {
            client,
            submission_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Transport("backend url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn endpoint_for_path(&self, path: &str) -> Result<Url, BackendError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.endpoint(&segments)
    }

    fn authorized(&self, method: Method, url: Url, credential: &Credential) -> RequestBuilder {
        self.client.request(method, url).bearer_auth(credential.expose())
    }

    async fn get_json(&self, credential: &Credential, path: &str) -> Result<Value, BackendError> {
        let url = self.endpoint_for_path(path)?;
        let response = send(self.authorized(Method::GET, url, credential)).await?;
        read_json(response).await
    }

    async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        credential: &Credential,
        path: &str,
        body: &B,
    ) -> Result<Value, BackendError> {
        let url = self.endpoint_for_path(path)?;
        let response = send(self.authorized(Method::POST, url, credential).json(body)).await?;
        read_json(response).await
    }

    async fn delete(&self, credential: &Credential, segments: &[&str]) -> Result<(), BackendError> {
        let url = self.endpoint(segments)?;
        let response = send(self.authorized(Method::DELETE, url, credential)).await?;
        // Some backend deletes answer 204 or 200 with an empty body.
        response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(format!("delete body: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginGrant, BackendError> {
        let url = self.endpoint(&["login"])?;
        tracing::debug!(username = %credentials.username, "Forwarding login");
        let response = send(self.client.post(url).json(credentials)).await?;
        read_typed(response).await
    }

    async fn list_users(&self, credential: &Credential) -> Result<Value, BackendError> {
        self.get_json(credential, "/admin/users").await
    }

    async fn create_user(
        &self,
        credential: &Credential,
        user: &NewUser,
    ) -> Result<Value, BackendError> {
        self.post_json(credential, "/admin/users", user).await
    }

    async fn delete_user(
        &self,
        credential: &Credential,
        user_id: &UserId,
    ) -> Result<(), BackendError> {
        self.delete(credential, &["admin", "users", user_id.as_str()])
            .await
    }

    async fn list_prompts(
        &self,
        credential: &Credential,
        family: PromptFamily,
    ) -> Result<Value, BackendError> {
        self.get_json(credential, &family.collection_path()).await
    }

    async fn create_prompt(
        &self,
        credential: &Credential,
        family: PromptFamily,
        prompt: &NewPrompt,
    ) -> Result<Value, BackendError> {
        self.post_json(credential, &family.collection_path(), prompt)
            .await
    }

    async fn active_prompt(
        &self,
        credential: &Credential,
        family: PromptFamily,
    ) -> Result<Value, BackendError> {
        self.get_json(credential, &family.active_setting_path()).await
    }

    async fn activate_prompt(
        &self,
        credential: &Credential,
        family: PromptFamily,
        prompt_id: &PromptId,
    ) -> Result<Value, BackendError> {
        let mut body = serde_json::Map::new();
        body.insert(family.id_field(), prompt_id.to_wire());
        self.post_json(credential, &family.active_setting_path(), &Value::Object(body))
            .await
    }

    async fn list_all_jobs(&self, credential: &Credential) -> Result<Value, BackendError> {
        self.get_json(credential, "/admin/transcriptions").await
    }

    async fn delete_job(&self, credential: &Credential, job_id: &JobId) -> Result<(), BackendError> {
        self.delete(credential, &["admin", "transcriptions", job_id.as_str()])
            .await
    }

    async fn usage_stats(&self, credential: &Credential) -> Result<Value, BackendError> {
        self.get_json(credential, "/admin/stats").await
    }

    async fn error_logs(&self, credential: &Credential) -> Result<Value, BackendError> {
        self.get_json(credential, "/admin/logs").await
    }

    #[tracing::instrument(skip(self, credential, submission))]
    async fn submit_job(
        &self,
        credential: &Credential,
        submission: JobSubmission,
    ) -> Result<Value, BackendError> {
        let mut form = multipart::Form::new();
        match submission.source {
            SubmissionSource::Upload(upload) => {
                tracing::info!(
                    filename = %upload.filename,
                    bytes = upload.data.len(),
                    "Forwarding uploaded recording"
                );
                let mut part = multipart::Part::bytes(upload.data.to_vec()).file_name(upload.filename);
                if let Some(content_type) = upload.content_type.as_deref() {
                    part = part
                        .mime_str(content_type)
                        .map_err(|e| BackendError::Transport(format!("mime: {}", e)))?;
                }
                form = form.part("file", part);
            }
            SubmissionSource::DriveLink(link) => {
                tracing::info!("Forwarding external recording link");
                form = form.text("drive_link", link);
            }
        }
        if let Some(start_time) = submission.start_time {
            form = form.text("start_time", start_time);
        }
        if let Some(end_time) = submission.end_time {
            form = form.text("end_time", end_time);
        }

        let url = self.endpoint(&["process"])?;
        let request = self
            .submission_client
            .post(url)
            .bearer_auth(credential.expose())
            .multipart(form);
        let response = send(request).await?;
        read_json(response).await
    }

    async fn list_own_jobs(&self, credential: &Credential) -> Result<Value, BackendError> {
        self.get_json(credential, "/transcriptions").await
    }

    async fn download(
        &self,
        credential: &Credential,
        locator: &ArtifactLocator,
    ) -> Result<ArtifactStream, BackendError> {
        let url = self.endpoint_for_path(&locator.backend_path())?;
        let response = send(self.authorized(Method::GET, url, credential)).await?;
        let stream = response
            .bytes_stream()
            .map_err(|e| BackendError::Transport(format!("download interrupted: {}", e)));
        Ok(stream.boxed())
    }
}

/// Sends the request and turns any non-2xx answer into `BackendError::Rejected`.
async fn send(request: RequestBuilder) -> Result<Response, BackendError> {
    let response = request
        .send()
        .await
        .map_err(|e| BackendError::Transport(redact_credentials(&describe_transport_error(&e))))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = rejection_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
    tracing::warn!(
        status = status.as_u16(),
        message = %redact_credentials(&message),
        "Backend rejected request"
    );
    Err(BackendError::rejected(status.as_u16(), message))
}

async fn read_json(response: Response) -> Result<Value, BackendError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| BackendError::Transport(format!("body: {}", e)))?;
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&body).map_err(|e| BackendError::MalformedResponse(e.to_string()))
}

async fn read_typed<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| BackendError::Transport(format!("body: {}", e)))?;
    serde_json::from_slice(&body).map_err(|e| BackendError::MalformedResponse(e.to_string()))
}

/// Picks the human-readable message out of a backend error body.
fn rejection_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["error", "msg", "message", "detail"] {
            match fields.get(key) {
                Some(Value::String(text)) if !text.is_empty() => return Some(text.clone()),
                Some(other) if !other.is_null() => return Some(other.to_string()),
                _ => {}
            }
        }
        return None;
    }
    Some(trimmed.to_string())
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.to_string()
    }
}
