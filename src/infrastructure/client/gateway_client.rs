use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url, multipart};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::application::ports::{ClientError, JobSnapshotSource};
use crate::domain::{ArtifactKind, Job, JobId, JobRecord};

use super::response_interceptor::{ResponseContext, ResponseInterceptor};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    user: SessionUser,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Artifact bytes plus the content type the gateway declared.
#[derive(Debug, Clone)]
pub struct DownloadedArtifact {
    pub content_type: Option<String>,
    pub content: Bytes,
}

/// A new job as the client submits it.
#[derive(Debug, Clone)]
pub enum ClientSubmission {
    Upload {
        filename: String,
        content_type: Option<String>,
        data: Bytes,
    },
    DriveLink(String),
}

/// HTTP client for the gateway's `/api` surface.
///
/// Holds the session token issued at login and attaches it as a bearer
/// token. Every response runs through the registered interceptors before
/// it is interpreted.
pub struct GatewayClient {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
    interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(ClientError::Transport("gateway base url is required".to_string()));
        }
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: trimmed.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
            interceptors: Vec::new(),
        })
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn has_session(&self) -> bool {
        self.current_token().is_some()
    }

    /// Adopts a token obtained elsewhere, e.g. restored from disk.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<SessionUser, ClientError> {
        let request = self
            .http
            .post(self.endpoint("/api/auth/login"))
            .json(&LoginRequest { username, password });
        let response = self.execute(Method::POST, "/api/auth/login", request, false).await?;
        let login: LoginResponse = decode(response).await?;

        self.set_token(Some(login.token));
        tracing::info!(user = %login.user.id, is_admin = login.user.is_admin, "Logged in to gateway");
        Ok(login.user)
    }

    /// Ends the session locally; the server side is stateless.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let path = "/api/auth/logout";
        let request = self.authorized(Method::POST, path);
        let outcome = self.execute(Method::POST, path, request, true).await;
        self.set_token(None);
        outcome.map(|_| ())
    }

    pub async fn session(&self) -> Result<SessionUser, ClientError> {
        let path = "/api/auth/session";
        let response = self
            .execute(Method::GET, path, self.authorized(Method::GET, path), true)
            .await?;
        decode(response).await
    }

    pub async fn submit_job(&self, submission: ClientSubmission) -> Result<Value, ClientError> {
        let form = match submission {
            ClientSubmission::Upload {
                filename,
                content_type,
                data,
            } => {
                let mut part = multipart::Part::bytes(data.to_vec()).file_name(filename);
                if let Some(content_type) = content_type.as_deref() {
                    part = part
                        .mime_str(content_type)
                        .map_err(|e| ClientError::Transport(format!("mime: {}", e)))?;
                }
                multipart::Form::new().part("file", part)
            }
            ClientSubmission::DriveLink(link) => multipart::Form::new().text("drive_link", link),
        };

        let path = "/api/process";
        let request = self.authorized(Method::POST, path).multipart(form);
        let response = self.execute(Method::POST, path, request, true).await?;
        decode(response).await
    }

    pub async fn list_jobs(&self) -> Result<Vec<Job>, ClientError> {
        let path = "/api/transcriptions";
        let response = self
            .execute(Method::GET, path, self.authorized(Method::GET, path), true)
            .await?;
        let body: Value = decode(response).await?;

        let listing = match body {
            Value::Object(mut fields) => fields.remove("transcriptions").unwrap_or(Value::Null),
            other => other,
        };
        if listing.is_null() {
            return Ok(Vec::new());
        }
        let records: Vec<JobRecord> =
            serde_json::from_value(listing).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(records.into_iter().map(Job::from_record).collect())
    }

    pub async fn download(&self, kind: ArtifactKind, job_id: &JobId) -> Result<Bytes, ClientError> {
        let artifact = self
            .fetch_artifact(&["api", "download", kind.file_type(), job_id.as_str()])
            .await?;
        Ok(artifact.content)
    }

    /// Downloads an artifact by the relative path a job snapshot carries,
    /// e.g. `word/interview.docx`.
    pub async fn download_path(&self, artifact_path: &str) -> Result<DownloadedArtifact, ClientError> {
        let mut segments = vec!["api", "download"];
        segments.extend(artifact_path.split('/').filter(|s| !s.is_empty()));
        self.fetch_artifact(&segments).await
    }

    async fn fetch_artifact(&self, segments: &[&str]) -> Result<DownloadedArtifact, ClientError> {
        let url = self.segment_url(segments)?;
        let path = url.path().to_string();
        let request = self.with_token(self.http.get(url));
        let response = self.execute(Method::GET, &path, request, true).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(format!("download body: {}", e)))?;
        Ok(DownloadedArtifact {
            content_type,
            content,
        })
    }

    /// Joins percent-encoded path segments onto the base url.
    fn segment_url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Transport(format!("invalid gateway url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Transport("gateway url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn authorized(&self, method: Method, path: &str) -> RequestBuilder {
        self.with_token(self.http.request(method, self.endpoint(path)))
    }

    fn with_token(&self, request: RequestBuilder) -> RequestBuilder {
        match self.current_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<Response, ClientError> {
        let carried_token = authenticated && self.has_session();
        let response = request
            .header("x-request-id", format!("req_{}", Uuid::new_v4().simple()))
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let context = ResponseContext {
            method,
            path: path.to_string(),
            status: response.status(),
            authenticated: carried_token,
        };
        for interceptor in &self.interceptors {
            interceptor.on_response(&context);
        }

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED && authenticated {
            self.set_token(None);
            return Err(ClientError::SessionExpired);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| String::from_utf8_lossy(&body).trim().to_string());
        Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| ClientError::Transport(format!("body: {}", e)))?;
    serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

#[async_trait]
impl JobSnapshotSource for GatewayClient {
    async fn fetch_jobs(&self) -> Result<Vec<Job>, ClientError> {
        if !self.has_session() {
            return Err(ClientError::SessionExpired);
        }
        self.list_jobs().await
    }
}
