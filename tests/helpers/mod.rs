#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use scribe_gateway::application::ports::{
    ArtifactStream, BackendClient, BackendError, ClientError, JobSnapshotSource, JobSubmission,
    LoginCredentials, LoginGrant, NewPrompt, NewUser,
};
use scribe_gateway::application::ports::SessionTokenCodec;
use scribe_gateway::application::services::GatewayService;
use scribe_gateway::domain::{
    ArtifactLocator, Credential, Job, JobId, JobRecord, JobStatus, Principal, PromptFamily,
    PromptId, Role, UserId,
};
use scribe_gateway::infrastructure::auth::SealedSessionCodec;
use scribe_gateway::infrastructure::backend::InMemoryBackend;
use scribe_gateway::presentation::config::SessionSettings;
use scribe_gateway::presentation::{AppState, create_router};

pub const TEST_SECRET: &str = "test-session-secret";

pub fn test_codec() -> Arc<SealedSessionCodec> {
    Arc::new(SealedSessionCodec::new(TEST_SECRET, chrono::Duration::minutes(30)).unwrap())
}

/// Session token for a principal the backend has never seen.
pub fn sealed_token(id: &str, role: Role) -> String {
    let principal = Principal::new(id, role, Credential::new(format!("backend-{}", id)));
    test_codec().seal(&principal).unwrap().token
}

pub fn session_settings() -> SessionSettings {
    SessionSettings {
        secret: TEST_SECRET.to_string(),
        ttl_minutes: 30,
        cookie_name: "scribe_session".to_string(),
        secure_cookie: false,
    }
}

pub fn app_with_backend(backend: Arc<dyn BackendClient>) -> Router {
    let gateway = Arc::new(GatewayService::new(backend, test_codec()));
    create_router(AppState::new(gateway, session_settings()))
}

/// Router over a fresh in-memory backend, plus the backend for inspection.
pub fn scaffold_app() -> (Router, Arc<InMemoryBackend>) {
    let backend = Arc::new(InMemoryBackend::new());
    (app_with_backend(backend.clone()), backend)
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Serves `app` on an ephemeral local port until the returned sender fires or drops.
pub async fn serve_app(app: Router) -> (String, tokio::sync::oneshot::Sender<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });
    (format!("http://{}", addr), shutdown_tx)
}

/// Logs in through the router and returns the gateway session token.
pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "username": username, "password": password }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

pub fn record(id: &str, status: JobStatus) -> JobRecord {
    JobRecord {
        id: JobId::new(id),
        owner_id: Some(UserId::new("1")),
        created_at: None,
        updated_at: None,
        status,
        file_name: Some("meeting.mp3".to_string()),
        drive_link: None,
        txt_path: None,
        md_path: None,
        document_path: None,
        document_link: None,
        error_message: None,
    }
}

pub fn job(id: &str, status: JobStatus) -> Job {
    Job::from_record(record(id, status))
}

/// Snapshot source that replays a script of results, then repeats the last one.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Vec<Job>, ClientError>>>,
    last: Mutex<Option<Vec<Job>>>,
    calls: Mutex<usize>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Vec<Job>, ClientError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl JobSnapshotSource for ScriptedSource {
    async fn fetch_jobs(&self) -> Result<Vec<Job>, ClientError> {
        *self.calls.lock().unwrap() += 1;
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(jobs)) => {
                *self.last.lock().unwrap() = Some(jobs.clone());
                Ok(jobs)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.lock().unwrap().clone().unwrap_or_default()),
        }
    }
}

/// Backend that fails every call with the same error and counts calls.
pub struct FailingBackend {
    error: BackendError,
    calls: Mutex<usize>,
}

impl FailingBackend {
    pub fn new(error: BackendError) -> Self {
        Self {
            error,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn fail<T>(&self) -> Result<T, BackendError> {
        *self.calls.lock().unwrap() += 1;
        Err(self.error.clone())
    }
}

#[async_trait]
impl BackendClient for FailingBackend {
    async fn login(&self, _: &LoginCredentials) -> Result<LoginGrant, BackendError> {
        self.fail()
    }
    async fn list_users(&self, _: &Credential) -> Result<Value, BackendError> {
        self.fail()
    }
    async fn create_user(&self, _: &Credential, _: &NewUser) -> Result<Value, BackendError> {
        self.fail()
    }
    async fn delete_user(&self, _: &Credential, _: &UserId) -> Result<(), BackendError> {
        self.fail()
    }
    async fn list_prompts(&self, _: &Credential, _: PromptFamily) -> Result<Value, BackendError> {
        self.fail()
    }
    async fn create_prompt(
        &self,
        _: &Credential,
        _: PromptFamily,
        _: &NewPrompt,
    ) -> Result<Value, BackendError> {
        self.fail()
    }
    async fn active_prompt(&self, _: &Credential, _: PromptFamily) -> Result<Value, BackendError> {
        self.fail()
    }
    async fn activate_prompt(
        &self,
        _: &Credential,
        _: PromptFamily,
        _: &PromptId,
    ) -> Result<Value, BackendError> {
        self.fail()
    }
    async fn list_all_jobs(&self, _: &Credential) -> Result<Value, BackendError> {
        self.fail()
    }
    async fn delete_job(&self, _: &Credential, _: &JobId) -> Result<(), BackendError> {
        self.fail()
    }
    async fn usage_stats(&self, _: &Credential) -> Result<Value, BackendError> {
        self.fail()
    }
    async fn error_logs(&self, _: &Credential) -> Result<Value, BackendError> {
        self.fail()
    }
    async fn submit_job(&self, _: &Credential, _: JobSubmission) -> Result<Value, BackendError> {
        self.fail()
    }
    async fn list_own_jobs(&self, _: &Credential) -> Result<Value, BackendError> {
        self.fail()
    }
    async fn download(
        &self,
        _: &Credential,
        _: &ArtifactLocator,
    ) -> Result<ArtifactStream, BackendError> {
        self.fail()
    }
}
