use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::application::ports::{
    ArtifactStream, BackendClient, BackendError, JobSubmission, LoginCredentials, LoginGrant,
    NewPrompt, NewUser, SubmissionSource,
};
use crate::domain::{
    ArtifactKind, ArtifactLocator, Credential, ErrorLogEntry, ErrorLogId, JobId, JobRecord,
    JobStatus, PathSegment, PromptFamily, PromptId, PromptRecord, UsageStats, UserAccount, UserId,
};

pub const SEED_ADMIN_USERNAME: &str = "admin";
pub const SEED_ADMIN_PASSWORD: &str = "admin";

struct StoredUser {
    id: u64,
    username: String,
    password: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

struct StoredJob {
    owner: u64,
    record: JobRecord,
}

struct StoredArtifact {
    job_id: JobId,
    content: Bytes,
}

#[derive(Clone)]
struct Caller {
    id: u64,
    is_admin: bool,
}

#[derive(Default)]
struct BackendState {
    next_id: u64,
    users: Vec<StoredUser>,
    tokens: HashMap<String, u64>,
    prompts: HashMap<PromptFamily, Vec<PromptRecord>>,
    jobs: Vec<StoredJob>,
    error_logs: Vec<ErrorLogEntry>,
    /// Keyed by owner and backend path; two users may share a file name.
    artifacts: HashMap<(u64, String), StoredArtifact>,
}

impl BackendState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn add_user(&mut self, username: &str, password: &str, is_admin: bool) -> u64 {
        let id = self.allocate_id();
        self.users.push(StoredUser {
            id,
            username: username.to_string(),
            password: password.to_string(),
            is_admin,
            created_at: Utc::now(),
        });
        id
    }

    fn caller(&self, credential: &Credential) -> Result<Caller, BackendError> {
        let user = self
            .tokens
            .get(credential.expose())
            .and_then(|id| self.users.iter().find(|u| u.id == *id))
            .ok_or_else(|| BackendError::rejected(401, "Invalid or expired token"))?;
        Ok(Caller {
            id: user.id,
            is_admin: user.is_admin,
        })
    }

    fn admin(&self, credential: &Credential) -> Result<Caller, BackendError> {
        let caller = self.caller(credential)?;
        if !caller.is_admin {
            return Err(BackendError::rejected(403, "Admin access required"));
        }
        Ok(caller)
    }

    fn username(&self, user_id: u64) -> Option<&str> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.as_str())
    }

    fn advance_job(&mut self, job_id: &JobId) -> Option<JobStatus> {
        let index = self.jobs.iter().position(|j| &j.record.id == job_id)?;
        let next = self.jobs[index].record.status.successor()?;

        let job = &mut self.jobs[index];
        job.record.status = next.clone();
        job.record.updated_at = Some(Utc::now());
        let owner = job.owner;

        if next == JobStatus::Completed {
            let username = self.username(owner).unwrap_or("unknown").to_string();
            self.attach_artifacts(index, &username);
        }
        Some(next)
    }

    fn attach_artifacts(&mut self, index: usize, username: &str) {
        let job = &mut self.jobs[index];
        let job_id = job.record.id.clone();
        let stem = artifact_stem(&job.record);
        let txt_name = format!("{}.txt", stem);
        let md_name = format!("{}.md", stem);
        let docx_name = format!("{}.docx", stem);

        job.record.txt_path = Some(format!("{}/{}/{}", username, job_id, txt_name));
        job.record.md_path = Some(format!("{}/{}/{}", username, job_id, md_name));
        job.record.document_path = Some(format!("word/{}", docx_name));
        let owner = job.owner;

        let text = Bytes::from(format!("Transcript of {}\n", stem));
        let markdown = Bytes::from(format!("# {}\n\nTranscript of {}\n", stem, stem));
        let document = Bytes::from_static(b"PK\x03\x04scaffold-docx");

        let mut entries = Vec::new();
        for (kind, content) in [
            (ArtifactKind::PlainText, &text),
            (ArtifactKind::Markdown, &markdown),
            (ArtifactKind::WordDocument, &document),
        ] {
            if let Ok(segment) = PathSegment::parse(job_id.as_str()) {
                entries.push((
                    ArtifactLocator::ByJob {
                        kind,
                        job_id: segment,
                    },
                    content.clone(),
                ));
            }
        }
        if let (Ok(user), Ok(id), Ok(filename)) = (
            PathSegment::parse(username),
            PathSegment::parse(job_id.as_str()),
            PathSegment::parse(&txt_name),
        ) {
            entries.push((
                ArtifactLocator::UserText {
                    user,
                    job_id: id,
                    filename,
                },
                text.clone(),
            ));
        }
        if let (Ok(user), Ok(filename)) =
            (PathSegment::parse(username), PathSegment::parse(&docx_name))
        {
            entries.push((
                ArtifactLocator::Word {
                    filename: filename.clone(),
                },
                document.clone(),
            ));
            entries.push((ArtifactLocator::AdminWord { user, filename }, document.clone()));
        }

        for (locator, content) in entries {
            self.artifacts.insert(
                (owner, locator.backend_path()),
                StoredArtifact {
                    job_id: job_id.clone(),
                    content,
                },
            );
        }
    }

    fn fail_job(&mut self, job_id: &JobId, message: &str) -> bool {
        let Some(job) = self.jobs.iter_mut().find(|j| &j.record.id == job_id) else {
            return false;
        };
        if job.record.status.is_terminal() {
            return false;
        }
        job.record.status = JobStatus::Error;
        job.record.error_message = Some(message.to_string());
        job.record.updated_at = Some(Utc::now());
        let owner = job.owner;

        let id = self.allocate_id();
        self.error_logs.push(ErrorLogEntry {
            id: ErrorLogId::new(id.to_string()),
            owner_id: Some(UserId::new(owner.to_string())),
            job_id: Some(job_id.clone()),
            created_at: Some(Utc::now()),
            message: message.to_string(),
            stack_trace: None,
        });
        true
    }
}

/// Self-contained backend used in scaffold mode and by the tests.
///
/// Holds users, prompts, jobs, the error log and artifact bytes in memory.
/// Starts with one administrator account (`admin`/`admin`). Jobs only move
/// when `advance_job`/`fail_job` is called or when auto progression is on.
pub struct InMemoryBackend {
    state: Arc<Mutex<BackendState>>,
    latency: Duration,
    auto_progress: Option<Duration>,
    calls: AtomicUsize,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        let mut state = BackendState::default();
        state.add_user(SEED_ADMIN_USERNAME, SEED_ADMIN_PASSWORD, true);
        Self {
            state: Arc::new(Mutex::new(state)),
            latency: Duration::ZERO,
            auto_progress: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Delay applied before every backend call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Advance every submitted job one stage per `step` until it completes.
    pub fn with_auto_progress(mut self, step: Duration) -> Self {
        self.auto_progress = Some(step);
        self
    }

    /// Number of backend operations served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Registers an account directly, bypassing the admin API.
    pub fn add_user(&self, username: &str, password: &str, is_admin: bool) -> UserId {
        UserId::new(self.lock().add_user(username, password, is_admin).to_string())
    }

    pub fn job_status(&self, job_id: &JobId) -> Option<JobStatus> {
        self.lock()
            .jobs
            .iter()
            .find(|j| &j.record.id == job_id)
            .map(|j| j.record.status.clone())
    }

    /// Moves a job to its next stage. Returns `None` for unknown or terminal jobs.
    pub fn advance_job(&self, job_id: &JobId) -> Option<JobStatus> {
        self.lock().advance_job(job_id)
    }

    /// Advances a job until it reaches a terminal stage.
    pub fn complete_job(&self, job_id: &JobId) -> Option<JobStatus> {
        let mut state = self.lock();
        let mut last = None;
        while let Some(status) = state.advance_job(job_id) {
            last = Some(status);
        }
        last
    }

    /// Marks a non-terminal job as failed and records an error log entry.
    pub fn fail_job(&self, job_id: &JobId, message: &str) -> bool {
        self.lock().fail_job(job_id, message)
    }

    pub fn spawn_progression(&self, job_id: JobId, step: Duration) -> JoinHandle<()> {
        spawn_progression(Arc::clone(&self.state), job_id, step)
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        lock(&self.state)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn lock(state: &Mutex<BackendState>) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn spawn_progression(
    state: Arc<Mutex<BackendState>>,
    job_id: JobId,
    step: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(step).await;
            let advanced = lock(&state).advance_job(&job_id);
            match advanced {
                Some(status) if status.is_terminal() => break,
                Some(status) => {
                    tracing::debug!(job_id = %job_id, status = %status, "Scaffold job advanced");
                }
                None => break,
            }
        }
    })
}

fn artifact_stem(record: &JobRecord) -> String {
    let raw = record
        .file_name
        .as_deref()
        .and_then(|name| name.rsplit_once('.').map(|(stem, _)| stem).or(Some(name)))
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("transcription_{}", record.id));
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, BackendError> {
    serde_json::to_value(value).map_err(|e| BackendError::MalformedResponse(e.to_string()))
}

fn parse_numeric_id(raw: &str, missing: &str) -> Result<u64, BackendError> {
    raw.parse::<u64>()
        .map_err(|_| BackendError::rejected(404, missing))
}

#[async_trait]
impl BackendClient for InMemoryBackend {
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginGrant, BackendError> {
        self.enter().await;
        let mut state = self.lock();
        let user = state
            .users
            .iter()
            .find(|u| u.username == credentials.username && u.password == credentials.password)
            .map(|u| (u.id, u.is_admin))
            .ok_or_else(|| BackendError::rejected(401, "Bad username or password"))?;

        let token = format!("scaffold-{}", Uuid::new_v4().simple());
        state.tokens.insert(token.clone(), user.0);
        Ok(LoginGrant {
            access_token: token,
            is_admin: user.1,
        })
    }

    async fn list_users(&self, credential: &Credential) -> Result<Value, BackendError> {
        self.enter().await;
        let state = self.lock();
        state.admin(credential)?;
        let accounts: Vec<UserAccount> = state
            .users
            .iter()
            .map(|u| UserAccount {
                id: UserId::new(u.id.to_string()),
                username: u.username.clone(),
                is_admin: u.is_admin,
                created_at: Some(u.created_at),
                transcription_count: state.jobs.iter().filter(|j| j.owner == u.id).count() as u64,
            })
            .collect();
        to_json(&accounts)
    }

    async fn create_user(
        &self,
        credential: &Credential,
        user: &NewUser,
    ) -> Result<Value, BackendError> {
        self.enter().await;
        let mut state = self.lock();
        state.admin(credential)?;
        if user.username.trim().is_empty() || user.password.is_empty() {
            return Err(BackendError::rejected(400, "Username and password are required"));
        }
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(BackendError::rejected(409, "Username already exists"));
        }
        let id = state.add_user(&user.username, &user.password, user.is_admin);
        Ok(json!({ "message": "User created", "id": UserId::new(id.to_string()).to_wire() }))
    }

    async fn delete_user(
        &self,
        credential: &Credential,
        user_id: &UserId,
    ) -> Result<(), BackendError> {
        self.enter().await;
        let mut state = self.lock();
        let caller = state.admin(credential)?;
        let id = parse_numeric_id(user_id.as_str(), "User not found")?;
        if id == caller.id {
            return Err(BackendError::rejected(400, "Cannot delete your own account"));
        }
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(BackendError::rejected(404, "User not found"));
        }
        state.tokens.retain(|_, owner| *owner != id);
        Ok(())
    }

    async fn list_prompts(
        &self,
        credential: &Credential,
        family: PromptFamily,
    ) -> Result<Value, BackendError> {
        self.enter().await;
        let state = self.lock();
        state.admin(credential)?;
        let records = state.prompts.get(&family).cloned().unwrap_or_default();
        to_json(&records)
    }

    async fn create_prompt(
        &self,
        credential: &Credential,
        family: PromptFamily,
        prompt: &NewPrompt,
    ) -> Result<Value, BackendError> {
        self.enter().await;
        let mut state = self.lock();
        state.admin(credential)?;
        if prompt.version.trim().is_empty() || prompt.prompt.trim().is_empty() {
            return Err(BackendError::rejected(400, "Version and prompt are required"));
        }
        let id = PromptId::new(state.allocate_id().to_string());
        state.prompts.entry(family).or_default().push(PromptRecord {
            id: id.clone(),
            version: prompt.version.clone(),
            prompt: prompt.prompt.clone(),
            is_active: false,
            created_at: Some(Utc::now()),
        });
        Ok(json!({ "message": "Prompt created", "id": id.to_wire() }))
    }

    async fn active_prompt(
        &self,
        credential: &Credential,
        family: PromptFamily,
    ) -> Result<Value, BackendError> {
        self.enter().await;
        let state = self.lock();
        state.admin(credential)?;
        match state
            .prompts
            .get(&family)
            .and_then(|records| records.iter().find(|r| r.is_active))
        {
            Some(record) => to_json(record),
            None => Ok(json!({})),
        }
    }

    async fn activate_prompt(
        &self,
        credential: &Credential,
        family: PromptFamily,
        prompt_id: &PromptId,
    ) -> Result<Value, BackendError> {
        self.enter().await;
        let mut state = self.lock();
        state.admin(credential)?;
        let records = state.prompts.entry(family).or_default();
        if !records.iter().any(|r| &r.id == prompt_id) {
            return Err(BackendError::rejected(404, "Prompt not found"));
        }
        for record in records.iter_mut() {
            record.is_active = &record.id == prompt_id;
        }
        Ok(json!({ "message": "Active prompt updated" }))
    }

    async fn list_all_jobs(&self, credential: &Credential) -> Result<Value, BackendError> {
        self.enter().await;
        let state = self.lock();
        state.admin(credential)?;
        let mut listing = Vec::with_capacity(state.jobs.len());
        for job in &state.jobs {
            let mut entry = to_json(&job.record)?;
            if let (Value::Object(fields), Some(username)) = (&mut entry, state.username(job.owner))
            {
                fields.insert("username".to_string(), Value::String(username.to_string()));
            }
            listing.push(entry);
        }
        Ok(Value::Array(listing))
    }

    async fn delete_job(&self, credential: &Credential, job_id: &JobId) -> Result<(), BackendError> {
        self.enter().await;
        let mut state = self.lock();
        state.admin(credential)?;
        let before = state.jobs.len();
        state.jobs.retain(|j| &j.record.id != job_id);
        if state.jobs.len() == before {
            return Err(BackendError::rejected(404, "Transcription not found"));
        }
        state.artifacts.retain(|_, artifact| &artifact.job_id != job_id);
        Ok(())
    }

    async fn usage_stats(&self, credential: &Credential) -> Result<Value, BackendError> {
        self.enter().await;
        let state = self.lock();
        state.admin(credential)?;
        to_json(&UsageStats {
            total_users: state.users.len() as u64,
            total_transcriptions: state.jobs.len() as u64,
            total_errors: state.error_logs.len() as u64,
        })
    }

    async fn error_logs(&self, credential: &Credential) -> Result<Value, BackendError> {
        self.enter().await;
        let state = self.lock();
        state.admin(credential)?;
        let mut entries = state.error_logs.clone();
        entries.reverse();
        to_json(&entries)
    }

    async fn submit_job(
        &self,
        credential: &Credential,
        submission: JobSubmission,
    ) -> Result<Value, BackendError> {
        self.enter().await;
        let job_id = {
            let mut state = self.lock();
            let caller = state.caller(credential)?;
            let job_id = JobId::new(state.allocate_id().to_string());
            let (file_name, drive_link) = match submission.source {
                SubmissionSource::Upload(upload) => (Some(upload.filename), None),
                SubmissionSource::DriveLink(link) => (None, Some(link)),
            };
            let now = Utc::now();
            state.jobs.push(StoredJob {
                owner: caller.id,
                record: JobRecord {
                    id: job_id.clone(),
                    owner_id: Some(UserId::new(caller.id.to_string())),
                    created_at: Some(now),
                    updated_at: Some(now),
                    status: JobStatus::Submitted,
                    file_name,
                    drive_link,
                    txt_path: None,
                    md_path: None,
                    document_path: None,
                    document_link: None,
                    error_message: None,
                },
            });
            job_id
        };

        if let Some(step) = self.auto_progress {
            self.spawn_progression(job_id.clone(), step);
        }
        tracing::debug!(job_id = %job_id, "Scaffold job accepted");
        Ok(json!({ "message": "Transcription started", "transcription_id": job_id.to_wire() }))
    }

    async fn list_own_jobs(&self, credential: &Credential) -> Result<Value, BackendError> {
        self.enter().await;
        let state = self.lock();
        let caller = state.caller(credential)?;
        let records: Vec<&JobRecord> = state
            .jobs
            .iter()
            .filter(|j| j.owner == caller.id)
            .map(|j| &j.record)
            .collect();
        to_json(&records)
    }

    async fn download(
        &self,
        credential: &Credential,
        locator: &ArtifactLocator,
    ) -> Result<ArtifactStream, BackendError> {
        self.enter().await;
        let state = self.lock();
        let caller = if locator.requires_admin() {
            state.admin(credential)?
        } else {
            state.caller(credential)?
        };
        let path = locator.backend_path();
        let artifact = state
            .artifacts
            .get(&(caller.id, path.clone()))
            .or_else(|| {
                if !caller.is_admin {
                    return None;
                }
                state
                    .artifacts
                    .iter()
                    .find(|((_, key), _)| key == &path)
                    .map(|(_, artifact)| artifact)
            })
            .ok_or_else(|| BackendError::rejected(404, "File not found"))?;

        let content = artifact.content.clone();
        Ok(stream::once(async move { Ok(content) }).boxed())
    }
}
