use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ArtifactLocator, Credential, JobId, PromptFamily, PromptId, UserId};

use super::BackendError;

pub type ArtifactStream = BoxStream<'static, Result<Bytes, BackendError>>;

#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginGrant {
    pub access_token: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPrompt {
    pub version: String,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub enum SubmissionSource {
    Upload(AudioUpload),
    DriveLink(String),
}

#[derive(Debug, Clone)]
pub struct JobSubmission {
    pub source: SubmissionSource,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// The processing backend behind `BACKEND_URL`.
///
/// Every call except `login` carries the principal's credential. JSON payloads
/// the gateway only relays are returned untouched as `Value`.
#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginGrant, BackendError>;

    async fn list_users(&self, credential: &Credential) -> Result<Value, BackendError>;

    async fn create_user(&self, credential: &Credential, user: &NewUser)
    -> Result<Value, BackendError>;

    async fn delete_user(&self, credential: &Credential, user_id: &UserId)
    -> Result<(), BackendError>;

    async fn list_prompts(
        &self,
        credential: &Credential,
        family: PromptFamily,
    ) -> Result<Value, BackendError>;

    async fn create_prompt(
        &self,
        credential: &Credential,
        family: PromptFamily,
        prompt: &NewPrompt,
    ) -> Result<Value, BackendError>;

    async fn active_prompt(
        &self,
        credential: &Credential,
        family: PromptFamily,
    ) -> Result<Value, BackendError>;

    async fn activate_prompt(
        &self,
        credential: &Credential,
        family: PromptFamily,
        prompt_id: &PromptId,
    ) -> Result<Value, BackendError>;

    async fn list_all_jobs(&self, credential: &Credential) -> Result<Value, BackendError>;

    async fn delete_job(&self, credential: &Credential, job_id: &JobId)
    -> Result<(), BackendError>;

    async fn usage_stats(&self, credential: &Credential) -> Result<Value, BackendError>;

    async fn error_logs(&self, credential: &Credential) -> Result<Value, BackendError>;

    async fn submit_job(
        &self,
        credential: &Credential,
        submission: JobSubmission,
    ) -> Result<Value, BackendError>;

    async fn list_own_jobs(&self, credential: &Credential) -> Result<Value, BackendError>;

    async fn download(
        &self,
        credential: &Credential,
        locator: &ArtifactLocator,
    ) -> Result<ArtifactStream, BackendError>;
}
