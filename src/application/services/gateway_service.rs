use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::ports::{
    ArtifactStream, AudioUpload, BackendClient, JobSubmission, LoginCredentials, NewUser,
    SealedSession, SessionTokenCodec, SubmissionSource,
};
use crate::domain::{
    ArtifactKind, ArtifactLocator, Credential, JobId, PathSegment, Principal, PromptFamily,
    PromptId, Role, UserId,
};

use super::{AccessRequirement, ActiveResourceSelector, GatewayError, TokenResolution};

#[derive(Debug, Default, Deserialize)]
pub struct LoginInput {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserInput {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default, rename = "isAdmin", alias = "is_admin")]
    pub is_admin: Option<bool>,
}

#[derive(Debug, Default)]
pub struct SubmissionInput {
    pub file: Option<AudioUpload>,
    pub drive_link: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Raw path components of a download route, validated after authorization.
#[derive(Debug, Clone)]
pub enum DownloadTarget {
    ByJob {
        file_type: String,
        job_id: String,
    },
    UserText {
        user: String,
        job_id: String,
        filename: String,
    },
    Word {
        filename: String,
    },
    AdminWord {
        user: String,
        filename: String,
    },
}

impl DownloadTarget {
    fn requirement(&self) -> AccessRequirement {
        match self {
            Self::AdminWord { .. } => AccessRequirement::Admin,
            _ => AccessRequirement::AnyPrincipal,
        }
    }

    fn into_locator(self) -> Result<ArtifactLocator, GatewayError> {
        let segment = |raw: &str| {
            PathSegment::parse(raw).map_err(|e| GatewayError::BadRequest(e.to_string()))
        };

        let locator = match self {
            Self::ByJob { file_type, job_id } => ArtifactLocator::ByJob {
                kind: ArtifactKind::from_file_type(&file_type).ok_or_else(|| {
                    GatewayError::BadRequest(format!("Unsupported file type: {}", file_type))
                })?,
                job_id: segment(&job_id)?,
            },
            Self::UserText {
                user,
                job_id,
                filename,
            } => ArtifactLocator::UserText {
                user: segment(&user)?,
                job_id: segment(&job_id)?,
                filename: segment(&filename)?,
            },
            Self::Word { filename } => ArtifactLocator::Word {
                filename: segment(&filename)?,
            },
            Self::AdminWord { user, filename } => ArtifactLocator::AdminWord {
                user: segment(&user)?,
                filename: segment(&filename)?,
            },
        };
        Ok(locator)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Acknowledgement {
    pub message: String,
}

impl Acknowledgement {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub struct ArtifactDownload {
    pub kind: ArtifactKind,
    pub content_disposition: String,
    pub stream: ArtifactStream,
}

/// Authorizes, validates and forwards every gateway operation.
///
/// Holds no mutable state; all durable state belongs to the backend.
pub struct GatewayService {
    backend: Arc<dyn BackendClient>,
    sessions: Arc<dyn SessionTokenCodec>,
    prompts: ActiveResourceSelector,
}

impl GatewayService {
    pub fn new(backend: Arc<dyn BackendClient>, sessions: Arc<dyn SessionTokenCodec>) -> Self {
        Self {
            prompts: ActiveResourceSelector::new(Arc::clone(&backend)),
            backend,
            sessions,
        }
    }

    pub fn resolve(&self, raw_token: Option<&str>) -> TokenResolution {
        TokenResolution::resolve(self.sessions.as_ref(), raw_token)
    }

    pub fn prompts(&self) -> &ActiveResourceSelector {
        &self.prompts
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn login(&self, input: LoginInput) -> Result<(Principal, SealedSession), GatewayError> {
        let username = required(input.username);
        let password = input.password.filter(|p| !p.is_empty());
        let (Some(username), Some(password)) = (username, password) else {
            return Err(GatewayError::bad_request("Username and password are required"));
        };

        let grant = self
            .backend
            .login(&LoginCredentials {
                username: username.clone(),
                password,
            })
            .await?;

        let principal = Principal::new(
            username,
            Role::from_admin_flag(grant.is_admin),
            Credential::new(grant.access_token),
        );
        let session = self.sessions.seal(&principal)?;

        tracing::info!(principal = %principal.id, role = %principal.role, "Session issued");
        Ok((principal, session))
    }

    pub async fn list_users(&self, resolution: &TokenResolution) -> Result<Value, GatewayError> {
        let principal = AccessRequirement::Admin.authorize(resolution)?;
        Ok(self.backend.list_users(&principal.credential).await?)
    }

    #[tracing::instrument(skip(self, resolution, input))]
    pub async fn create_user(
        &self,
        resolution: &TokenResolution,
        input: CreateUserInput,
    ) -> Result<Acknowledgement, GatewayError> {
        let principal = AccessRequirement::Admin.authorize(resolution)?;
        let username = required(input.username);
        let password = input.password.filter(|p| !p.is_empty());
        let (Some(username), Some(password)) = (username, password) else {
            return Err(GatewayError::bad_request("Username and password are required"));
        };

        let user = NewUser {
            username,
            password,
            is_admin: input.is_admin.unwrap_or(false),
        };
        self.backend
            .create_user(&principal.credential, &user)
            .await?;

        tracing::info!(username = %user.username, is_admin = user.is_admin, "User created");
        Ok(Acknowledgement::new("User created successfully"))
    }

    #[tracing::instrument(skip(self, resolution))]
    pub async fn delete_user(
        &self,
        resolution: &TokenResolution,
        user_id: Option<String>,
    ) -> Result<Acknowledgement, GatewayError> {
        let principal = AccessRequirement::Admin.authorize(resolution)?;
        let user_id = required_segment(user_id, "User ID is required")?;

        self.backend
            .delete_user(&principal.credential, &UserId::new(user_id.as_str()))
            .await?;

        tracing::info!(user_id = %user_id, "User deleted");
        Ok(Acknowledgement::new("User deleted successfully"))
    }

    pub async fn list_prompts(
        &self,
        resolution: &TokenResolution,
        family: PromptFamily,
    ) -> Result<Value, GatewayError> {
        let principal = AccessRequirement::Admin.authorize(resolution)?;
        self.prompts.list_all(&principal.credential, family).await
    }

    #[tracing::instrument(skip(self, resolution, version, prompt))]
    pub async fn create_prompt(
        &self,
        resolution: &TokenResolution,
        family: PromptFamily,
        version: Option<String>,
        prompt: Option<String>,
    ) -> Result<Acknowledgement, GatewayError> {
        let principal = AccessRequirement::Admin.authorize(resolution)?;
        self.prompts
            .create(&principal.credential, family, version, prompt)
            .await?;
        Ok(Acknowledgement::new(format!(
            "{} prompt created successfully",
            family.display_name()
        )))
    }

    pub async fn active_prompt(
        &self,
        resolution: &TokenResolution,
        family: PromptFamily,
    ) -> Result<Value, GatewayError> {
        let principal = AccessRequirement::Admin.authorize(resolution)?;
        self.prompts.get_active(&principal.credential, family).await
    }

    #[tracing::instrument(skip(self, resolution))]
    pub async fn set_active_prompt(
        &self,
        resolution: &TokenResolution,
        family: PromptFamily,
        prompt_id: Option<PromptId>,
    ) -> Result<Acknowledgement, GatewayError> {
        let principal = AccessRequirement::Admin.authorize(resolution)?;
        let prompt_id = prompt_id
            .filter(|id| !id.as_str().trim().is_empty())
            .ok_or_else(|| {
                GatewayError::BadRequest(format!(
                    "{} prompt id is required",
                    family.display_name()
                ))
            })?;

        self.prompts
            .set_active(&principal.credential, family, &prompt_id)
            .await?;
        Ok(Acknowledgement::new(format!(
            "{} prompt activated successfully",
            family.display_name()
        )))
    }

    pub async fn list_all_jobs(&self, resolution: &TokenResolution) -> Result<Value, GatewayError> {
        let principal = AccessRequirement::Admin.authorize(resolution)?;
        Ok(self.backend.list_all_jobs(&principal.credential).await?)
    }

    #[tracing::instrument(skip(self, resolution))]
    pub async fn delete_job(
        &self,
        resolution: &TokenResolution,
        job_id: Option<String>,
    ) -> Result<Acknowledgement, GatewayError> {
        let principal = AccessRequirement::Admin.authorize(resolution)?;
        let job_id = required_segment(job_id, "Transcription ID is required")?;

        self.backend
            .delete_job(&principal.credential, &JobId::new(job_id.as_str()))
            .await?;

        tracing::info!(job_id = %job_id, "Transcription deleted");
        Ok(Acknowledgement::new("Transcription deleted successfully"))
    }

    pub async fn usage_stats(&self, resolution: &TokenResolution) -> Result<Value, GatewayError> {
        let principal = AccessRequirement::Admin.authorize(resolution)?;
        Ok(self.backend.usage_stats(&principal.credential).await?)
    }

    pub async fn error_logs(&self, resolution: &TokenResolution) -> Result<Value, GatewayError> {
        let principal = AccessRequirement::Admin.authorize(resolution)?;
        Ok(self.backend.error_logs(&principal.credential).await?)
    }

    #[tracing::instrument(skip(self, resolution, input))]
    pub async fn submit_job(
        &self,
        resolution: &TokenResolution,
        input: SubmissionInput,
    ) -> Result<Value, GatewayError> {
        let principal = AccessRequirement::AnyPrincipal.authorize(resolution)?;
        let drive_link = required(input.drive_link);

        let source = match (input.file, drive_link) {
            (Some(_), Some(_)) => {
                return Err(GatewayError::bad_request(
                    "Provide either file or drive_link, not both",
                ));
            }
            (None, None) => {
                return Err(GatewayError::bad_request("Either file or drive_link is required"));
            }
            (Some(upload), None) if upload.data.is_empty() => {
                return Err(GatewayError::bad_request("Uploaded file is empty"));
            }
            (Some(upload), None) => SubmissionSource::Upload(upload),
            (None, Some(link)) => {
                let url = reqwest::Url::parse(&link)
                    .map_err(|_| GatewayError::bad_request("drive_link must be a valid URL"))?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(GatewayError::bad_request(
                        "drive_link must be an http or https URL",
                    ));
                }
                SubmissionSource::DriveLink(link)
            }
        };

        let submission = JobSubmission {
            source,
            start_time: required(input.start_time),
            end_time: required(input.end_time),
        };

        let accepted = self
            .backend
            .submit_job(&principal.credential, submission)
            .await?;
        tracing::info!(principal = %principal.id, "Transcription job submitted");
        Ok(accepted)
    }

    pub async fn list_own_jobs(&self, resolution: &TokenResolution) -> Result<Value, GatewayError> {
        let principal = AccessRequirement::AnyPrincipal.authorize(resolution)?;
        Ok(self.backend.list_own_jobs(&principal.credential).await?)
    }

    #[tracing::instrument(skip(self, resolution))]
    pub async fn download(
        &self,
        resolution: &TokenResolution,
        target: DownloadTarget,
    ) -> Result<ArtifactDownload, GatewayError> {
        let principal = target.requirement().authorize(resolution)?;
        let locator = target.into_locator()?;

        let stream = self
            .backend
            .download(&principal.credential, &locator)
            .await?;

        tracing::debug!(path = %locator.backend_path(), "Streaming artifact");
        Ok(ArtifactDownload {
            kind: locator.kind(),
            content_disposition: locator.content_disposition(),
            stream,
        })
    }
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_segment(value: Option<String>, missing: &str) -> Result<PathSegment, GatewayError> {
    let value = required(value).ok_or_else(|| GatewayError::bad_request(missing))?;
    PathSegment::parse(&value).map_err(|e| GatewayError::BadRequest(e.to_string()))
}
