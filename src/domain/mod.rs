mod artifact;
mod error_log;
mod identifiers;
mod job;
mod job_status;
mod principal;
mod prompt;
mod timestamp;

pub use artifact::{
    ArtifactKind, ArtifactLocator, InvalidPathSegment, PathSegment, WORD_DOCUMENT_MIME,
};
pub use error_log::{ErrorLogEntry, UsageStats, UserAccount};
pub use identifiers::{ErrorLogId, JobId, PromptId, UserId};
pub use job::{Artifacts, Job, JobRecord, SourceDescriptor};
pub use job_status::JobStatus;
pub use principal::{Credential, Principal, Role};
pub use prompt::{PromptFamily, PromptRecord, VersionedPrompt};
pub use timestamp::parse_timestamp;
