mod backend_client;
mod backend_error;
mod job_snapshot_source;
mod session_token_codec;

pub use backend_client::{
    ArtifactStream, AudioUpload, BackendClient, JobSubmission, LoginCredentials, LoginGrant,
    NewPrompt, NewUser, SubmissionSource,
};
pub use backend_error::BackendError;
pub use job_snapshot_source::{ClientError, JobSnapshotSource};
pub use session_token_codec::{SealedSession, SessionTokenCodec, SessionTokenError};
