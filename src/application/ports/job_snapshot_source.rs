use async_trait::async_trait;

use crate::domain::Job;

/// Supplies the complete current job collection for one principal.
#[async_trait]
pub trait JobSnapshotSource: Send + Sync {
    async fn fetch_jobs(&self) -> Result<Vec<Job>, ClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("session expired or missing")]
    SessionExpired,
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}
