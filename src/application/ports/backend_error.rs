#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("backend rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
}

impl BackendError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}
