use crate::application::ports::{BackendError, SessionTokenError};

/// Outcome of a single gateway call that did not succeed.
///
/// This is a property of the request, unrelated to a job's own `error` status.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Not authorized")]
    Forbidden,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    BackendRejected { status: u16, message: String },
    #[error("backend transport failure: {0}")]
    Transport(String),
    #[error("internal gateway failure: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::Forbidden => 403,
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::BackendRejected { status, .. } if (400..=599).contains(status) => *status,
            Self::BackendRejected { .. } | Self::Transport(_) => 502,
            Self::Internal(_) => 500,
        }
    }

    /// Message safe to hand to the caller. Transport and internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Transport(_) => "Backend service unavailable".to_string(),
            Self::Internal(_) => "An unexpected error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<BackendError> for GatewayError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::Rejected { status, message } => Self::BackendRejected { status, message },
            BackendError::Transport(detail) => Self::Transport(detail),
            BackendError::MalformedResponse(detail) => Self::Internal(detail),
        }
    }
}

impl From<SessionTokenError> for GatewayError {
    fn from(error: SessionTokenError) -> Self {
        Self::Internal(error.to_string())
    }
}
