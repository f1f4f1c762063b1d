use chrono::{DateTime, Utc};

use crate::domain::Principal;

#[derive(Debug, Clone)]
pub struct SealedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and opens the gateway's own session tokens.
pub trait SessionTokenCodec: Send + Sync {
    fn seal(&self, principal: &Principal) -> Result<SealedSession, SessionTokenError>;

    fn open(&self, token: &str) -> Result<Principal, SessionTokenError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionTokenError {
    #[error("malformed session token: {0}")]
    Malformed(String),
    #[error("session token failed verification")]
    Tampered,
    #[error("session token expired")]
    Expired,
    #[error("session sealing failed: {0}")]
    Sealing(String),
}
