use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ErrorLogId, JobId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub id: ErrorLogId,
    #[serde(default, rename = "user_id", skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
    #[serde(default, rename = "transcription_id", skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[serde(default, with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "error_message", alias = "message")]
    pub message: String,
    #[serde(default)]
    pub stack_trace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_users: u64,
    pub total_transcriptions: u64,
    pub total_errors: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transcription_count: u64,
}
