use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PromptId;

/// The three AI-driven stages that each keep a versioned prompt history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptFamily {
    Transcribe,
    Proofread,
    System,
}

impl PromptFamily {
    pub const ALL: [PromptFamily; 3] = [
        PromptFamily::Transcribe,
        PromptFamily::Proofread,
        PromptFamily::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptFamily::Transcribe => "transcribe",
            PromptFamily::Proofread => "proofread",
            PromptFamily::System => "system",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.as_str() == slug)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PromptFamily::Transcribe => "Transcribe",
            PromptFamily::Proofread => "Proofread",
            PromptFamily::System => "System",
        }
    }

    /// `/admin/transcribe-prompts` and siblings.
    pub fn collection_path(&self) -> String {
        format!("/admin/{}-prompts", self.as_str())
    }

    /// `/admin/settings/active-transcribe-prompt` and siblings.
    pub fn active_setting_path(&self) -> String {
        format!("/admin/settings/active-{}-prompt", self.as_str())
    }

    /// Body field naming the prompt to activate, e.g. `transcribe_prompt_id`.
    pub fn id_field(&self) -> String {
        format!("{}_prompt_id", self.as_str())
    }
}

impl fmt::Display for PromptFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Prompt version as the backend serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub id: PromptId,
    pub version: String,
    pub prompt: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VersionedPrompt {
    pub id: PromptId,
    pub family: PromptFamily,
    pub version: String,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl VersionedPrompt {
    pub fn from_record(family: PromptFamily, record: PromptRecord) -> Self {
        Self {
            id: record.id,
            family,
            version: record.version,
            body: record.prompt,
            created_at: record.created_at,
            is_active: record.is_active,
        }
    }
}
