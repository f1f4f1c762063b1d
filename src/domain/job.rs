use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{JobId, JobStatus, UserId};

const MISSING_FAILURE_DETAIL: &str = "Processing failed without further detail";

/// Transcription job as the backend serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    #[serde(default, rename = "user_id", alias = "owner_id")]
    pub owner_id: Option<UserId>,
    #[serde(default, with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    #[serde(default, alias = "filename", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_link: Option<String>,
    #[serde(default, alias = "text_path", skip_serializing_if = "Option::is_none")]
    pub txt_path: Option<String>,
    #[serde(default, alias = "markdown_path", skip_serializing_if = "Option::is_none")]
    pub md_path: Option<String>,
    #[serde(default, alias = "docx_path", skip_serializing_if = "Option::is_none")]
    pub document_path: Option<String>,
    #[serde(default, alias = "google_doc_link", skip_serializing_if = "Option::is_none")]
    pub document_link: Option<String>,
    #[serde(default, alias = "failure_detail")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    UploadedFile { filename: String },
    ExternalLink { url: String },
    Unspecified,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub plain_text: Option<String>,
    pub markdown: Option<String>,
    pub word_document: Option<String>,
}

impl Artifacts {
    pub fn is_empty(&self) -> bool {
        self.plain_text.is_none() && self.markdown.is_none() && self.word_document.is_none()
    }
}

/// Client-side view of a job.
///
/// Artifacts and the external link are only ever present on a `Completed`
/// job, and a failure detail only on an `Error` job. `from_record` enforces
/// this whatever the backend sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub owner_id: Option<UserId>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub source: SourceDescriptor,
    pub status: JobStatus,
    artifacts: Artifacts,
    external_artifact_link: Option<String>,
    failure_detail: Option<String>,
}

impl Job {
    pub fn from_record(record: JobRecord) -> Self {
        let source = match (record.drive_link, record.file_name) {
            (Some(url), _) if !url.trim().is_empty() => SourceDescriptor::ExternalLink { url },
            (_, Some(filename)) if !filename.trim().is_empty() => {
                SourceDescriptor::UploadedFile { filename }
            }
            _ => SourceDescriptor::Unspecified,
        };

        let completed = record.status == JobStatus::Completed;
        let (artifacts, external_artifact_link) = if completed {
            (
                Artifacts {
                    plain_text: non_blank(record.txt_path),
                    markdown: non_blank(record.md_path),
                    word_document: non_blank(record.document_path),
                },
                non_blank(record.document_link),
            )
        } else {
            (Artifacts::default(), None)
        };

        let failure_detail = if record.status == JobStatus::Error {
            Some(
                non_blank(record.error_message)
                    .unwrap_or_else(|| MISSING_FAILURE_DETAIL.to_string()),
            )
        } else {
            None
        };

        Self {
            id: record.id,
            owner_id: record.owner_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            source,
            status: record.status,
            artifacts,
            external_artifact_link,
            failure_detail,
        }
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    pub fn external_artifact_link(&self) -> Option<&str> {
        self.external_artifact_link.as_deref()
    }

    pub fn failure_detail(&self) -> Option<&str> {
        self.failure_detail.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn status_label(&self) -> String {
        self.status.label()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
