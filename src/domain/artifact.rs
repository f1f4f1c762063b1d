use std::fmt;

pub const WORD_DOCUMENT_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    PlainText,
    Markdown,
    WordDocument,
}

impl ArtifactKind {
    pub fn from_file_type(file_type: &str) -> Option<Self> {
        match file_type.to_ascii_lowercase().as_str() {
            "txt" | "text" => Some(Self::PlainText),
            "md" | "markdown" => Some(Self::Markdown),
            "docx" | "word" => Some(Self::WordDocument),
            _ => None,
        }
    }

    pub fn file_type(&self) -> &'static str {
        match self {
            Self::PlainText => "txt",
            Self::Markdown => "md",
            Self::WordDocument => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::PlainText => "text/plain",
            Self::Markdown => "text/markdown",
            Self::WordDocument => WORD_DOCUMENT_MIME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path component: {0:?}")]
pub struct InvalidPathSegment(pub String);

/// One caller-supplied URL path component that is safe to splice into a
/// backend path and into a `Content-Disposition` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment(String);

impl PathSegment {
    pub fn parse(raw: &str) -> Result<Self, InvalidPathSegment> {
        let trimmed = raw.trim();
        let forbidden = |c: char| {
            c.is_control() || matches!(c, '/' | '\\' | '"' | '%' | '?' | '#' | ';')
        };

        if trimmed.is_empty()
            || trimmed != raw
            || trimmed.contains("..")
            || trimmed == "."
            || trimmed.chars().any(forbidden)
        {
            return Err(InvalidPathSegment(raw.to_string()));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an artifact lives on the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocator {
    ByJob {
        kind: ArtifactKind,
        job_id: PathSegment,
    },
    UserText {
        user: PathSegment,
        job_id: PathSegment,
        filename: PathSegment,
    },
    Word {
        filename: PathSegment,
    },
    AdminWord {
        user: PathSegment,
        filename: PathSegment,
    },
}

impl ArtifactLocator {
    pub fn backend_path(&self) -> String {
        match self {
            Self::ByJob { kind, job_id } => format!("/download/{}/{}", kind.file_type(), job_id),
            Self::UserText {
                user,
                job_id,
                filename,
            } => format!("/download/user-files/txt/{}/{}/{}", user, job_id, filename),
            Self::Word { filename } => format!("/download/word/{}", filename),
            Self::AdminWord { user, filename } => {
                format!("/admin/download/word/{}/{}", user, filename)
            }
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::ByJob { kind, .. } => *kind,
            Self::UserText { .. } => ArtifactKind::PlainText,
            Self::Word { .. } | Self::AdminWord { .. } => ArtifactKind::WordDocument,
        }
    }

    /// Name offered to the caller in `Content-Disposition`.
    pub fn attachment_name(&self) -> String {
        match self {
            Self::ByJob { kind, job_id } => format!("{}.{}", job_id, kind.file_type()),
            Self::UserText { filename, .. }
            | Self::Word { filename }
            | Self::AdminWord { filename, .. } => filename.to_string(),
        }
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.attachment_name())
    }

    pub fn requires_admin(&self) -> bool {
        matches!(self, Self::AdminWord { .. })
    }
}
