use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Processing stage reported by the backend for a transcription job.
///
/// The known tags form an ordered progression ending in `Completed`; `Error`
/// can be reached from any non-terminal tag. Tags the backend adds later are
/// kept verbatim in `Unknown` so they can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Submitted,
    Uploading,
    Trimming,
    Waiting,
    Transcribing,
    WaitingForProofreading,
    Proofreading,
    Converting,
    Completed,
    Error,
    Unknown(String),
}

impl JobStatus {
    /// Forward progression, `Completed` last.
    pub const PROGRESSION: [JobStatus; 9] = [
        JobStatus::Submitted,
        JobStatus::Uploading,
        JobStatus::Trimming,
        JobStatus::Waiting,
        JobStatus::Transcribing,
        JobStatus::WaitingForProofreading,
        JobStatus::Proofreading,
        JobStatus::Converting,
        JobStatus::Completed,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Submitted => "submitted",
            JobStatus::Uploading => "uploading",
            JobStatus::Trimming => "trimming",
            JobStatus::Waiting => "waiting",
            JobStatus::Transcribing => "transcribing",
            JobStatus::WaitingForProofreading => "waiting_for_proofreading",
            JobStatus::Proofreading => "proofreading",
            JobStatus::Converting => "converting",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
            JobStatus::Unknown(raw) => raw,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "submitted" => JobStatus::Submitted,
            "uploading" => JobStatus::Uploading,
            "trimming" => JobStatus::Trimming,
            "waiting" => JobStatus::Waiting,
            "transcribing" => JobStatus::Transcribing,
            "waiting_for_proofreading" => JobStatus::WaitingForProofreading,
            "proofreading" => JobStatus::Proofreading,
            "converting" => JobStatus::Converting,
            "completed" => JobStatus::Completed,
            "error" => JobStatus::Error,
            other => JobStatus::Unknown(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, JobStatus::Unknown(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Position in the forward progression. `Error` and unknown tags have none.
    pub fn stage(&self) -> Option<usize> {
        Self::PROGRESSION.iter().position(|status| status == self)
    }

    /// The tag that follows this one on the happy path.
    pub fn successor(&self) -> Option<JobStatus> {
        self.stage()
            .and_then(|index| Self::PROGRESSION.get(index + 1).cloned())
    }

    /// Whether the backend moving a job from `self` to `next` is a legal step.
    ///
    /// Re-observing the same tag is always legal. Nothing leaves a terminal tag.
    /// Transitions involving an unknown tag cannot be judged and are accepted.
    pub fn can_transition_to(&self, next: &JobStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match next {
            JobStatus::Error | JobStatus::Unknown(_) => true,
            _ => match (self.stage(), next.stage()) {
                (Some(from), Some(to)) => to > from,
                _ => true,
            },
        }
    }

    /// Human-readable label; unknown tags are shown as received.
    pub fn label(&self) -> String {
        match self {
            JobStatus::Submitted => "Submitted".to_string(),
            JobStatus::Uploading => "Uploading".to_string(),
            JobStatus::Trimming => "Trimming".to_string(),
            JobStatus::Waiting => "Waiting".to_string(),
            JobStatus::Transcribing => "Transcribing".to_string(),
            JobStatus::WaitingForProofreading => "Waiting for proofreading".to_string(),
            JobStatus::Proofreading => "Proofreading".to_string(),
            JobStatus::Converting => "Converting".to_string(),
            JobStatus::Completed => "Completed".to_string(),
            JobStatus::Error => "Error".to_string(),
            JobStatus::Unknown(raw) => raw.clone(),
        }
    }
}

impl FromStr for JobStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(JobStatus::parse(s))
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(JobStatus::parse(&raw))
    }
}
