use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of exam task types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Writing,
    Speaking,
    Reading,
    Listening,
    #[serde(alias = "use-of-english")]
    UseOfEnglish,
    Mediation,
}

impl TaskType {
    pub const ALL: [TaskType; 6] = [
        TaskType::Writing,
        TaskType::Speaking,
        TaskType::Reading,
        TaskType::Listening,
        TaskType::UseOfEnglish,
        TaskType::Mediation,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Writing => "writing",
            TaskType::Speaking => "speaking",
            TaskType::Reading => "reading",
            TaskType::Listening => "listening",
            TaskType::UseOfEnglish => "use_of_english",
            TaskType::Mediation => "mediation",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a [`TaskType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task type: {0}")]
pub struct UnknownTaskType(pub String);

impl std::str::FromStr for TaskType {
    type Err = UnknownTaskType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "writing" => Ok(Self::Writing),
            "speaking" => Ok(Self::Speaking),
            "reading" => Ok(Self::Reading),
            "listening" => Ok(Self::Listening),
            "use_of_english" | "use-of-english" => Ok(Self::UseOfEnglish),
            "mediation" => Ok(Self::Mediation),
            _ => Err(UnknownTaskType(s.to_string())),
        }
    }
}

/// Task-specific content submitted by the candidate.
///
/// Which fields are required depends on the task type; see
/// [`crate::pipeline::validate_attempt`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    /// Written response (writing, mediation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Reference to a recorded answer (speaking).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Transcript of a recorded answer (speaking).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    /// Structured answers (reading, listening, use of english).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<serde_json::Value>,
    /// Question or instructions shown to the candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_prompt: Option<String>,
    /// Target length for written tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_limit: Option<u32>,
}

impl TaskPayload {
    /// Returns the text a reader would see: the written response, else the transcript.
    pub fn textual_content(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.transcript.as_deref().filter(|t| !t.trim().is_empty()))
    }
}

/// One unit of work to be scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: String,
    pub task_type: TaskType,
    pub provider: String,
    pub level: String,
    pub payload: TaskPayload,
    pub created_at: DateTime<Utc>,
}

impl Attempt {
    /// Creates an attempt stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        task_type: TaskType,
        provider: impl Into<String>,
        level: impl Into<String>,
        payload: TaskPayload,
    ) -> Self {
        Self {
            id: id.into(),
            task_type,
            provider: provider.into(),
            level: level.into(),
            payload,
            created_at: Utc::now(),
        }
    }
}
