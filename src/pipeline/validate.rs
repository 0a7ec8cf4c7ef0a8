use super::error::{PipelineError, PipelineResult};
use crate::model::{Attempt, CommitteeConfig, TaskType};

/// Minimum trimmed length of a written response.
pub const MIN_TEXT_CHARS: usize = 50;
/// Minimum trimmed length of a speaking transcript when no audio is attached.
pub const MIN_TRANSCRIPT_CHARS: usize = 20;

/// Checks that the attempt carries what its task type needs, and that
/// there is someone to score it. Runs before any backend call.
pub fn validate_attempt(attempt: &Attempt, committee: &CommitteeConfig) -> PipelineResult<()> {
    if committee.is_empty() {
        return Err(PipelineError::invalid("committee has no members"));
    }

    let payload = &attempt.payload;
    match attempt.task_type {
        TaskType::Writing | TaskType::Mediation => {
            let chars = char_len(payload.text.as_deref());
            if chars < MIN_TEXT_CHARS {
                return Err(PipelineError::invalid(format!(
                    "{} response needs at least {} characters of text, got {}",
                    attempt.task_type, MIN_TEXT_CHARS, chars
                )));
            }
        }
        TaskType::Speaking => {
            let has_audio = payload
                .audio_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty());
            if !has_audio && char_len(payload.transcript.as_deref()) < MIN_TRANSCRIPT_CHARS {
                return Err(PipelineError::invalid(format!(
                    "speaking response needs an audio_url or a transcript of at least {} characters",
                    MIN_TRANSCRIPT_CHARS
                )));
            }
        }
        TaskType::Reading | TaskType::Listening | TaskType::UseOfEnglish => {
            if payload.answers.as_ref().is_none_or(|a| a.is_null()) {
                return Err(PipelineError::invalid(format!(
                    "{} response needs answers",
                    attempt.task_type
                )));
            }
        }
    }
    Ok(())
}

fn char_len(text: Option<&str>) -> usize {
    text.map(|t| t.trim().chars().count()).unwrap_or(0)
}
