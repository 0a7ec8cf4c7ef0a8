//! Task-specific user prompts. Pure functions of attempt and rubric.

use std::fmt::Write;

use super::error::{PipelineError, PipelineResult};
use crate::model::{Attempt, Rubric, TaskType};

const CLOSING_INSTRUCTION: &str = "Score every rubric criterion using its criterion id. \
Cite evidence from the candidate response for each score, and report your confidence.";

/// Renders the user prompt for `attempt`.
///
/// Objective sections (reading, listening, use of english) are marked
/// automatically and have no committee template.
pub fn build_prompt(attempt: &Attempt, rubric: &Rubric) -> PipelineResult<String> {
    let rubric_json = serde_json::to_string_pretty(rubric)
        .map_err(|e| PipelineError::invalid(format!("rubric is not serializable: {}", e)))?;

    match attempt.task_type {
        TaskType::Writing => Ok(writing_prompt(attempt, &rubric_json)),
        TaskType::Speaking => Ok(speaking_prompt(attempt, &rubric_json)),
        TaskType::Mediation => Ok(mediation_prompt(attempt, &rubric_json)),
        task @ (TaskType::Reading | TaskType::Listening | TaskType::UseOfEnglish) => {
            Err(PipelineError::UnsupportedTask { task })
        }
    }
}

fn header(out: &mut String, attempt: &Attempt, task_name: &str) {
    let _ = writeln!(
        out,
        "Assess this {} {} {} response.",
        attempt.provider, attempt.level, task_name
    );
    let _ = writeln!(out, "Exam provider: {}", attempt.provider);
    let _ = writeln!(out, "CEFR level: {}", attempt.level);
}

fn task_prompt(out: &mut String, label: &str, attempt: &Attempt) {
    if let Some(prompt) = attempt.payload.task_prompt.as_deref() {
        let _ = writeln!(out, "\n{}:\n{}", label, prompt.trim());
    }
}

fn rubric_section(out: &mut String, rubric_json: &str) {
    let _ = writeln!(out, "\nRubric:\n{}", rubric_json);
}

fn candidate_text(out: &mut String, label: &str, text: &str) {
    let _ = writeln!(out, "\n{}:\n\"\"\"\n{}\n\"\"\"", label, text.trim());
}

fn word_limit(out: &mut String, attempt: &Attempt) {
    if let Some(limit) = attempt.payload.word_limit {
        let actual = attempt
            .payload
            .text
            .as_deref()
            .map(|t| t.split_whitespace().count())
            .unwrap_or(0);
        let _ = writeln!(out, "Word limit: {} (candidate wrote {} words)", limit, actual);
    }
}

fn writing_prompt(attempt: &Attempt, rubric_json: &str) -> String {
    let mut out = String::new();
    header(&mut out, attempt, "writing");
    word_limit(&mut out, attempt);
    task_prompt(&mut out, "Task given to the candidate", attempt);
    rubric_section(&mut out, rubric_json);
    candidate_text(
        &mut out,
        "Candidate response",
        attempt.payload.text.as_deref().unwrap_or_default(),
    );
    let _ = write!(
        out,
        "\nJudge task achievement, organisation, and language range and accuracy. {}",
        CLOSING_INSTRUCTION
    );
    out
}

fn speaking_prompt(attempt: &Attempt, rubric_json: &str) -> String {
    let mut out = String::new();
    header(&mut out, attempt, "speaking");
    task_prompt(&mut out, "Speaking task", attempt);
    rubric_section(&mut out, rubric_json);
    if let Some(url) = attempt.payload.audio_url.as_deref() {
        let _ = writeln!(out, "\nRecording: {}", url.trim());
    }
    match attempt.payload.transcript.as_deref() {
        Some(transcript) if !transcript.trim().is_empty() => {
            candidate_text(&mut out, "Transcript", transcript)
        }
        _ => {
            let _ = writeln!(out, "\nNo transcript is available; assess from the recording.");
        }
    }
    let _ = write!(
        out,
        "\nJudge fluency, pronunciation, interaction, and language range. {}",
        CLOSING_INSTRUCTION
    );
    out
}

fn mediation_prompt(attempt: &Attempt, rubric_json: &str) -> String {
    let mut out = String::new();
    header(&mut out, attempt, "mediation");
    word_limit(&mut out, attempt);
    task_prompt(&mut out, "Source material and instructions", attempt);
    rubric_section(&mut out, rubric_json);
    candidate_text(
        &mut out,
        "Candidate mediation",
        attempt.payload.text.as_deref().unwrap_or_default(),
    );
    let _ = write!(
        out,
        "\nJudge how faithfully and appropriately the source is relayed for the target reader. {}",
        CLOSING_INSTRUCTION
    );
    out
}
