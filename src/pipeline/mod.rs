//! Scoring pipeline: validate, prompt, fan out, aggregate, report.

pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod validate;

#[cfg(test)]
mod tests;

pub use error::{PipelineError, PipelineResult, ScorerFailure};
pub use orchestrator::{
    DEFAULT_SCORER_TIMEOUT_SECS, PIPELINE_OPERATION, PipelineStage, ScoringEngine,
    ScoringOutcome, scorer_operation,
};
pub use prompt::build_prompt;
pub use validate::{MIN_TEXT_CHARS, MIN_TRANSCRIPT_CHARS, validate_attempt};
