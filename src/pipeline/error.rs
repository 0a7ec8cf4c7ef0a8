use thiserror::Error;

use crate::consensus::ConsensusError;
use crate::model::TaskType;
use crate::scorer::ScorerError;

/// One committee member's failed call.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorerFailure {
    /// Position of the member in the committee.
    pub index: usize,
    pub model: String,
    pub provider: String,
    pub error: ScorerError,
}

impl ScorerFailure {
    pub fn new(index: usize, model: &str, provider: &str, error: ScorerError) -> Self {
        Self {
            index,
            model: model.to_string(),
            provider: provider.to_string(),
            error,
        }
    }
}

impl std::fmt::Display for ScorerFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {}/{}: {}",
            self.index, self.provider, self.model, self.error
        )
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("task type '{task}' cannot be scored by a committee")]
    UnsupportedTask { task: TaskType },

    #[error("all {} scorers failed", .failures.len())]
    AllScorersFailed { failures: Vec<ScorerFailure> },

    #[error("consensus failed: {0}")]
    Consensus(#[from] ConsensusError),
}

impl PipelineError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        PipelineError::InvalidPayload {
            reason: reason.into(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
