use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::error::ScorerError;
use crate::model::{Attempt, CommitteeMember, Judgment};

/// Everything one backend call needs.
#[derive(Debug, Clone, Copy)]
pub struct ScoringRequest<'a> {
    /// Rendered, task-specific user prompt.
    pub prompt: &'a str,
    pub member: &'a CommitteeMember,
    pub attempt: &'a Attempt,
}

/// Uniform interface to one scoring backend.
///
/// Implementations must not mutate shared state and must report their own
/// wall-clock time in [`Judgment::processing_time_ms`].
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, request: ScoringRequest<'_>) -> Result<Judgment, ScorerError>;
}

/// Provider name → adapter.
#[derive(Clone, Default)]
pub struct ScorerRegistry {
    scorers: HashMap<String, Arc<dyn Scorer>>,
}

impl ScorerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scorer(mut self, provider: impl Into<String>, scorer: Arc<dyn Scorer>) -> Self {
        self.register(provider, scorer);
        self
    }

    pub fn register(&mut self, provider: impl Into<String>, scorer: Arc<dyn Scorer>) {
        self.scorers.insert(provider.into(), scorer);
    }

    pub fn get(&self, provider: &str) -> Option<Arc<dyn Scorer>> {
        self.scorers.get(provider).cloned()
    }

    /// Registered provider names, sorted.
    pub fn providers(&self) -> Vec<&str> {
        let mut providers: Vec<&str> = self.scorers.keys().map(String::as_str).collect();
        providers.sort_unstable();
        providers
    }

    pub fn len(&self) -> usize {
        self.scorers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scorers.is_empty()
    }
}

impl std::fmt::Debug for ScorerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScorerRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}
