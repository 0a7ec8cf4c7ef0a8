//! Scripted [`Scorer`] for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::adapter::{Scorer, ScoringRequest};
use super::error::ScorerError;
use crate::model::{CriterionJudgment, Judgment};

#[derive(Debug, Clone)]
enum MockBehavior {
    Respond(Judgment),
    Fail(ScorerError),
    Delay(Duration, Box<MockBehavior>),
}

/// Returns canned judgments or errors per model name, counting calls.
///
/// Models without a scripted behaviour fail with `BackendUnreachable`.
#[derive(Debug)]
pub struct MockScorer {
    provider: String,
    behaviors: Mutex<HashMap<String, MockBehavior>>,
    calls: Mutex<HashMap<String, usize>>,
    total_calls: AtomicUsize,
}

impl MockScorer {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            behaviors: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            total_calls: AtomicUsize::new(0),
        }
    }

    pub fn respond(self, model: &str, judgment: Judgment) -> Self {
        self.behaviors
            .lock()
            .insert(model.to_string(), MockBehavior::Respond(judgment));
        self
    }

    pub fn fail(self, model: &str, error: ScorerError) -> Self {
        self.behaviors
            .lock()
            .insert(model.to_string(), MockBehavior::Fail(error));
        self
    }

    /// Responds with `judgment` after sleeping for `delay`.
    pub fn respond_after(self, model: &str, delay: Duration, judgment: Judgment) -> Self {
        self.behaviors.lock().insert(
            model.to_string(),
            MockBehavior::Delay(delay, Box::new(MockBehavior::Respond(judgment))),
        );
        self
    }

    pub fn calls(&self, model: &str) -> usize {
        self.calls.lock().get(model).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Builds a judgment whose total is the sum of `scores`.
    pub fn judgment(model: &str, provider: &str, scores: &[(&str, f64)]) -> Judgment {
        Judgment {
            model: model.to_string(),
            provider: provider.to_string(),
            criteria_scores: scores
                .iter()
                .map(|(id, score)| CriterionJudgment {
                    criterion_id: id.to_string(),
                    score: *score,
                    evidence: vec![format!("{} evidence from {}", id, model)],
                    confidence: 0.9,
                })
                .collect(),
            total_score: scores.iter().map(|(_, s)| s).sum(),
            max_score: 0.0,
            overall_feedback: format!("Feedback from {}", model),
            strengths: vec!["Clear structure".to_string()],
            improvements: vec!["Vary vocabulary".to_string()],
            confidence: 0.9,
            processing_time_ms: 0,
            cost_usd: 0.001,
        }
    }
}

#[async_trait]
impl Scorer for MockScorer {
    async fn score(&self, request: ScoringRequest<'_>) -> Result<Judgment, ScorerError> {
        let started = Instant::now();
        let model = request.member.model.clone();
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().entry(model.clone()).or_default() += 1;

        let behavior = self.behaviors.lock().get(&model).cloned();
        let mut behavior = behavior.ok_or_else(|| ScorerError::BackendUnreachable {
            provider: self.provider.clone(),
            message: format!("no mock behaviour for model '{}'", model),
        })?;

        loop {
            match behavior {
                MockBehavior::Respond(mut judgment) => {
                    judgment.processing_time_ms = started.elapsed().as_millis() as u64;
                    return Ok(judgment);
                }
                MockBehavior::Fail(error) => return Err(error),
                MockBehavior::Delay(delay, next) => {
                    tokio::time::sleep(delay).await;
                    behavior = *next;
                }
            }
        }
    }
}
