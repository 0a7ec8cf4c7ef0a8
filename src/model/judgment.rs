use serde::{Deserialize, Serialize};

/// One scorer's verdict on one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionJudgment {
    pub criterion_id: String,
    pub score: f64,
    #[serde(default)]
    pub evidence: Vec<String>,
    /// Self-reported confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Raw structured result from one scorer backend for one attempt.
///
/// Lives only for the duration of a scoring call (and in the model-response
/// cache); never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub model: String,
    pub provider: String,
    pub criteria_scores: Vec<CriterionJudgment>,
    pub total_score: f64,
    pub max_score: f64,
    #[serde(default)]
    pub overall_feedback: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    pub confidence: f64,
    pub processing_time_ms: u64,
    pub cost_usd: f64,
}

impl Judgment {
    pub fn criterion(&self, criterion_id: &str) -> Option<&CriterionJudgment> {
        self.criteria_scores
            .iter()
            .find(|c| c.criterion_id == criterion_id)
    }
}
