use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion_id: String,
    pub score: f64,
    pub max_score: f64,
    /// Rubric band the score falls in, if the criterion defines bands.
    pub band: Option<String>,
    pub evidence: Vec<String>,
    pub confidence: f64,
}

/// Authoritative score for one attempt.
///
/// `total_score` is always the sum of `criteria_scores`, `percentage` lies in
/// `[0, 100]`, and `pass` is `total_score >= rubric.pass_threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub attempt_id: String,
    pub total_score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub pass: bool,
    pub criteria_scores: Vec<CriterionScore>,
    pub overall_feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub scored_at: DateTime<Utc>,
}
