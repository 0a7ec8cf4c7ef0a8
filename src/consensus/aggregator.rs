use chrono::Utc;
use tracing::debug;

use super::error::ConsensusError;
use super::stats::{extend_unique, mean, round_to, std_dev};
use crate::model::{CommitteeConfig, Criterion, CriterionScore, Judgment, Rubric, Score};

/// Evidence strings kept per criterion.
pub const MAX_EVIDENCE_PER_CRITERION: usize = 5;
/// Strengths and improvements kept on the final score.
pub const MAX_HIGHLIGHTS: usize = 3;
/// Confidence when fewer than two scores are available, or their mean is 0.
pub const DEFAULT_CRITERION_CONFIDENCE: f64 = 0.8;
/// Lower bound on aggregated criterion confidence.
pub const MIN_CRITERION_CONFIDENCE: f64 = 0.1;

/// Reconciles committee judgments into one [`Score`] by weighted average.
///
/// Stateless; one instance can serve concurrent scoring calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsensusAggregator;

impl ConsensusAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Aggregates `judgments` against `rubric`, weighting by `committee`.
    ///
    /// Each judgment is paired with the index of the committee member that
    /// produced it, so members sharing a model keep their own weights. The
    /// result depends only on the inputs and their order.
    pub fn aggregate(
        &self,
        attempt_id: &str,
        judgments: &[(usize, Judgment)],
        committee: &CommitteeConfig,
        rubric: &Rubric,
    ) -> Result<Score, ConsensusError> {
        match judgments {
            [] => Err(ConsensusError::NoJudgments),
            [(_, single)] => Ok(self.passthrough(attempt_id, single, rubric)),
            _ => Ok(self.weighted(attempt_id, judgments, committee, rubric)),
        }
    }

    fn passthrough(&self, attempt_id: &str, judgment: &Judgment, rubric: &Rubric) -> Score {
        debug!(model = %judgment.model, "single judgment, passing scores through");

        let criteria_scores = rubric
            .criteria
            .iter()
            .map(|criterion| {
                let (score, evidence, confidence) = match judgment.criterion(&criterion.id) {
                    Some(c) => {
                        let mut evidence = Vec::new();
                        extend_unique(&mut evidence, &c.evidence, MAX_EVIDENCE_PER_CRITERION);
                        (c.score, evidence, c.confidence)
                    }
                    None => (0.0, Vec::new(), DEFAULT_CRITERION_CONFIDENCE),
                };
                criterion_score(criterion, score, evidence, confidence)
            })
            .collect();

        let mut strengths = Vec::new();
        extend_unique(&mut strengths, &judgment.strengths, MAX_HIGHLIGHTS);
        let mut improvements = Vec::new();
        extend_unique(&mut improvements, &judgment.improvements, MAX_HIGHLIGHTS);

        finish(
            attempt_id,
            rubric,
            criteria_scores,
            judgment.overall_feedback.trim().to_string(),
            strengths,
            improvements,
        )
    }

    fn weighted(
        &self,
        attempt_id: &str,
        seated: &[(usize, Judgment)],
        committee: &CommitteeConfig,
        rubric: &Rubric,
    ) -> Score {
        let mut weights: Vec<f64> = seated
            .iter()
            .map(|(index, _)| committee.weight_at(*index))
            .collect();
        let judgments: Vec<&Judgment> = seated.iter().map(|(_, judgment)| judgment).collect();
        let mut total_weight: f64 = weights.iter().sum();
        if total_weight <= 0.0 || !total_weight.is_finite() {
            debug!("committee weights sum to zero, falling back to equal weights");
            weights = vec![1.0; judgments.len()];
            total_weight = judgments.len() as f64;
        }

        let criteria_scores = rubric
            .criteria
            .iter()
            .map(|criterion| {
                let mut weighted_sum = 0.0;
                let mut reported = Vec::with_capacity(judgments.len());
                let mut evidence = Vec::new();

                for (judgment, weight) in judgments.iter().zip(&weights) {
                    if let Some(c) = judgment.criterion(&criterion.id) {
                        weighted_sum += c.score * weight;
                        reported.push(c.score);
                        extend_unique(&mut evidence, &c.evidence, MAX_EVIDENCE_PER_CRITERION);
                    }
                }

                let score = round_to(weighted_sum / total_weight, 2);
                criterion_score(criterion, score, evidence, criterion_confidence(&reported))
            })
            .collect();

        let overall_feedback = judgments
            .iter()
            .map(|j| j.overall_feedback.trim())
            .find(|feedback| !feedback.is_empty())
            .unwrap_or_default()
            .to_string();

        let mut strengths = Vec::new();
        let mut improvements = Vec::new();
        for judgment in &judgments {
            extend_unique(&mut strengths, &judgment.strengths, MAX_HIGHLIGHTS);
            extend_unique(&mut improvements, &judgment.improvements, MAX_HIGHLIGHTS);
        }

        finish(
            attempt_id,
            rubric,
            criteria_scores,
            overall_feedback,
            strengths,
            improvements,
        )
    }
}

/// `clamp(1 - std_dev / mean, 0.1, 1.0)` over the reported scores.
pub fn criterion_confidence(scores: &[f64]) -> f64 {
    if scores.len() < 2 {
        return DEFAULT_CRITERION_CONFIDENCE;
    }
    let mean = mean(scores);
    if mean == 0.0 {
        return DEFAULT_CRITERION_CONFIDENCE;
    }
    let confidence = 1.0 - std_dev(scores) / mean;
    round_to(confidence.clamp(MIN_CRITERION_CONFIDENCE, 1.0), 3)
}

fn criterion_score(
    criterion: &Criterion,
    score: f64,
    evidence: Vec<String>,
    confidence: f64,
) -> CriterionScore {
    CriterionScore {
        criterion_id: criterion.id.clone(),
        score,
        max_score: criterion.max_score,
        band: criterion.band_for(score).map(str::to_string),
        evidence,
        confidence,
    }
}

fn finish(
    attempt_id: &str,
    rubric: &Rubric,
    criteria_scores: Vec<CriterionScore>,
    overall_feedback: String,
    strengths: Vec<String>,
    improvements: Vec<String>,
) -> Score {
    let total_score: f64 = criteria_scores.iter().map(|c| c.score).sum();
    let max_score = rubric.max_score();
    let percentage = if max_score > 0.0 {
        round_to(total_score / max_score * 100.0, 2).clamp(0.0, 100.0)
    } else {
        0.0
    };

    Score {
        attempt_id: attempt_id.to_string(),
        total_score,
        max_score,
        percentage,
        pass: total_score >= rubric.pass_threshold,
        criteria_scores,
        overall_feedback,
        strengths,
        improvements,
        scored_at: Utc::now(),
    }
}
