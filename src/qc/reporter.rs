use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::features::extract_features;
use crate::consensus::stats::{coefficient_of_variation, mean, round_to, std_dev};
use crate::model::{Attempt, CommitteeConfig, ConsensusSummary, Judgment, QcReport, QualityFlag};

/// Disagreement above which `high_disagreement` is raised.
pub const DEFAULT_HIGH_DISAGREEMENT: f64 = 0.2;
/// Disagreement below which the committee counts as unanimous.
pub const DEFAULT_UNANIMOUS_BELOW: f64 = 0.1;
/// Elapsed time above which `slow_processing` is raised.
pub const DEFAULT_SLOW_PROCESSING_MS: u64 = 30_000;

/// Tunable QC thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QcThresholds {
    pub high_disagreement: f64,
    pub unanimous_below: f64,
    pub slow_processing_ms: u64,
}

impl Default for QcThresholds {
    fn default() -> Self {
        Self {
            high_disagreement: DEFAULT_HIGH_DISAGREEMENT,
            unanimous_below: DEFAULT_UNANIMOUS_BELOW,
            slow_processing_ms: DEFAULT_SLOW_PROCESSING_MS,
        }
    }
}

/// Builds a [`QcReport`] from the judgments that survived fan-out.
#[derive(Debug, Clone, Copy, Default)]
pub struct QcReporter {
    thresholds: QcThresholds,
}

impl QcReporter {
    pub fn new(thresholds: QcThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &QcThresholds {
        &self.thresholds
    }

    /// Computes disagreement, cost, per-criterion ranges and flags.
    ///
    /// `committee` is the configured committee, so a shortfall in
    /// `judgments` shows up as `incomplete_committee`.
    pub fn report(
        &self,
        judgments: &[Judgment],
        attempt: &Attempt,
        committee: &CommitteeConfig,
        elapsed: Duration,
    ) -> QcReport {
        let totals: Vec<f64> = judgments.iter().map(|j| j.total_score).collect();
        let disagreement_score = disagreement(&totals);

        let mut model_costs: BTreeMap<String, f64> = BTreeMap::new();
        for judgment in judgments {
            *model_costs.entry(judgment.model.clone()).or_default() += judgment.cost_usd;
        }
        let total_cost_usd = model_costs.values().sum();

        let mut confidence_intervals: BTreeMap<String, (f64, f64)> = BTreeMap::new();
        for criterion in judgments.iter().flat_map(|j| &j.criteria_scores) {
            confidence_intervals
                .entry(criterion.criterion_id.clone())
                .and_modify(|(min, max)| {
                    *min = min.min(criterion.score);
                    *max = max.max(criterion.score);
                })
                .or_insert((criterion.score, criterion.score));
        }

        let processing_time_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        let mut quality_flags = Vec::new();
        if disagreement_score > self.thresholds.high_disagreement {
            quality_flags.push(QualityFlag::HighDisagreement);
        }
        if judgments.len() < committee.len() {
            quality_flags.push(QualityFlag::IncompleteCommittee);
        }
        if processing_time_ms > self.thresholds.slow_processing_ms {
            quality_flags.push(QualityFlag::SlowProcessing);
        }

        let consensus = ConsensusSummary {
            unanimous: disagreement_score < self.thresholds.unanimous_below,
            majority_threshold: judgments.len() / 2 + 1,
            outlier_scores: outliers(&totals),
        };

        if quality_flags.is_empty() {
            debug!(attempt_id = %attempt.id, disagreement_score, "qc report clean");
        } else {
            info!(
                attempt_id = %attempt.id,
                disagreement_score,
                flags = ?quality_flags,
                "qc flags raised"
            );
        }

        QcReport {
            attempt_id: attempt.id.clone(),
            processing_time_ms,
            model_costs,
            total_cost_usd,
            disagreement_score,
            confidence_intervals,
            features: extract_features(&attempt.payload),
            quality_flags,
            consensus,
            committee_size: committee.len(),
            successful_scorers: judgments.len(),
        }
    }
}

fn disagreement(totals: &[f64]) -> f64 {
    if totals.len() < 2 {
        return 0.0;
    }
    round_to(coefficient_of_variation(totals), 3)
}

/// Totals further than two standard deviations from the mean, ascending.
fn outliers(totals: &[f64]) -> Vec<String> {
    if totals.len() < 2 {
        return Vec::new();
    }
    let mut sorted = totals.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = mean(&sorted);
    let limit = 2.0 * std_dev(&sorted);
    if limit <= f64::EPSILON {
        return Vec::new();
    }
    sorted
        .into_iter()
        .filter(|total| (total - mean).abs() > limit)
        .map(|total| format!("{:.2}", total))
        .collect()
}
