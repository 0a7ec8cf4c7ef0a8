use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Closed vocabulary of QC warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    HighDisagreement,
    IncompleteCommittee,
    SlowProcessing,
}

impl QualityFlag {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityFlag::HighDisagreement => "high_disagreement",
            QualityFlag::IncompleteCommittee => "incomplete_committee",
            QualityFlag::SlowProcessing => "slow_processing",
        }
    }
}

impl std::fmt::Display for QualityFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Simple text statistics extracted from the attempt payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadFeatures {
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_words_per_sentence: f64,
    /// `clamp(0, 100, 100 - 2 * avg_words_per_sentence)`.
    pub readability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusSummary {
    pub unanimous: bool,
    /// Number of judgments forming a strict majority.
    pub majority_threshold: usize,
    pub outlier_scores: Vec<String>,
}

/// Diagnostics for one scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcReport {
    pub attempt_id: String,
    pub processing_time_ms: u64,
    pub model_costs: BTreeMap<String, f64>,
    pub total_cost_usd: f64,
    /// Coefficient of variation of judgment totals (3 decimals).
    pub disagreement_score: f64,
    pub confidence_intervals: BTreeMap<String, (f64, f64)>,
    pub features: Option<PayloadFeatures>,
    pub quality_flags: Vec<QualityFlag>,
    pub consensus: ConsensusSummary,
    pub committee_size: usize,
    pub successful_scorers: usize,
}

impl QcReport {
    pub fn has_flag(&self, flag: QualityFlag) -> bool {
        self.quality_flags.contains(&flag)
    }
}
