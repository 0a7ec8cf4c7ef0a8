//! Quality-control reporting over committee judgments.
//!
//! The reporter never changes a score. It measures how much the committee
//! disagreed, what the call cost, and raises [`QualityFlag`](crate::model::QualityFlag)s
//! for downstream review.

pub mod features;
pub mod reporter;


pub use features::extract_features;
pub use reporter::{
    DEFAULT_HIGH_DISAGREEMENT, DEFAULT_SLOW_PROCESSING_MS, DEFAULT_UNANIMOUS_BELOW, QcReporter,
    QcThresholds,
};
