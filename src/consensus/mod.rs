//! Weighted consensus over committee judgments.

pub mod aggregator;
pub mod error;
pub mod stats;


pub use aggregator::{
    ConsensusAggregator, DEFAULT_CRITERION_CONFIDENCE, MAX_EVIDENCE_PER_CRITERION, MAX_HIGHLIGHTS,
    MIN_CRITERION_CONFIDENCE, criterion_confidence,
};
pub use error::ConsensusError;
