//! Scoring committee library crate (used by the server and integration tests).
//!
//! An [`Attempt`] is sent to every member of a [`CommitteeConfig`]; the
//! judgments that come back are reconciled into one [`Score`] by weighted
//! consensus and summarised in a [`QcReport`].
//!
//! ## Modules
//! - [`pipeline`] - [`ScoringEngine`], the entry point
//! - [`scorer`] - backend adapters, strict judgment parsing, pricing
//! - [`consensus`] - weighted per-criterion aggregation
//! - [`qc`] - disagreement, cost and quality flags
//! - [`cache`] - TTL result cache and background sweeper
//! - [`telemetry`] - performance recorder and dashboard
//! - [`rubric`] - rubric lookup
//! - [`gateway`] - Axum HTTP surface
//!
//! ## Test/Mock Support
//! [`scorer::MockScorer`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod consensus;
pub mod gateway;
pub mod hashing;
pub mod model;
pub mod pipeline;
pub mod qc;
pub mod rubric;
pub mod scorer;
pub mod telemetry;

#[cfg(test)]
mod test_fixtures;

pub use cache::{CachePolicy, CacheSweeper, ResultCache, ResultCacheHandle};
pub use config::{BackendConfig, Config, ConfigError};
pub use consensus::{ConsensusAggregator, ConsensusError};
pub use hashing::hash_model_request;
pub use model::{
    Attempt, Band, CommitteeConfig, CommitteeMember, ConsensusSummary, Criterion,
    CriterionJudgment, CriterionScore, Judgment, PayloadFeatures, QcReport, QualityFlag, Rubric,
    Score, TaskPayload, TaskType,
};
pub use pipeline::{PipelineError, PipelineStage, ScorerFailure, ScoringEngine, ScoringOutcome};
pub use qc::{QcReporter, QcThresholds};
pub use rubric::{
    CachedRubricSource, FileRubricSource, RubricError, RubricSource, StaticRubricSource,
};
#[cfg(any(test, feature = "mock"))]
pub use scorer::MockScorer;
pub use scorer::{HttpScorer, PricingTable, Scorer, ScorerError, ScorerRegistry};
pub use telemetry::{DashboardData, OperationStats, PerformanceRecorder};
