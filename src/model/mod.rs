//! Data model shared by the scorer, consensus, QC, and pipeline modules.
//!
//! Everything here is plain data with serde derives. Ownership follows the
//! scoring call: the caller owns [`Attempt`], [`Rubric`] and [`CommitteeConfig`];
//! the engine borrows them and produces an owned [`Score`] and [`QcReport`].

pub mod attempt;
pub mod committee;
pub mod judgment;
pub mod report;
pub mod rubric;
pub mod score;

pub use attempt::{Attempt, TaskPayload, TaskType, UnknownTaskType};
pub use committee::{CommitteeConfig, CommitteeMember};
pub use judgment::{CriterionJudgment, Judgment};
pub use report::{ConsensusSummary, PayloadFeatures, QcReport, QualityFlag};
pub use rubric::{Band, Criterion, Rubric};
pub use score::{CriterionScore, Score};
