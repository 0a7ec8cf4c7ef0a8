use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("cannot aggregate an empty set of judgments")]
    NoJudgments,
}
