use std::sync::Arc;

use crate::pipeline::ScoringEngine;
use crate::rubric::RubricSource;

#[derive(Clone)]
pub struct HandlerState {
    pub engine: Arc<ScoringEngine>,

    /// Resolves rubrics for requests that do not carry one.
    pub rubrics: Arc<dyn RubricSource>,
}

impl HandlerState {
    pub fn new(engine: Arc<ScoringEngine>, rubrics: Arc<dyn RubricSource>) -> Self {
        Self { engine, rubrics }
    }
}
