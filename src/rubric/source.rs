use async_trait::async_trait;

use super::error::RubricError;
use crate::model::{Rubric, TaskType};

/// Read-only rubric store.
#[async_trait]
pub trait RubricSource: Send + Sync {
    async fn get_rubric(
        &self,
        provider: &str,
        level: &str,
        task_type: TaskType,
    ) -> Result<Rubric, RubricError>;
}

/// In-memory rubric list; the first matching rubric wins.
#[derive(Debug, Clone, Default)]
pub struct StaticRubricSource {
    rubrics: Vec<Rubric>,
}

impl StaticRubricSource {
    pub fn new(rubrics: Vec<Rubric>) -> Self {
        Self { rubrics }
    }

    pub fn with_rubric(mut self, rubric: Rubric) -> Self {
        self.rubrics.push(rubric);
        self
    }

    pub fn find(&self, provider: &str, level: &str, task_type: TaskType) -> Option<&Rubric> {
        self.rubrics
            .iter()
            .find(|r| r.matches(provider, level, task_type))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rubrics.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rubrics.is_empty()
    }
}

#[async_trait]
impl RubricSource for StaticRubricSource {
    async fn get_rubric(
        &self,
        provider: &str,
        level: &str,
        task_type: TaskType,
    ) -> Result<Rubric, RubricError> {
        self.find(provider, level, task_type)
            .cloned()
            .ok_or_else(|| RubricError::not_found(provider, level, task_type))
    }
}
