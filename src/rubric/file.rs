use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use super::error::RubricError;
use super::source::{RubricSource, StaticRubricSource};
use crate::model::{Rubric, TaskType};

/// Rubrics loaded once from a JSON array on disk.
#[derive(Debug, Clone)]
pub struct FileRubricSource {
    path: PathBuf,
    rubrics: StaticRubricSource,
}

impl FileRubricSource {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RubricError> {
        let path = path.as_ref().to_path_buf();
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| RubricError::Io {
                path: path.clone(),
                source,
            })?;
        let rubrics: Vec<Rubric> =
            serde_json::from_str(&raw).map_err(|source| RubricError::Parse {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), count = rubrics.len(), "loaded rubrics");
        Ok(Self {
            path,
            rubrics: StaticRubricSource::new(rubrics),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.rubrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rubrics.is_empty()
    }
}

#[async_trait]
impl RubricSource for FileRubricSource {
    async fn get_rubric(
        &self,
        provider: &str,
        level: &str,
        task_type: TaskType,
    ) -> Result<Rubric, RubricError> {
        self.rubrics.get_rubric(provider, level, task_type).await
    }
}
