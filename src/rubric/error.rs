use std::path::PathBuf;

use thiserror::Error;

use crate::model::TaskType;

#[derive(Debug, Error)]
pub enum RubricError {
    #[error("no rubric for provider '{provider}', level '{level}', task '{task_type}'")]
    NotFound {
        provider: String,
        level: String,
        task_type: TaskType,
    },

    #[error("failed to read rubrics from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rubrics from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl RubricError {
    pub fn not_found(provider: &str, level: &str, task_type: TaskType) -> Self {
        RubricError::NotFound {
            provider: provider.to_string(),
            level: level.to_string(),
            task_type,
        }
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, RubricError::NotFound { .. })
    }
}
