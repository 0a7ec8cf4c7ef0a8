use serde::{Deserialize, Serialize};

use super::attempt::TaskType;

/// A threshold → score step within one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Descriptor shown to graders, e.g. `"B2"` or `"Band 4"`.
    pub label: String,
    /// Minimum criterion score that lands in this band.
    pub threshold: f64,
    /// Score awarded for the band.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub max_score: f64,
    #[serde(default)]
    pub bands: Vec<Band>,
}

impl Criterion {
    /// Label of the band with the greatest threshold not above `score`.
    pub fn band_for(&self, score: f64) -> Option<&str> {
        self.bands
            .iter()
            .filter(|band| band.threshold <= score)
            .max_by(|a, b| a.threshold.total_cmp(&b.threshold))
            .map(|band| band.label.as_str())
    }
}

/// Versioned scoring contract for a (provider, level, task) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    pub id: String,
    #[serde(default)]
    pub version: String,
    pub provider: String,
    pub level: String,
    pub task_type: TaskType,
    pub criteria: Vec<Criterion>,
    pub pass_threshold: f64,
}

impl Rubric {
    /// Sum of every criterion's maximum.
    pub fn max_score(&self) -> f64 {
        self.criteria.iter().map(|c| c.max_score).sum()
    }

    pub fn criterion(&self, id: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.id == id)
    }

    /// Returns `true` if this rubric applies to the given triple.
    pub fn matches(&self, provider: &str, level: &str, task_type: TaskType) -> bool {
        self.provider.eq_ignore_ascii_case(provider)
            && self.level.eq_ignore_ascii_case(level)
            && self.task_type == task_type
    }
}
