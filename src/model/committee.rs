use serde::{Deserialize, Serialize};

fn default_weight() -> f64 {
    1.0
}

/// One scorer in the committee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeMember {
    pub model: String,
    /// Backend provider name; selects the adapter in the scorer registry.
    pub provider: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Relative weight. Non-negative; normalized at aggregation time.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl CommitteeMember {
    pub fn new(model: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            provider: provider.into(),
            temperature: 0.0,
            seed: None,
            weight: 1.0,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the weight; negative or non-finite weights become 0.
    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        self
    }
}

/// Ordered scorer list supplied with each scoring call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitteeConfig {
    pub members: Vec<CommitteeMember>,
}

impl CommitteeConfig {
    pub fn new(members: Vec<CommitteeMember>) -> Self {
        Self { members }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Weight of the member at `index`; negative or non-finite weights count as 0.
    ///
    /// An index outside the committee weighs 1.0.
    pub fn weight_at(&self, index: usize) -> f64 {
        self.members
            .get(index)
            .map(|m| if m.weight.is_finite() { m.weight.max(0.0) } else { 0.0 })
            .unwrap_or(1.0)
    }
}
