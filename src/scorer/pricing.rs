//! Per-model token pricing used to estimate judgment cost.
//!
//! Prices change over time and differ per deployment, so the table is always
//! loaded from configuration. Unknown models cost nothing.

use std::collections::HashMap;
use std::path::Path;

use async_openai::types::chat::CompletionUsage;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// USD per 1 000 tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrice {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PricingTable {
    prices: HashMap<String, ModelPrice>,
}

impl PricingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, model: impl Into<String>, price: ModelPrice) -> Self {
        self.prices.insert(model.into(), price);
        self
    }

    /// Parses a JSON object of `model -> {input_per_1k, output_per_1k}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&raw).map_err(|e| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn price(&self, model: &str) -> Option<&ModelPrice> {
        self.prices.get(model)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Estimated USD cost of one call; 0.0 for unknown models or missing usage.
    pub fn estimate(&self, model: &str, usage: Option<&CompletionUsage>) -> f64 {
        match (self.price(model), usage) {
            (Some(price), Some(usage)) => {
                (usage.prompt_tokens as f64 / 1000.0) * price.input_per_1k
                    + (usage.completion_tokens as f64 / 1000.0) * price.output_per_1k
            }
            _ => 0.0,
        }
    }
}
