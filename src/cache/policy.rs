use std::time::Duration;

use crate::hashing::to_hex;
use crate::model::TaskType;

/// Rubric lookups: 1 hour.
pub const DEFAULT_RUBRIC_TTL_SECS: u64 = 60 * 60;
/// Tenant settings: 30 minutes.
pub const DEFAULT_TENANT_SETTINGS_TTL_SECS: u64 = 30 * 60;
/// Model responses keyed by prompt hash: 24 hours.
pub const DEFAULT_MODEL_RESPONSE_TTL_SECS: u64 = 24 * 60 * 60;

/// TTL per kind of cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub rubric_ttl: Duration,
    pub tenant_settings_ttl: Duration,
    pub model_response_ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            rubric_ttl: Duration::from_secs(DEFAULT_RUBRIC_TTL_SECS),
            tenant_settings_ttl: Duration::from_secs(DEFAULT_TENANT_SETTINGS_TTL_SECS),
            model_response_ttl: Duration::from_secs(DEFAULT_MODEL_RESPONSE_TTL_SECS),
        }
    }
}

pub fn rubric_key(provider: &str, level: &str, task_type: TaskType) -> String {
    format!(
        "rubric:{}:{}:{}",
        provider.to_lowercase(),
        level.to_lowercase(),
        task_type
    )
}

pub fn tenant_settings_key(tenant_id: &str) -> String {
    format!("tenant:{}", tenant_id)
}

pub fn model_response_key(request_hash: &[u8; 32]) -> String {
    format!("model:{}", to_hex(request_hash))
}
