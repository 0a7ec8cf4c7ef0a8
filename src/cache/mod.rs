//! TTL result cache for rubrics, tenant settings, and model responses.
//!
//! The cache is an explicitly constructed component: build one
//! [`ResultCacheHandle`] per engine (or share one deliberately) and pass it in.
//! Expired entries are never returned; the optional [`CacheSweeper`] only
//! reclaims memory earlier than moka's own housekeeping would.

pub mod policy;
pub mod store;
pub mod sweeper;


pub use policy::{
    CachePolicy, DEFAULT_MODEL_RESPONSE_TTL_SECS, DEFAULT_RUBRIC_TTL_SECS,
    DEFAULT_TENANT_SETTINGS_TTL_SECS, model_response_key, rubric_key, tenant_settings_key,
};
pub use store::{CacheStats, DEFAULT_CACHE_CAPACITY, ResultCache, ResultCacheHandle};
pub use sweeper::{CacheSweeper, DEFAULT_SWEEP_INTERVAL_SECS};
