use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::error::RubricError;
use super::source::RubricSource;
use crate::cache::{DEFAULT_RUBRIC_TTL_SECS, ResultCacheHandle, rubric_key};
use crate::model::{Rubric, TaskType};

/// Read-through cache in front of another [`RubricSource`].
///
/// Misses are not cached, so a rubric added upstream is visible on the next call.
pub struct CachedRubricSource<S> {
    inner: S,
    cache: ResultCacheHandle,
    ttl: Duration,
}

impl<S: RubricSource> CachedRubricSource<S> {
    pub fn new(inner: S, cache: ResultCacheHandle) -> Self {
        Self {
            inner,
            cache,
            ttl: Duration::from_secs(DEFAULT_RUBRIC_TTL_SECS),
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: RubricSource> RubricSource for CachedRubricSource<S> {
    async fn get_rubric(
        &self,
        provider: &str,
        level: &str,
        task_type: TaskType,
    ) -> Result<Rubric, RubricError> {
        let key = rubric_key(provider, level, task_type);
        if let Some(rubric) = self.cache.get_as::<Rubric>(&key) {
            debug!(key = %key, "rubric cache hit");
            return Ok(rubric);
        }

        let rubric = self.inner.get_rubric(provider, level, task_type).await?;
        if let Err(e) = self.cache.set_as(key, &rubric, self.ttl) {
            warn!(rubric_id = %rubric.id, error = %e, "failed to cache rubric");
        }
        Ok(rubric)
    }
}

impl<S> std::fmt::Debug for CachedRubricSource<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedRubricSource")
            .field("cache_entries", &self.cache.len())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
