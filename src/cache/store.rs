use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::notification::RemovalCause;
use moka::sync::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Default maximum number of entries before size-based eviction.
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    ttl: Duration,
}

/// Expires each entry after its own TTL; a write restarts the clock.
struct PerEntryTtl;

impl Expiry<String, CacheEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Point-in-time counters for a [`ResultCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Bounded key/value store with a TTL per entry.
///
/// Values are opaque JSON documents; use [`ResultCache::get_as`] and
/// [`ResultCache::set_as`] for typed access. Expired entries are never
/// returned. Once `capacity` is reached, moka's TinyLFU policy evicts.
pub struct ResultCache {
    entries: Cache<String, CacheEntry>,
    capacity: u64,
    hits: AtomicU64,
    misses: AtomicU64,
    /// Expired or size-evicted entries, counted by the eviction listener.
    evictions: Arc<AtomicU64>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: u64) -> Self {
        let evictions = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&evictions);
        let entries = Cache::builder()
            .max_capacity(capacity)
            .expire_after(PerEntryTtl)
            .eviction_listener(move |key: Arc<String>, _entry, cause| {
                if matches!(cause, RemovalCause::Expired | RemovalCause::Size) {
                    counter.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %key, ?cause, "evicted cache entry");
                }
            })
            .build();

        Self {
            entries,
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns the value for `key`, or `None` if absent or expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Inserts or replaces `key`, restarting its TTL.
    ///
    /// A zero TTL can never be read back, so it only removes any previous value.
    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        let key = key.into();
        if ttl.is_zero() {
            self.entries.invalidate(&key);
            return;
        }
        self.entries.insert(key, CacheEntry { value, ttl });
    }

    /// Typed [`get`](Self::get). A value that no longer deserializes is dropped.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                debug!(key, error = %e, "cached value has unexpected shape, dropping");
                self.delete(key);
                None
            }
        }
    }

    /// Typed [`set`](Self::set).
    pub fn set_as<T: Serialize>(
        &self,
        key: impl Into<String>,
        value: &T,
        ttl: Duration,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.set(key, value, ttl);
        Ok(())
    }

    /// Removes `key`; returns `true` if a live entry was present.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }

    /// Reclaims expired entries and returns how many were evicted by this sweep.
    pub fn cleanup(&self) -> usize {
        let before = self.evictions.load(Ordering::Acquire);
        self.entries.run_pending_tasks();
        let after = self.evictions.load(Ordering::Acquire);
        after.saturating_sub(before) as usize
    }

    /// Number of stored entries after pending maintenance has run.
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.entries.entry_count())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[derive(Clone)]
/// Shared handle to a [`ResultCache`].
pub struct ResultCacheHandle {
    inner: Arc<ResultCache>,
}

impl ResultCacheHandle {
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ResultCache::new()),
        }
    }

    /// Creates a new handle bounded at `capacity` entries.
    #[inline]
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            inner: Arc::new(ResultCache::with_capacity(capacity)),
        }
    }

    #[inline]
    pub fn capacity(&self) -> u64 {
        self.inner.capacity()
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key)
    }

    #[inline]
    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        self.inner.set(key, value, ttl)
    }

    #[inline]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.inner.get_as(key)
    }

    #[inline]
    pub fn set_as<T: Serialize>(
        &self,
        key: impl Into<String>,
        value: &T,
        ttl: Duration,
    ) -> Result<(), serde_json::Error> {
        self.inner.set_as(key, value, ttl)
    }

    #[inline]
    pub fn delete(&self, key: &str) -> bool {
        self.inner.delete(key)
    }

    #[inline]
    pub fn clear(&self) {
        self.inner.clear()
    }

    #[inline]
    pub fn cleanup(&self) -> usize {
        self.inner.cleanup()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }

    /// Returns the number of strong references to the underlying cache.
    #[inline]
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl Default for ResultCacheHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResultCacheHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCacheHandle")
            .field("entries", &self.inner.entries.entry_count())
            .field("strong_count", &self.strong_count())
            .finish()
    }
}
