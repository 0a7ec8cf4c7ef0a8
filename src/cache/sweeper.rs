use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time;
use tracing::debug;

use super::store::ResultCacheHandle;

/// Default interval between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5 * 60;

/// Periodically calls [`ResultCacheHandle::cleanup`] on a background task.
pub struct CacheSweeper {
    cache: ResultCacheHandle,
    interval: Duration,
    running: AtomicBool,
    /// Stop flag of the task spawned by the latest `start`.
    stop_requested: Mutex<Arc<AtomicBool>>,
}

impl CacheSweeper {
    pub fn new(cache: ResultCacheHandle, interval: Duration) -> Self {
        Self {
            cache,
            interval,
            running: AtomicBool::new(false),
            stop_requested: Mutex::new(Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts the sweep task (no-op if already running).
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        let mut current = self.stop_requested.lock();
        // AcqRel: only one caller may observe `false` and spawn the task.
        if self.running.swap(true, Ordering::AcqRel) {
            return tokio::spawn(async {});
        }
        let stop_requested = Arc::new(AtomicBool::new(false));
        *current = Arc::clone(&stop_requested);
        drop(current);

        let cache = self.cache.clone();
        let period = self.interval;

        tokio::spawn(async move {
            let mut interval = time::interval(period);
            // The first tick completes immediately; skip it so the first sweep
            // happens one period after start.
            interval.tick().await;
            loop {
                interval.tick().await;
                if stop_requested.load(Ordering::Acquire) {
                    break;
                }
                let removed = cache.cleanup();
                if removed > 0 {
                    debug!(removed, remaining = cache.len(), "cache sweep");
                }
            }
        })
    }

    /// Asks the current task to exit at its next tick. A later `start` spawns
    /// a fresh task even if the old one has not exited yet.
    pub fn stop(&self) {
        let current = self.stop_requested.lock();
        current.store(true, Ordering::Release);
        self.running.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for CacheSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSweeper")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}
