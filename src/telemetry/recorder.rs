use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Number of measurements retained before the oldest are evicted.
pub const DEFAULT_RECORDER_CAPACITY: usize = 10_000;
/// Measurements at or above this duration are logged as slow.
pub const DEFAULT_SLOW_THRESHOLD_MS: u64 = 5_000;

/// One recorded duration.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub name: String,
    pub duration: Duration,
    pub recorded_at: Instant,
    pub metadata: HashMap<String, Value>,
}

/// Aggregate statistics for one operation name, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationStats {
    pub count: usize,
    pub total_ms: f64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl OperationStats {
    /// Computes stats from unsorted millisecond samples; `None` when empty.
    pub fn from_samples(mut samples: Vec<f64>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        samples.sort_by(f64::total_cmp);

        let count = samples.len();
        let total_ms: f64 = samples.iter().sum();
        Some(Self {
            count,
            total_ms,
            avg_ms: total_ms / count as f64,
            min_ms: samples[0],
            max_ms: samples[count - 1],
            p50_ms: percentile(&samples, 0.50),
            p95_ms: percentile(&samples, 0.95),
            p99_ms: percentile(&samples, 0.99),
        })
    }
}

/// Value at index `floor(len * p)` of an ascending slice, clamped to the last element.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((sorted.len() as f64) * p).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

#[derive(Default)]
struct RecorderState {
    timers: HashMap<String, Instant>,
    measurements: VecDeque<Measurement>,
}

/// Records named durations into a bounded ring and computes statistics.
///
/// Safe to share across concurrent scoring calls.
pub struct PerformanceRecorder {
    state: Mutex<RecorderState>,
    capacity: usize,
    slow_threshold: Duration,
}

impl PerformanceRecorder {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RECORDER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(RecorderState::default()),
            capacity: capacity.max(1),
            slow_threshold: Duration::from_millis(DEFAULT_SLOW_THRESHOLD_MS),
        }
    }

    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Starts (or restarts) the timer for `op_id`.
    ///
    /// At most `capacity` timers are pending; beyond that the oldest one is
    /// abandoned.
    pub fn start_timer(&self, op_id: impl Into<String>) {
        let op_id = op_id.into();
        let mut state = self.state.lock();
        if state.timers.len() >= self.capacity && !state.timers.contains_key(&op_id) {
            let oldest = state
                .timers
                .iter()
                .min_by_key(|(_, started)| **started)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                state.timers.remove(&oldest);
                warn!(op_id = %oldest, "abandoning timer that was never ended");
            }
        }
        state.timers.insert(op_id, Instant::now());
    }

    /// Stops the timer for `op_id` and records it under `name`.
    ///
    /// An unknown `op_id` is logged and yields [`Duration::ZERO`] without recording.
    pub fn end_timer(
        &self,
        op_id: &str,
        name: &str,
        metadata: HashMap<String, Value>,
    ) -> Duration {
        let started = self.state.lock().timers.remove(op_id);
        match started {
            Some(started) => {
                let duration = started.elapsed();
                self.record(name, duration, metadata);
                duration
            }
            None => {
                warn!(op_id, name, "end_timer called without matching start_timer");
                Duration::ZERO
            }
        }
    }

    /// Records a measurement, evicting the oldest once capacity is reached.
    pub fn record(&self, name: &str, duration: Duration, metadata: HashMap<String, Value>) {
        if duration >= self.slow_threshold {
            warn!(
                operation = name,
                duration_ms = duration.as_millis() as u64,
                threshold_ms = self.slow_threshold.as_millis() as u64,
                "slow operation"
            );
        }

        let measurement = Measurement {
            name: name.to_string(),
            duration,
            recorded_at: Instant::now(),
            metadata,
        };

        let mut state = self.state.lock();
        while state.measurements.len() >= self.capacity {
            state.measurements.pop_front();
        }
        state.measurements.push_back(measurement);
    }

    /// Statistics for `name` over the retained measurements, optionally limited
    /// to those recorded within `window`.
    pub fn stats(&self, name: &str, window: Option<Duration>) -> Option<OperationStats> {
        let samples = {
            let state = self.state.lock();
            let cutoff = window.and_then(|w| Instant::now().checked_sub(w));
            state
                .measurements
                .iter()
                .filter(|m| m.name == name)
                .filter(|m| cutoff.is_none_or(|c| m.recorded_at >= c))
                .map(|m| duration_ms(m.duration))
                .collect::<Vec<_>>()
        };
        OperationStats::from_samples(samples)
    }

    /// Distinct operation names currently retained, sorted.
    pub fn operation_names(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .measurements
            .iter()
            .map(|m| m.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Clones of the retained measurements within `window`, oldest first.
    pub fn measurements(&self, window: Option<Duration>) -> Vec<Measurement> {
        let state = self.state.lock();
        let cutoff = window.and_then(|w| Instant::now().checked_sub(w));
        state
            .measurements
            .iter()
            .filter(|m| cutoff.is_none_or(|c| m.recorded_at >= c))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().measurements.is_empty()
    }

    /// Number of timers started but not yet ended.
    pub fn pending_timers(&self) -> usize {
        self.state.lock().timers.len()
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.measurements.clear();
        state.timers.clear();
    }

    pub(crate) fn slow_threshold_value(&self) -> Duration {
        self.slow_threshold
    }
}

impl Default for PerformanceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PerformanceRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceRecorder")
            .field("capacity", &self.capacity)
            .field("measurements", &self.len())
            .finish()
    }
}

#[inline]
pub(crate) fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
