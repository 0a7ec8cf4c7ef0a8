//! Performance recorder: named durations, percentile statistics, and the
//! dashboard view consumed by external monitoring.

pub mod dashboard;
pub mod recorder;


pub use dashboard::{
    Alert, AlertKind, DashboardData, DashboardSummary, HIGH_AVERAGE_ALERT_MS, HIGH_P95_ALERT_MS,
};
pub use recorder::{
    DEFAULT_RECORDER_CAPACITY, DEFAULT_SLOW_THRESHOLD_MS, Measurement, OperationStats,
    PerformanceRecorder, percentile,
};
