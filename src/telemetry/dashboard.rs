use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use super::recorder::{OperationStats, PerformanceRecorder, duration_ms};

/// Alert when an operation's p95 exceeds this many milliseconds.
pub const HIGH_P95_ALERT_MS: f64 = 10_000.0;
/// Alert when an operation's average exceeds this many milliseconds.
pub const HIGH_AVERAGE_ALERT_MS: f64 = 5_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    HighP95,
    HighAverage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub operation: String,
    pub kind: AlertKind,
    pub value_ms: f64,
    pub threshold_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_measurements: usize,
    pub operation_count: usize,
    pub avg_duration_ms: f64,
    pub slow_measurements: usize,
}

/// Snapshot for the monitoring surface: `{summary, operations, alerts}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardData {
    pub window_secs: Option<u64>,
    pub summary: DashboardSummary,
    pub operations: BTreeMap<String, OperationStats>,
    pub alerts: Vec<Alert>,
}

impl PerformanceRecorder {
    /// Builds the dashboard over measurements recorded within `window`
    /// (all retained measurements when `None`).
    pub fn dashboard(&self, window: Option<Duration>) -> DashboardData {
        let measurements = self.measurements(window);
        let slow_threshold = self.slow_threshold_value();

        let mut samples: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut slow_measurements = 0;
        for m in &measurements {
            if m.duration >= slow_threshold {
                slow_measurements += 1;
            }
            samples
                .entry(m.name.clone())
                .or_default()
                .push(duration_ms(m.duration));
        }

        let total_ms: f64 = samples.values().flatten().sum();
        let avg_duration_ms = if measurements.is_empty() {
            0.0
        } else {
            total_ms / measurements.len() as f64
        };

        let operations: BTreeMap<String, OperationStats> = samples
            .into_iter()
            .filter_map(|(name, values)| OperationStats::from_samples(values).map(|s| (name, s)))
            .collect();

        let mut alerts = Vec::new();
        for (name, stats) in &operations {
            if stats.p95_ms > HIGH_P95_ALERT_MS {
                alerts.push(Alert {
                    operation: name.clone(),
                    kind: AlertKind::HighP95,
                    value_ms: stats.p95_ms,
                    threshold_ms: HIGH_P95_ALERT_MS,
                });
            }
            if stats.avg_ms > HIGH_AVERAGE_ALERT_MS {
                alerts.push(Alert {
                    operation: name.clone(),
                    kind: AlertKind::HighAverage,
                    value_ms: stats.avg_ms,
                    threshold_ms: HIGH_AVERAGE_ALERT_MS,
                });
            }
        }

        DashboardData {
            window_secs: window.map(|w| w.as_secs()),
            summary: DashboardSummary {
                total_measurements: measurements.len(),
                operation_count: operations.len(),
                avg_duration_ms,
                slow_measurements,
            },
            operations,
            alerts,
        }
    }
}
