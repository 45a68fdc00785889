// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Operation metrics for client calls.
//!
//! In-process counters and latency histograms, cheap enough to leave on in a
//! CLI. Names follow `mcp.client.<operation>`.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// Global metrics instance.
pub static GLOBAL_METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// Central metrics collection.
#[derive(Debug)]
pub struct Metrics {
    operations: RwLock<BTreeMap<String, OperationMetrics>>,
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            operations: RwLock::new(BTreeMap::new()),
            start_time: Instant::now(),
        }
    }

    // A panic while holding the lock leaves plain counters behind; keep using them.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, OperationMetrics>> {
        self.operations.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, OperationMetrics>> {
        self.operations.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Record one operation.
    pub fn record_operation(&self, name: &str, duration: Duration, success: bool) {
        let mut ops = self.write();
        let metrics = ops.entry(name.to_string()).or_default();
        metrics.record(duration, success);
    }

    /// Metrics for one operation.
    pub fn operation_metrics(&self, name: &str) -> Option<OperationMetrics> {
        self.read().get(name).cloned()
    }

    /// Time since the collector was created.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Take a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            operations: self.read().clone(),
            uptime: self.uptime(),
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        self.write().clear();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters and latency for one named operation.
#[derive(Debug, Clone)]
pub struct OperationMetrics {
    /// Number of invocations.
    pub count: u64,

    /// Number of failed invocations.
    pub failures: u64,

    /// Total duration.
    pub total_duration: Duration,

    /// Minimum duration.
    pub min_duration: Duration,

    /// Maximum duration.
    pub max_duration: Duration,

    /// Latency distribution.
    pub histogram: Histogram,
}

impl OperationMetrics {
    /// Create empty metrics.
    pub fn new() -> Self {
        Self {
            count: 0,
            failures: 0,
            total_duration: Duration::ZERO,
            min_duration: Duration::MAX,
            max_duration: Duration::ZERO,
            histogram: Histogram::default(),
        }
    }

    /// Record an invocation.
    pub fn record(&mut self, duration: Duration, success: bool) {
        self.count += 1;
        if !success {
            self.failures += 1;
        }
        self.total_duration += duration;
        self.min_duration = self.min_duration.min(duration);
        self.max_duration = self.max_duration.max(duration);
        self.histogram.record(duration);
    }

    /// Average duration.
    pub fn avg_duration(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.count as u32
        }
    }

    /// Success rate (0.0 to 1.0).
    pub fn success_rate(&self) -> f64 {
        if self.count == 0 {
            1.0
        } else {
            (self.count - self.failures) as f64 / self.count as f64
        }
    }
}

impl Default for OperationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple histogram with fixed buckets for latency tracking.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Bucket upper bounds in microseconds.
    buckets: Vec<u64>,

    /// Count per bucket, plus one overflow bucket.
    counts: Vec<u64>,
}

impl Histogram {
    /// Create a histogram with custom bucket boundaries (in microseconds).
    pub fn with_buckets(buckets: Vec<u64>) -> Self {
        let counts = vec![0; buckets.len() + 1];
        Self { buckets, counts }
    }

    /// Record a duration value.
    pub fn record(&mut self, duration: Duration) {
        let micros = duration.as_micros() as u64;
        let idx = self
            .buckets
            .iter()
            .position(|&b| micros <= b)
            .unwrap_or(self.buckets.len());
        self.counts[idx] += 1;
    }

    /// Counts for each bucket.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Approximate percentile (bucket upper bound).
    pub fn percentile(&self, p: f64) -> Duration {
        let total: u64 = self.counts.iter().sum();
        if total == 0 {
            return Duration::ZERO;
        }

        let target = (total as f64 * p / 100.0).ceil() as u64;
        let mut cumulative = 0u64;

        for (i, &count) in self.counts.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                let micros = if i < self.buckets.len() {
                    self.buckets[i]
                } else {
                    self.buckets.last().copied().unwrap_or(0) * 10
                };
                return Duration::from_micros(micros);
            }
        }

        Duration::ZERO
    }

    /// p99 latency.
    pub fn p99(&self) -> Duration {
        self.percentile(99.0)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        // 1ms, 10ms, 100ms, 1s, 10s, 60s
        Self::with_buckets(vec![1_000, 10_000, 100_000, 1_000_000, 10_000_000, 60_000_000])
    }
}

/// Metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Operation metrics by name.
    pub operations: BTreeMap<String, OperationMetrics>,

    /// Uptime when the snapshot was taken.
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Format as a human-readable report.
    pub fn format_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Metrics Report ===\n\n");
        report.push_str(&format!("Uptime: {:.2?}\n", self.uptime));

        if self.operations.is_empty() {
            report.push_str("No operations recorded.\n");
            return report;
        }

        report.push_str("\nOperations:\n");
        for (name, metrics) in &self.operations {
            report.push_str(&format!(
                "  {}: {} calls, {} failed, avg {:.2?}, p99 {:.2?}\n",
                name,
                metrics.count,
                metrics.failures,
                metrics.avg_duration(),
                metrics.histogram.p99()
            ));
        }

        report
    }
}

/// Record an operation to global metrics.
pub fn record_operation(name: &str, duration: Duration, success: bool) {
    GLOBAL_METRICS.record_operation(name, duration, success);
}
