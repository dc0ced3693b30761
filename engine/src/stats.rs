//! Running recall / latency accumulator
//!
//! [`RunningStats`] is folded once per scored query and never rolled back.
//! Means are maintained incrementally, so memory stays constant in the number
//! of queries; the latency histogram has a fixed footprint too.

use std::time::{Duration, Instant};

use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// Point-in-time view used for per-query progress output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub count: u64,
    pub recall: f64,
    pub qps: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyMetrics {
    pub min_us: u64,
    pub mean_us: f64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Final aggregate for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub scenario: String,
    pub queries: u64,
    pub mean_recall: f64,
    /// `queries / Σ latency`
    pub qps: f64,
    /// `queries / wall-clock run time`; exceeds `qps` under concurrency
    pub wall_qps: f64,
    pub wall_secs: f64,
    pub latency: LatencyMetrics,
}

pub struct RunningStats {
    count: u64,
    recall_sum: f64,
    latency_sum: Duration,
    mean_recall: f64,
    mean_latency_secs: f64,
    histogram: Histogram<u64>,
    started: Instant,
}

impl RunningStats {
    pub fn new() -> Result<Self> {
        let histogram = Histogram::new(3)
            .map_err(|e| BenchError::config(format!("latency histogram: {e}")))?;
        Ok(Self {
            count: 0,
            recall_sum: 0.0,
            latency_sum: Duration::ZERO,
            mean_recall: 0.0,
            mean_latency_secs: 0.0,
            histogram,
            started: Instant::now(),
        })
    }

    /// Fold one query's score and latency.
    pub fn record(&mut self, score: f64, elapsed: Duration) {
        self.count += 1;
        let n = self.count as f64;

        self.recall_sum += score;
        self.latency_sum += elapsed;
        self.mean_recall += (score - self.mean_recall) / n;
        self.mean_latency_secs += (elapsed.as_secs_f64() - self.mean_latency_secs) / n;

        self.histogram.saturating_record(elapsed.as_micros() as u64);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean_recall(&self) -> f64 {
        self.mean_recall
    }

    pub fn mean_latency(&self) -> Duration {
        Duration::from_secs_f64(self.mean_latency_secs)
    }

    pub fn total_latency(&self) -> Duration {
        self.latency_sum
    }

    /// Cumulative recall over all folded queries.
    pub fn recall_sum(&self) -> f64 {
        self.recall_sum
    }

    /// Latency-derived throughput: queries per second of summed query time.
    pub fn qps(&self) -> f64 {
        let secs = self.latency_sum.as_secs_f64();
        if secs > 0.0 {
            self.count as f64 / secs
        } else {
            0.0
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            count: self.count,
            recall: self.mean_recall,
            qps: self.qps(),
        }
    }

    pub fn finalize(&self, scenario: impl Into<String>) -> RunSummary {
        self.finalize_with_wall(scenario, self.started.elapsed())
    }

    pub fn finalize_with_wall(&self, scenario: impl Into<String>, wall: Duration) -> RunSummary {
        let wall_secs = wall.as_secs_f64();
        let wall_qps = if wall_secs > 0.0 {
            self.count as f64 / wall_secs
        } else {
            0.0
        };

        let latency = if self.count == 0 {
            LatencyMetrics {
                min_us: 0,
                mean_us: 0.0,
                p50_us: 0,
                p95_us: 0,
                p99_us: 0,
                max_us: 0,
            }
        } else {
            LatencyMetrics {
                min_us: self.histogram.min(),
                mean_us: self.mean_latency_secs * 1e6,
                p50_us: self.histogram.value_at_quantile(0.50),
                p95_us: self.histogram.value_at_quantile(0.95),
                p99_us: self.histogram.value_at_quantile(0.99),
                max_us: self.histogram.max(),
            }
        };

        RunSummary {
            scenario: scenario.into(),
            queries: self.count,
            mean_recall: self.mean_recall,
            qps: self.qps(),
            wall_qps,
            wall_secs,
            latency,
        }
    }
}

impl std::fmt::Debug for RunningStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningStats")
            .field("count", &self.count)
            .field("mean_recall", &self.mean_recall)
            .field("latency_sum", &self.latency_sum)
            .finish()
    }
}
