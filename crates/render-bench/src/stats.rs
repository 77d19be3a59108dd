//! Aggregation of a result bucket into summary statistics
//!
//! Percentiles use the nearest-rank method on ascending durations:
//! `index = floor(p * count)`, clamped to `[0, count - 1]`. Values are always
//! observed samples, never interpolated.

use crate::types::ResultBucket;
use serde::{Deserialize, Serialize};

/// Statistics derived from a bucket with at least one successful sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub successes: usize,
    pub failures: usize,
    /// successes / (successes + failures), in [0, 1]
    pub success_rate: f64,
    pub mean_duration_ms: f64,
    pub min_duration_ms: f64,
    pub max_duration_ms: f64,
    pub p50_duration_ms: f64,
    pub p90_duration_ms: f64,
    /// Signed mean of heap deltas, bytes
    pub mean_heap_delta_bytes: f64,
    /// Signed mean of native (RSS) deltas, bytes
    pub mean_native_delta_bytes: f64,
}

/// Why a backend has no statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EmptyReason {
    /// Every attempted iteration failed
    NoSuccessfulSamples,
    /// The backend never ran: its output location or setup failed
    InfrastructureFailure { cause: String },
}

/// Marker for a backend without any successful sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyResult {
    pub reason: EmptyReason,
    pub attempts: usize,
    pub failures: usize,
}

impl EmptyResult {
    pub fn infrastructure(cause: impl Into<String>) -> Self {
        Self {
            reason: EmptyReason::InfrastructureFailure { cause: cause.into() },
            attempts: 0,
            failures: 0,
        }
    }
}

/// Per-backend result as reported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum BackendSummary {
    Stats(SummaryStats),
    Empty(EmptyResult),
}

impl BackendSummary {
    pub fn stats(&self) -> Option<&SummaryStats> {
        match self {
            BackendSummary::Stats(stats) => Some(stats),
            BackendSummary::Empty(_) => None,
        }
    }

    pub fn empty(&self) -> Option<&EmptyResult> {
        match self {
            BackendSummary::Stats(_) => None,
            BackendSummary::Empty(empty) => Some(empty),
        }
    }
}

/// Nearest-rank percentile of ascending `sorted` values, `None` when empty
///
/// `p` is a fraction in [0, 1].
pub fn nearest_rank_percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let rank = (p * sorted.len() as f64).floor();
    let index = if rank.is_finite() && rank > 0.0 {
        (rank as usize).min(sorted.len() - 1)
    } else {
        0
    };
    Some(sorted[index])
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let count = values.len() as f64;
    values.sum::<f64>() / count
}

/// Reduce a bucket to statistics, or an empty marker when nothing succeeded
pub fn summarize(bucket: &ResultBucket) -> BackendSummary {
    let successes = bucket.success_count();
    let failures = bucket.failure_count();

    if successes == 0 {
        return BackendSummary::Empty(EmptyResult {
            reason: EmptyReason::NoSuccessfulSamples,
            attempts: bucket.attempts(),
            failures,
        });
    }

    let mut sorted = bucket.durations_ms().to_vec();
    sorted.sort_by(f64::total_cmp);

    let deltas = bucket.memory_deltas();

    BackendSummary::Stats(SummaryStats {
        successes,
        failures,
        success_rate: successes as f64 / (successes + failures) as f64,
        mean_duration_ms: mean(bucket.durations_ms().iter().copied()),
        min_duration_ms: sorted[0],
        max_duration_ms: sorted[sorted.len() - 1],
        p50_duration_ms: nearest_rank_percentile(&sorted, 0.50).unwrap_or_default(),
        p90_duration_ms: nearest_rank_percentile(&sorted, 0.90).unwrap_or_default(),
        mean_heap_delta_bytes: mean(deltas.iter().map(|d| d.heap_bytes as f64)),
        mean_native_delta_bytes: mean(deltas.iter().map(|d| d.native_bytes as f64)),
    })
}
