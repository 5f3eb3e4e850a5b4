//! Metrics export and snapshot functionality

use crate::{ExecutionMetrics, Histogram};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of all metrics at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Transactions that produced a receipt
    pub executed: u64,
    /// Executed transactions that reverted
    pub reverted: u64,
    /// Transactions rejected before execution
    pub rejected: u64,
    /// Clauses run
    pub clauses: u64,
    /// Rejections by reason
    pub rejections: BTreeMap<String, u64>,
    /// Gas-used distribution
    pub gas_used: HistogramSummary,
}

/// Summary of a histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSummary {
    /// Mean value
    pub mean: f64,
    /// Sum of observations
    pub sum: u64,
    /// Total observation count
    pub count: u64,
    /// Per-bucket counts
    pub buckets: Vec<BucketCount>,
}

/// One histogram bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    /// Inclusive upper bound, absent for the overflow bucket
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub le: Option<u64>,
    /// Observations in this bucket
    pub count: u64,
}

impl HistogramSummary {
    /// Summarize a histogram
    pub fn from_histogram(histogram: &Histogram) -> Self {
        Self {
            mean: histogram.mean(),
            sum: histogram.sum(),
            count: histogram.total_count(),
            buckets: histogram
                .buckets()
                .into_iter()
                .map(|(le, count)| BucketCount { le, count })
                .collect(),
        }
    }
}

impl MetricsSnapshot {
    /// Create a snapshot from an [`ExecutionMetrics`] instance
    pub fn from_metrics(metrics: &ExecutionMetrics) -> Self {
        Self {
            executed: metrics.executed(),
            reverted: metrics.reverted(),
            rejected: metrics.rejected(),
            clauses: metrics.clauses(),
            rejections: metrics.all_rejections().into_iter().collect(),
            gas_used: HistogramSummary::from_histogram(metrics.gas_used()),
        }
    }

    /// Export snapshot as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export snapshot as compact JSON string
    pub fn to_json_compact(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
