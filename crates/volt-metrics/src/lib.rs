//! # volt-metrics
//!
//! Execution metrics for Volt.
//!
//! Features:
//! - Counters for executed, reverted and rejected transactions
//! - Rejection counts by reason
//! - Gas-used histogram
//! - JSON export

#![warn(missing_docs)]
#![warn(clippy::all)]

mod histogram;
mod collector;
mod export;

pub use histogram::Histogram;
pub use collector::ExecutionMetrics;
pub use export::{BucketCount, HistogramSummary, MetricsSnapshot};
