//! Transaction execution counters

use crate::Histogram;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Thread-safe execution metrics, shared between runtimes through an `Arc`
pub struct ExecutionMetrics {
    /// Transactions that produced a receipt
    executed: AtomicU64,
    /// Executed transactions whose receipt is marked reverted
    reverted: AtomicU64,
    /// Transactions rejected before execution
    rejected: AtomicU64,
    /// Clauses run, including the one that failed
    clauses: AtomicU64,
    /// Rejections by reason
    rejections: RwLock<HashMap<String, Arc<AtomicU64>>>,
    /// Gas used per executed transaction
    gas_used: Histogram,
}

impl ExecutionMetrics {
    /// Create a new metrics store
    pub fn new() -> Self {
        Self {
            executed: AtomicU64::new(0),
            reverted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            clauses: AtomicU64::new(0),
            rejections: RwLock::new(HashMap::new()),
            gas_used: Histogram::for_gas(),
        }
    }

    /// Record a transaction that produced a receipt
    pub fn record_executed(&self, gas_used: u64, reverted: bool, clauses: usize) {
        self.executed.fetch_add(1, Ordering::Relaxed);
        if reverted {
            self.reverted.fetch_add(1, Ordering::Relaxed);
        }
        self.clauses.fetch_add(clauses as u64, Ordering::Relaxed);
        self.gas_used.observe(gas_used);
    }

    /// Record a pre-execution rejection
    pub fn record_rejected(&self, reason: &str) {
        self.rejected.fetch_add(1, Ordering::Relaxed);

        let rejections = self.rejections.read();
        if let Some(c) = rejections.get(reason) {
            c.fetch_add(1, Ordering::Relaxed);
            return;
        }
        drop(rejections);

        let mut rejections = self.rejections.write();
        let c = rejections
            .entry(reason.to_string())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)));
        c.fetch_add(1, Ordering::Relaxed);
    }

    /// Transactions that produced a receipt
    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    /// Executed transactions that reverted
    pub fn reverted(&self) -> u64 {
        self.reverted.load(Ordering::Relaxed)
    }

    /// Transactions rejected before execution
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Clauses run
    pub fn clauses(&self) -> u64 {
        self.clauses.load(Ordering::Relaxed)
    }

    /// Rejection count for one reason
    pub fn rejections_for(&self, reason: &str) -> u64 {
        self.rejections
            .read()
            .get(reason)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// All rejection reasons and counts
    pub fn all_rejections(&self) -> Vec<(String, u64)> {
        self.rejections
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }

    /// Gas-used distribution
    pub fn gas_used(&self) -> &Histogram {
        &self.gas_used
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
