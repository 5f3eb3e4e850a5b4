//! Fixed-bucket histogram for gas amounts

use std::sync::atomic::{AtomicU64, Ordering};

/// Histogram over `u64` observations
pub struct Histogram {
    /// Inclusive upper bounds, ascending
    bounds: Vec<u64>,
    /// Counts per bound, plus one overflow bucket at the end
    counts: Vec<AtomicU64>,
    /// Sum of all values
    sum: AtomicU64,
    /// Total count
    count: AtomicU64,
}

impl Histogram {
    /// Buckets sized for transaction gas, from a bare transfer up to a full block
    pub fn for_gas() -> Self {
        Self::with_bounds(vec![
            21_000, 50_000, 100_000, 250_000, 500_000, 1_000_000, 2_500_000, 5_000_000, 10_000_000,
        ])
    }

    /// Create histogram with custom bounds
    pub fn with_bounds(mut bounds: Vec<u64>) -> Self {
        bounds.sort_unstable();
        bounds.dedup();
        let counts = (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect();
        Histogram {
            bounds,
            counts,
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record a value
    pub fn observe(&self, value: u64) {
        // saturate rather than wrap once the sum is out of range
        let _ = self
            .sum
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |sum| Some(sum.saturating_add(value)));
        self.count.fetch_add(1, Ordering::Relaxed);

        let index = self.bounds.partition_point(|bound| *bound < value);
        self.counts[index].fetch_add(1, Ordering::Relaxed);
    }

    /// Get mean value
    pub fn mean(&self) -> f64 {
        let count = self.count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.sum.load(Ordering::Relaxed) as f64 / count as f64
    }

    /// Sum of observations
    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    /// Get total count
    pub fn total_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// `(upper bound, count)` per bucket; the overflow bucket has no bound
    pub fn buckets(&self) -> Vec<(Option<u64>, u64)> {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, count)| (self.bounds.get(i).copied(), count.load(Ordering::Relaxed)))
            .collect()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::for_gas()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucketing_is_inclusive() {
        let h = Histogram::with_bounds(vec![10, 100]);
        h.observe(10);
        h.observe(11);
        h.observe(100);
        h.observe(1000);
        assert_eq!(h.buckets(), vec![(Some(10), 1), (Some(100), 2), (None, 1)]);
        assert_eq!(h.total_count(), 4);
        assert_eq!(h.sum(), 1121);
    }

    #[test]
    fn test_mean() {
        let h = Histogram::for_gas();
        assert_eq!(h.mean(), 0.0);
        h.observe(100);
        h.observe(200);
        assert_eq!(h.mean(), 150.0);
    }

    #[test]
    fn test_sum_saturates() {
        let h = Histogram::with_bounds(vec![]);
        h.observe(u64::MAX);
        h.observe(5);
        assert_eq!(h.sum(), u64::MAX);
        assert_eq!(h.buckets(), vec![(None, 2)]);
    }
}
