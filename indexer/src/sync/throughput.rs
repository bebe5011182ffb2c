//! Rolling throughput estimator over the last N batches.

use std::collections::VecDeque;
use std::time::Duration;

/// Tracks `(blocks, elapsed)` pairs for the last `window` batches and
/// reports an average blocks/second rate.
#[derive(Debug)]
pub struct ThroughputEstimator {
    window: usize,
    samples: VecDeque<(i64, Duration)>,
}

impl ThroughputEstimator {
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self { window, samples: VecDeque::with_capacity(window) }
    }

    pub fn record(&mut self, blocks: i64, elapsed: Duration) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back((blocks, elapsed));
    }

    #[must_use]
    pub fn blocks_per_second(&self) -> f64 {
        let total_blocks: i64 = self.samples.iter().map(|(b, _)| b).sum();
        let total_secs: f64 = self.samples.iter().map(|(_, d)| d.as_secs_f64()).sum();
        if total_secs <= 0.0 {
            0.0
        } else {
            total_blocks as f64 / total_secs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_over_window() {
        let mut est = ThroughputEstimator::new(2);
        est.record(100, Duration::from_secs(1));
        est.record(100, Duration::from_secs(1));
        est.record(100, Duration::from_secs(1)); // evicts the first sample
        assert!((est.blocks_per_second() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn zero_elapsed_is_zero_rate() {
        let est = ThroughputEstimator::new(5);
        assert_eq!(est.blocks_per_second(), 0.0);
    }
}
