//! Sliding window of recent probe outcomes.
//!
//! # Responsibilities
//! - Keep the last N probe results in arrival order
//! - Derive aggregate health statistics on demand
//!
//! # Design Decisions
//! - FIFO eviction, O(1) amortized `record`
//! - Statistics are recomputed from contents, never cached
//! - An empty window reads as healthy so a fresh monitor never trips

use std::collections::VecDeque;
use std::time::Duration;

use crate::health::probe::ProbeResult;

/// Aggregate statistics over the current window contents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowSnapshot {
    /// failed / total, 0.0 when empty.
    pub error_rate: f64,
    /// Mean latency over successful probes only, zero when none succeeded.
    pub avg_latency_successful: Duration,
    /// Trailing failures since the most recent success.
    pub consecutive_failures: u32,
    pub sample_count: usize,
}

/// Bounded, arrival-ordered buffer of probe results.
#[derive(Debug, Clone)]
pub struct MetricsWindow {
    results: VecDeque<ProbeResult>,
    capacity: usize,
}

impl MetricsWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            results: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, result: ProbeResult) {
        if self.results.len() == self.capacity {
            self.results.pop_front();
        }
        self.results.push_back(result);
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        let total = self.results.len();
        if total == 0 {
            return WindowSnapshot::default();
        }

        let (successes, latency_sum) = self
            .results
            .iter()
            .filter(|r| r.succeeded)
            .fold((0u32, Duration::ZERO), |(n, sum), r| (n + 1, sum + r.latency));
        let failed = total - successes as usize;

        let avg_latency_successful = if successes == 0 {
            Duration::ZERO
        } else {
            latency_sum / successes
        };

        let consecutive_failures = self
            .results
            .iter()
            .rev()
            .take_while(|r| !r.succeeded)
            .count() as u32;

        WindowSnapshot {
            error_rate: failed as f64 / total as f64,
            avg_latency_successful,
            consecutive_failures,
            sample_count: total,
        }
    }

    /// The most recent `n` results, newest first.
    pub fn recent(&self, n: usize) -> Vec<ProbeResult> {
        self.results.iter().rev().take(n).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
