//! Node-local clock abstraction.
//!
//! Every node owns its own clock with an arbitrary epoch; no two nodes are
//! synchronized. Timestamps are 32-bit milliseconds and wrap, so durations
//! must always go through [`delta_ms`] (or equivalent wrapping subtraction)
//! and only ever between readings of the *same* clock.

use std::time::Instant;

use tokio::time::{Duration, sleep_until};

/// A monotonically non-decreasing local clock with millisecond resolution.
///
/// Injected into every component rather than read from a global, so tests
/// control time and cross-node comparisons stay explicit.
pub trait ClockSource: Send + Sync {
    /// Milliseconds since this node's arbitrary epoch, wrapping at `u32::MAX`.
    fn now_ms(&self) -> u32;
}

/// Wall-clock-backed [`ClockSource`] with the node's start as epoch.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for MonotonicClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wraparound: the counter rolls over every ~49.7 days.
        self.epoch.elapsed().as_millis() as u32
    }
}

/// Wraparound-safe difference between two readings of the same clock.
///
/// Tolerates a single wrap of the underlying counter; never an error.
pub fn delta_ms(earlier: u32, later: u32) -> u32 {
    later.wrapping_sub(earlier)
}

/// Fixed-rate deadline pacing.
///
/// Advances the deadline by exactly one period per wait, so a slow iteration
/// does not shift the schedule — the next tick comes sooner instead. This is
/// the async form of the sampler's "wait until clock ≥ next deadline" loop;
/// a generic sleep would accumulate drift.
#[derive(Debug)]
pub struct Cadence {
    next: tokio::time::Instant,
    period: Duration,
}

impl Cadence {
    /// Start a cadence whose first deadline is one period from now.
    pub fn new(period: Duration) -> Self {
        Self { next: tokio::time::Instant::now() + period, period }
    }

    /// Wait until the next deadline, then advance it by one period.
    pub async fn wait(&mut self) {
        sleep_until(self.next).await;
        self.next += self.period;
    }
}
