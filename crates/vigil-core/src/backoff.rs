//! Randomized, linearly growing retry delays.
//!
//! Thousands of independent checks may retry against one scheduler
//! control plane at once; fixed delays would synchronize them. Each
//! attempt waits `attempt × uniform(min, max)` seconds, so delays grow in
//! expectation while staying decorrelated across invocations.

use rand::Rng;
use std::time::Duration;

/// Delay schedule for retry loops.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    min_delay_secs: f64,
    max_delay_secs: f64,
}

impl Backoff {
    pub fn new(min_delay_secs: f64, max_delay_secs: f64) -> Self {
        Self {
            min_delay_secs,
            max_delay_secs,
        }
    }

    /// Delay before `attempt` (0-based). The first attempt never waits.
    pub fn delay(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let base = rand::thread_rng().gen_range(self.min_delay_secs..=self.max_delay_secs);
        Duration::from_secs_f64(attempt as f64 * base)
    }
}
