//! Request pacing
//!
//! The destination API tolerates roughly three mutations per second. Instead
//! of sprinkling fixed sleeps through the writers, both the clear and create
//! phases go through a [`RateGate`] configured from [`RateLimits`].
//!
//! [`RateLimits`]: crate::config::RateLimits

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Admits callers at a fixed requests-per-second budget.
///
/// The first call passes immediately; each subsequent call waits until the
/// configured interval has elapsed since the previous admission. Admissions
/// are serialized, so the gate also works when shared across tasks.
#[derive(Debug)]
pub struct RateGate {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateGate {
    /// Create a gate admitting `rps` requests per second.
    ///
    /// Non-finite or non-positive budgets disable pacing; config validation
    /// rejects those before a pipeline is ever built.
    pub fn new(rps: f64) -> Self {
        let interval = if rps.is_finite() && rps > 0.0 {
            Duration::from_secs_f64(1.0 / rps)
        } else {
            Duration::ZERO
        };

        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Minimum spacing between admissions.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next open slot, then claim it.
    pub async fn admit(&self) {
        // The lock is held across the sleep so concurrent callers queue up
        // one slot apart instead of all waking at the same instant.
        let mut last = self.last.lock().await;
        let now = Instant::now();

        let ready = match *last {
            Some(prev) => prev + self.interval,
            None => now,
        };

        if ready > now {
            tokio::time::sleep_until(ready).await;
        }

        *last = Some(ready.max(now));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_admission_is_immediate() {
        let gate = RateGate::new(2.0);
        let start = Instant::now();
        gate.admit().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_admissions_are_spaced_by_interval() {
        let gate = RateGate::new(2.0);
        let start = Instant::now();

        gate.admit().await;
        gate.admit().await;
        gate.admit().await;

        // Two waits of 500ms each after the free first slot
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_time_counts_against_the_budget() {
        let gate = RateGate::new(1.0);
        let start = Instant::now();

        gate.admit().await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        gate.admit().await;

        // Only 400ms of the one-second interval remained
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_disables_pacing() {
        let gate = RateGate::new(0.0);
        let start = Instant::now();
        for _ in 0..10 {
            gate.admit().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_interval_from_rps() {
        assert_eq!(RateGate::new(2.0).interval(), Duration::from_millis(500));
        assert_eq!(RateGate::new(f64::NAN).interval(), Duration::ZERO);
    }
}
