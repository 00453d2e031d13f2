//! Failure-driven flush scheduling.
//!
//! A pure state machine deciding how long the background service sleeps
//! between flush cycles. Consecutive failures grow the delay exponentially
//! up to a ceiling; the first success that actually ships records snaps it
//! back to the floor. Cycles that had nothing to send are idle, not
//! failures, and leave the state untouched.

use std::time::Duration;

/// Kind of the most recent recorded outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No cycle recorded yet, or the last cycle had nothing to ship.
    Idle,
    /// The last cycle shipped at least one record.
    Sent,
    /// The last cycle hit a transport or internal failure.
    Failed,
}

/// Scheduler state: current delay, consecutive-failure count and the kind
/// of the last outcome. Owned exclusively by the background service; no
/// interior mutability, no I/O.
#[derive(Debug)]
pub struct FlushScheduler {
    floor: Duration,
    ceiling: Duration,
    factor: f64,
    delay: Duration,
    consecutive_failures: u32,
    last_outcome: Outcome,
}

impl FlushScheduler {
    #[must_use]
    pub fn new(floor: Duration, ceiling: Duration, factor: f64) -> Self {
        FlushScheduler {
            floor,
            ceiling,
            factor,
            delay: floor,
            consecutive_failures: 0,
            last_outcome: Outcome::Idle,
        }
    }

    /// Delay to sleep before the next flush cycle.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    #[must_use]
    pub fn last_outcome(&self) -> Outcome {
        self.last_outcome
    }

    /// Records a cycle that completed without failure. A nonzero `sent`
    /// resets the delay to the floor; a zero-sent cycle is an idle no-op.
    pub fn record_success(&mut self, sent: usize) {
        if sent > 0 {
            self.delay = self.floor;
            self.consecutive_failures = 0;
            self.last_outcome = Outcome::Sent;
        } else {
            self.last_outcome = Outcome::Idle;
        }
    }

    /// Records a failed cycle and grows the delay.
    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        // Cap the exponent before powi; with factor 2.0 anything past ~60
        // has long hit the ceiling anyway.
        let exponent = self.consecutive_failures.saturating_sub(1).min(100) as i32;
        let raw = self.floor.as_secs_f64() * self.factor.powi(exponent);
        let capped = raw.min(self.ceiling.as_secs_f64());
        self.delay = Duration::from_secs_f64(capped);
        self.last_outcome = Outcome::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> FlushScheduler {
        FlushScheduler::new(Duration::from_secs(1), Duration::from_secs(60), 2.0)
    }

    #[test]
    fn test_initial_state_is_idle_at_floor() {
        let s = scheduler();
        assert_eq!(s.delay(), Duration::from_secs(1));
        assert_eq!(s.consecutive_failures(), 0);
        assert_eq!(s.last_outcome(), Outcome::Idle);
    }

    #[test]
    fn test_failures_grow_exponentially_to_ceiling() {
        let mut s = scheduler();
        let mut previous = s.delay();

        let expected = [1, 2, 4, 8, 16, 32, 60, 60];
        for (i, secs) in expected.into_iter().enumerate() {
            s.record_failure();
            assert_eq!(s.delay(), Duration::from_secs(secs), "failure #{}", i + 1);
            // Monotonically non-decreasing across consecutive failures.
            assert!(s.delay() >= previous);
            previous = s.delay();
        }
        assert_eq!(s.consecutive_failures(), 8);
        assert_eq!(s.last_outcome(), Outcome::Failed);
    }

    #[test]
    fn test_nonzero_success_resets_to_floor() {
        let mut s = scheduler();
        for _ in 0..5 {
            s.record_failure();
        }
        assert!(s.delay() > Duration::from_secs(1));

        s.record_success(3);
        assert_eq!(s.delay(), Duration::from_secs(1));
        assert_eq!(s.consecutive_failures(), 0);
        assert_eq!(s.last_outcome(), Outcome::Sent);
    }

    #[test]
    fn test_zero_sent_is_idle_and_leaves_state_unchanged() {
        let mut s = scheduler();
        s.record_failure();
        s.record_failure();
        let elevated = s.delay();

        s.record_success(0);
        assert_eq!(s.delay(), elevated);
        assert_eq!(s.consecutive_failures(), 2);
        assert_eq!(s.last_outcome(), Outcome::Idle);
    }

    #[test]
    fn test_backoff_restarts_from_floor_after_recovery() {
        let mut s = scheduler();
        s.record_failure();
        s.record_failure();
        s.record_success(1);

        s.record_failure();
        assert_eq!(s.delay(), Duration::from_secs(1));
        s.record_failure();
        assert_eq!(s.delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_many_failures_do_not_overflow() {
        let mut s = scheduler();
        for _ in 0..10_000 {
            s.record_failure();
        }
        assert_eq!(s.delay(), Duration::from_secs(60));
    }
}
