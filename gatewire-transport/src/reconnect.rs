/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Reconnection policy with exponential backoff and jitter.
//!
//! Implements full jitter: each delay is drawn uniformly between zero
//! and the exponentially growing cap, bounded by the maximum backoff
//! and the attempt budget.

use rand::Rng;
use std::time::Duration;

/// Reconnection policy with exponential backoff and full jitter.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Initial backoff duration.
    initial_backoff: Duration,
    /// Maximum backoff duration.
    max_backoff: Duration,
    /// Backoff multiplier.
    multiplier: f64,
    /// Maximum attempts before giving up.
    max_attempts: u32,
    /// Current attempt count.
    current_attempt: u32,
}

impl ReconnectPolicy {
    /// Creates a policy with custom parameters.
    ///
    /// # Arguments
    /// * `initial_backoff` - First delay cap
    /// * `max_backoff` - Upper bound for any delay
    /// * `multiplier` - Growth factor per attempt
    /// * `max_attempts` - Attempt budget
    #[must_use]
    pub const fn new(
        initial_backoff: Duration,
        max_backoff: Duration,
        multiplier: f64,
        max_attempts: u32,
    ) -> Self {
        Self {
            initial_backoff,
            max_backoff,
            multiplier,
            max_attempts,
            current_attempt: 0,
        }
    }

    /// Calculates the next backoff duration with jitter.
    ///
    /// Returns `None` when the attempt budget is exhausted.
    #[must_use]
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.current_attempt >= self.max_attempts {
            return None;
        }

        let base_ms = self.initial_backoff.as_millis() as f64;
        let exponential = base_ms
            * self
                .multiplier
                .powi(i32::try_from(self.current_attempt).unwrap_or(i32::MAX));
        let capped = exponential.min(self.max_backoff.as_millis() as f64);

        let jitter = if capped > 0.0 {
            rand::rng().random_range(0.0..capped)
        } else {
            0.0
        };

        self.current_attempt += 1;
        Some(Duration::from_millis(jitter as u64))
    }

    /// Resets the policy after a successful logon.
    pub const fn reset(&mut self) {
        self.current_attempt = 0;
    }

    /// Returns the current attempt count.
    #[must_use]
    pub const fn current_attempt(&self) -> u32 {
        self.current_attempt
    }

    /// Returns the attempt budget.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns true if another attempt is allowed.
    #[must_use]
    pub const fn should_reconnect(&self) -> bool {
        self.current_attempt < self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            multiplier: 2.0,
            max_attempts: 10,
            current_attempt: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_default() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.current_attempt(), 0);
        assert_eq!(policy.max_attempts(), 10);
        assert!(policy.should_reconnect());
    }

    #[test]
    fn test_next_backoff_grows() {
        let mut policy = ReconnectPolicy::new(
            Duration::from_millis(100),
            Duration::from_secs(10),
            2.0,
            5,
        );

        let first = policy.next_backoff().unwrap();
        assert!(first <= Duration::from_millis(100));

        let second = policy.next_backoff().unwrap();
        assert!(second <= Duration::from_millis(200));

        assert_eq!(policy.current_attempt(), 2);
    }

    #[test]
    fn test_max_backoff_cap() {
        let mut policy =
            ReconnectPolicy::new(Duration::from_secs(1), Duration::from_secs(5), 10.0, 10);

        for _ in 0..5 {
            let backoff = policy.next_backoff().unwrap();
            assert!(backoff <= Duration::from_secs(5));
        }
    }

    #[test]
    fn test_budget_exhausted() {
        let mut policy = ReconnectPolicy::new(
            Duration::from_millis(100),
            Duration::from_secs(1),
            2.0,
            3,
        );

        assert!(policy.next_backoff().is_some());
        assert!(policy.next_backoff().is_some());
        assert!(policy.next_backoff().is_some());
        assert!(policy.next_backoff().is_none());
        assert!(!policy.should_reconnect());
    }

    #[test]
    fn test_reset() {
        let mut policy = ReconnectPolicy::new(
            Duration::from_millis(100),
            Duration::from_secs(1),
            2.0,
            3,
        );

        let _ = policy.next_backoff();
        let _ = policy.next_backoff();
        assert_eq!(policy.current_attempt(), 2);

        policy.reset();
        assert_eq!(policy.current_attempt(), 0);
        assert!(policy.should_reconnect());
    }
}
