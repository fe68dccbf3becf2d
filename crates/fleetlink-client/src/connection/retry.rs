//! Connect retry policy

use fleetlink_common::ClientConfig;
use std::time::Duration;

/// Exponential backoff between connect attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one
    pub initial_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// Delay before retry number `retry` (1-based)
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.initial_delay.saturating_mul(1 << exponent)
    }

    /// Sum of every delay when all retries are used
    #[must_use]
    pub fn total_delay(&self) -> Duration {
        (1..=self.max_retries).map(|retry| self.delay_for(retry)).sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self::new(config.max_connect_retries, config.initial_connect_backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (1..=5).map(|n| policy.delay_for(n).as_secs()).collect();
        assert_eq!(delays, vec![2, 4, 8, 16, 32]);
        assert_eq!(policy.total_delay(), Duration::from_secs(62));
    }

    #[test]
    fn test_zero_retries_has_no_delay() {
        let policy = RetryPolicy::new(0, Duration::from_secs(2));
        assert_eq!(policy.total_delay(), Duration::ZERO);
    }
}
