//! Bounded retry policy for feed downloads.

use std::time::Duration;

/// Statuses the provider returns while overloaded or mid-deploy.
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// How many times, how long, and on which statuses a fetch is retried.
///
/// The delay before retry `n` (1-based) is `backoff_factor * 2^(n-1)`,
/// so the defaults wait 0.5s, 1s, 2s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    /// Base delay of the exponential schedule.
    pub backoff_factor: Duration,
    /// HTTP statuses that are worth another attempt.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: Duration::from_millis(500),
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// Same statuses and budget, no waiting. Meant for tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff_factor: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Whether `status` should be retried.
    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Delay before the given 1-based retry.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        self.backoff_factor.saturating_mul(1u32 << exp)
    }
}
