//! Bounded retry with degrade-to-missing fallback
//!
//! One bad tag or range must never abort a multi-tag bulk job. The
//! [`RetryingFetcher`] wraps a single tag+range+interval retrieval in an
//! explicit state machine: transient failures are retried with exponential
//! backoff up to the policy budget, fatal failures stop retrying
//! immediately, and either terminal failure degrades to an all-NaN series
//! sized to the time grid — the caller always gets a correctly sized column.
//!
//! Every retry attempt and every terminal degradation emits a `tracing`
//! event; that is the only observability surface this layer owns.

use crate::connection::HistorianConnection;
use crate::error::{FetchError, Result};
use crate::grid::TimeGrid;
use crate::types::{RawValue, SamplingInterval, TagHandle, TimeRange};
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy with exponential backoff
///
/// Controls how many times a transient failure is retried and how long to
/// wait between attempts.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    /// Default: 3
    pub max_attempts: u32,

    /// Delay before the first retry
    /// Default: 100ms
    pub initial_delay: Duration,

    /// Upper bound on any single delay
    /// Default: 5 seconds
    pub max_delay: Duration,

    /// Multiplier for exponential backoff
    /// Default: 2.0
    pub multiplier: f64,

    /// Add random jitter to delays
    /// Default: true
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Calculate delay before the retry following `attempt` (1-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let base_delay =
            self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent as i32);

        let delay_ms = base_delay.min(self.max_delay.as_millis() as f64);

        let final_delay = if self.jitter {
            // up to 25% jitter
            let jitter = rand::random::<f64>() * 0.25;
            delay_ms * (1.0 + jitter)
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay as u64)
    }

    /// Whether another attempt is allowed after `attempt` attempts were made
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Fetch progress states
///
/// The retry-then-degrade control flow is modelled explicitly rather than
/// through exception-style early returns, so every transition is visible and
/// testable.
#[derive(Debug, Clone, PartialEq)]
enum FetchState {
    /// Attempt number `n` (1-indexed) is about to run
    Attempting(u32),
    /// The historian returned data
    Succeeded(Vec<RawValue>),
    /// Retry budget exhausted or fatal failure; fall back to all-missing
    Degraded,
}

/// Retrying wrapper around a single-tag interpolated retrieval
pub struct RetryingFetcher<'c> {
    conn: &'c dyn HistorianConnection,
    policy: RetryPolicy,
}

impl<'c> RetryingFetcher<'c> {
    /// Create a fetcher over `conn` with the given retry policy
    pub fn new(conn: &'c dyn HistorianConnection, policy: RetryPolicy) -> Self {
        Self { conn, policy }
    }

    /// Fetch one tag's series, coerced to numeric, NaN for missing
    ///
    /// The returned series matches the time grid length whenever the fetch
    /// degrades; on success the historian's own response length is returned
    /// untouched (the assembler verifies it against the grid).
    ///
    /// # Errors
    ///
    /// Only structural errors from grid generation surface here. Transient
    /// and fatal historian failures are absorbed into the NaN fallback.
    pub fn fetch(
        &self,
        handle: &TagHandle,
        range: &TimeRange,
        interval: &SamplingInterval,
    ) -> Result<Vec<f64>> {
        let expected = TimeGrid::generate(range, interval)?.len();

        let mut state = FetchState::Attempting(1);
        loop {
            state = match state {
                FetchState::Attempting(attempt) => {
                    match self.conn.interpolated_values(handle, range, interval) {
                        Ok(values) => {
                            debug!(
                                tag = %handle.name,
                                attempt,
                                points = values.len(),
                                "interpolated fetch succeeded"
                            );
                            FetchState::Succeeded(values)
                        }
                        Err(FetchError::Transient(reason)) => {
                            if self.policy.should_retry(attempt) {
                                let delay = self.policy.delay_for_attempt(attempt);
                                warn!(
                                    tag = %handle.name,
                                    attempt,
                                    max_attempts = self.policy.max_attempts,
                                    delay_ms = delay.as_millis() as u64,
                                    %reason,
                                    "transient historian failure, retrying"
                                );
                                std::thread::sleep(delay);
                                FetchState::Attempting(attempt + 1)
                            } else {
                                warn!(
                                    tag = %handle.name,
                                    attempts = attempt,
                                    %reason,
                                    "retry budget exhausted, degrading to missing"
                                );
                                FetchState::Degraded
                            }
                        }
                        Err(FetchError::Fatal(reason)) => {
                            warn!(
                                tag = %handle.name,
                                attempt,
                                %reason,
                                "fatal historian failure, degrading to missing"
                            );
                            FetchState::Degraded
                        }
                    }
                }
                FetchState::Succeeded(values) => {
                    return Ok(values.iter().map(RawValue::to_f64).collect());
                }
                FetchState::Degraded => {
                    return Ok(vec![f64::NAN; expected]);
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_exponentially_without_jitter() {
        let policy = RetryPolicy {
            jitter: false,
            ..Default::default()
        };
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn delay_is_capped_at_max() {
        let policy = RetryPolicy {
            jitter: false,
            max_delay: Duration::from_millis(250),
            ..Default::default()
        };
        assert_eq!(policy.delay_for_attempt(5), Duration::from_millis(250));
    }

    #[test]
    fn jitter_stays_within_a_quarter_of_base() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let delay = policy.delay_for_attempt(1);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(125));
        }
    }

    #[test]
    fn budget_allows_exactly_max_attempts() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }
}
