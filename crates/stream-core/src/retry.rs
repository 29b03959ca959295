//! Retry policy for store operations.
//!
//! Exponential backoff: `initial_backoff_ms * multiplier^(attempt - 1)`,
//! capped at `max_backoff_ms`. Only transient store errors are retried.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            backoff_multiplier: 2.0,
            max_backoff_ms: 2000,
        }
    }
}

impl RetryPolicy {
    /// Policy that never waits, for tests and dry runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            backoff_multiplier: 1.0,
            max_backoff_ms: 0,
        }
    }

    /// Delay after the given failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let backoff = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_millis(backoff.min(self.max_backoff_ms as f64) as u64)
    }

    /// Whether an error on the given attempt should be retried.
    pub fn should_retry(&self, error: &StoreError, attempt: u32) -> bool {
        error.is_transient() && attempt < self.max_attempts
    }

    /// Run an operation, retrying transient failures with backoff.
    pub fn run<T>(
        &self,
        operation: &str,
        mut op: impl FnMut() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(error) if self.should_retry(&error, attempt) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "Retrying after transient store error"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> StoreError {
        StoreError::Transient {
            message: "busy".to_string(),
        }
    }

    #[test]
    fn test_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff_ms, 100);
        assert_eq!(policy.max_backoff_ms, 2000);
    }

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(10), Duration::from_millis(2000));
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(&transient(), 1));
        assert!(policy.should_retry(&transient(), 2));
        assert!(!policy.should_retry(&transient(), 3));
        let rejected = StoreError::Rejected {
            reason: "bad".to_string(),
        };
        assert!(!policy.should_retry(&rejected, 1));
    }

    #[test]
    fn test_run_recovers_from_transient_errors() {
        let policy = RetryPolicy::immediate(3);
        let mut calls = 0;
        let result = policy.run("persist", || {
            calls += 1;
            if calls < 3 { Err(transient()) } else { Ok(calls) }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_run_gives_up_after_max_attempts() {
        let policy = RetryPolicy::immediate(2);
        let mut calls = 0;
        let result: Result<(), _> = policy.run("persist", || {
            calls += 1;
            Err(transient())
        });
        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls, 2);
    }
}
