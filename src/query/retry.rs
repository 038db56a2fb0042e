//! Retry helper for query-service calls

use crate::query::QueryResult;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Fixed-interval retry schedule for remote reads.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 10,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            backoff,
        }
    }

    /// Schedule that retries without sleeping. Keeps failure-path tests
    /// and local experiments from stalling on wall-clock backoff.
    pub fn no_backoff(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts,
            backoff: Duration::ZERO,
        }
    }
}

/// Runs `op` until it succeeds or the policy is exhausted, sleeping for
/// the backoff interval between attempts. Returns the last error when
/// every attempt fails; the caller decides whether that is fatal.
pub fn with_retry<T, F>(policy: &RetryPolicy, label: &str, mut op: F) -> QueryResult<T>
where
    F: FnMut() -> QueryResult<T>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                debug!(
                    "{} attempt {}/{} failed on partition {}: {}",
                    label,
                    attempt,
                    attempts,
                    e.partition(),
                    e
                );
                if !policy.backoff.is_zero() {
                    thread::sleep(policy.backoff);
                }
            }
        }
    }
}
