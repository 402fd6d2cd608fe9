//! Retry policy for transient failures
//!
//! A policy is an ordered list of delays. After a failed attempt the next delay
//! is slept and the operation is tried again; once the list is exhausted the
//! last error is returned without a further wait.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Ordered backoff delays, consumed left to right
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    /// Creates a policy from explicit delays
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Creates a policy from delays given in milliseconds
    pub fn from_millis(delays: &[u64]) -> Self {
        Self::new(delays.iter().copied().map(Duration::from_millis).collect())
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    /// The delays slept between attempts
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Total number of attempts this policy allows
    pub fn max_attempts(&self) -> usize {
        self.delays.len() + 1
    }

    /// Runs `op` until it succeeds or the policy is exhausted
    ///
    /// Each attempt calls `op` afresh, so nothing carries over between attempts.
    ///
    /// # Arguments
    ///
    /// * `label` - What is being attempted, for log messages
    /// * `op` - Produces one attempt per call
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The first successful attempt's value
    /// * `Err(E)` - The final attempt's error
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut delays = self.delays.iter();
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) => match delays.next() {
                    Some(delay) => {
                        tracing::warn!(
                            "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                            label,
                            attempt,
                            self.max_attempts(),
                            e,
                            delay
                        );
                        tokio::time::sleep(*delay).await;
                        attempt += 1;
                    }
                    None => return Err(e),
                },
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_millis(&[1000, 5000, 15000])
    }
}
