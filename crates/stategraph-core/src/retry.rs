//! Retry policies and the retry node wrapper
//!
//! A [`RetryPolicy`] describes how many attempts a node gets, how long to
//! wait between them (exponential backoff with optional jitter), and which
//! [`FailureKind`]s are worth retrying at all. [`RetryNode`] applies a
//! policy around any [`Node`] - retry is a cross-cutting wrapper, not logic
//! inside the callable, so the same node can run with or without retry
//! semantics in different graphs.
//!
//! Non-retryable failure kinds propagate immediately and untouched. When
//! attempts are exhausted, the last failure propagates untouched as well.
//!
//! # Examples
//!
//! ```rust
//! use stategraph_core::retry::RetryPolicy;
//! use stategraph_core::node::FailureKind;
//!
//! // Two attempts, transient failures only, no jitter for determinism
//! let policy = RetryPolicy::new(2)
//!     .with_initial_interval(0.01)
//!     .with_jitter(false)
//!     .retry_on(FailureKind::Transient);
//!
//! assert!(policy.is_retryable(FailureKind::Transient));
//! assert!(!policy.is_retryable(FailureKind::Fatal));
//! ```

use crate::config::RunConfig;
use crate::node::{FailureKind, Node, NodeError};
use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for retrying failed node executions
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: usize,

    /// Initial interval between retries in seconds
    pub initial_interval: f64,

    /// Multiplier for the interval after each retry
    pub backoff_factor: f64,

    /// Maximum interval between retries in seconds
    pub max_interval: f64,

    /// Whether to add random jitter to intervals
    pub jitter: bool,

    /// Failure kinds that trigger a retry; all other kinds propagate at once
    pub retry_on: HashSet<FailureKind>,
}

impl RetryPolicy {
    /// Create a policy with the given max attempts
    ///
    /// Defaults: 0.5s initial interval, doubling per attempt, capped at
    /// 128s, with jitter, retrying transient, timeout, and rate-limit
    /// failures.
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            initial_interval: 0.5,
            backoff_factor: 2.0,
            max_interval: 128.0,
            jitter: true,
            retry_on: HashSet::from([
                FailureKind::Transient,
                FailureKind::Timeout,
                FailureKind::RateLimit,
            ]),
        }
    }

    /// Set the initial interval between retries
    pub fn with_initial_interval(mut self, seconds: f64) -> Self {
        self.initial_interval = seconds;
        self
    }

    /// Set the backoff factor
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Set the maximum interval between retries
    pub fn with_max_interval(mut self, seconds: f64) -> Self {
        self.max_interval = seconds;
        self
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replace the retryable set with exactly this kind
    pub fn retry_on(mut self, kind: FailureKind) -> Self {
        self.retry_on = HashSet::from([kind]);
        self
    }

    /// Add a kind to the retryable set
    pub fn also_retry_on(mut self, kind: FailureKind) -> Self {
        self.retry_on.insert(kind);
        self
    }

    /// Whether a failure of this kind should be retried
    pub fn is_retryable(&self, kind: FailureKind) -> bool {
        self.retry_on.contains(&kind)
    }

    /// Whether more attempts remain after `attempts` tries
    pub fn should_retry(&self, attempts: usize) -> bool {
        attempts < self.max_attempts
    }

    /// Delay before the retry following attempt number `attempt` (0-indexed)
    ///
    /// Exponential backoff: `initial_interval * backoff_factor^attempt`,
    /// capped at `max_interval`, with jitter multiplying by a random factor
    /// in 0.5..=1.5 when enabled.
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        let base = self.initial_interval * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_interval);

        let final_delay = if self.jitter {
            let mut rng = rand::thread_rng();
            capped * rng.gen_range(0.5..=1.5)
        } else {
            capped
        };

        Duration::from_secs_f64(final_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Wraps a node with a retry policy
///
/// Executes the inner node; on a retryable failure with attempts remaining,
/// waits per the policy's backoff and tries again. Anything else propagates
/// to the engine, which treats it as fatal for the run.
pub struct RetryNode {
    inner: Arc<dyn Node>,
    policy: RetryPolicy,
}

impl RetryNode {
    /// Wrap a node with the given policy
    pub fn new(inner: Arc<dyn Node>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl Node for RetryNode {
    async fn run(&self, state: &Value, config: &RunConfig) -> Result<Value, NodeError> {
        let mut attempts = 0;
        loop {
            match self.inner.run(state, config).await {
                Ok(update) => return Ok(update),
                Err(error) => {
                    attempts += 1;
                    if !self.policy.is_retryable(error.kind) || !self.policy.should_retry(attempts) {
                        return Err(error);
                    }
                    let delay = self.policy.calculate_delay(attempts - 1);
                    tracing::debug!(
                        attempt = attempts,
                        max_attempts = self.policy.max_attempts,
                        ?delay,
                        %error,
                        "node failed, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
