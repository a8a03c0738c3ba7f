//! Chat-model backend boundary and the deterministic fake backend
//!
//! The engine never talks to a model itself; nodes do, through the
//! [`ChatModel`] trait. [`FakeChatModel`] is the test double: it yields a
//! scripted sequence of completions and can raise failures on a schedule,
//! which is how the retry and fallback paths get exercised without a
//! network.

use crate::message::Prompt;
use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

/// Failures a model backend can raise
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The backend failed to produce a completion
    #[error("model backend error: {0}")]
    Backend(String),

    /// The backend refused the call due to rate limiting
    #[error("rate limited: {0}")]
    RateLimited(String),
}

/// A chat-model backend: formatted prompt in, text completion out
///
/// May be a real network-backed service or a deterministic stub. The
/// engine-facing contract is only this method; everything else (auth,
/// transport, model selection) lives behind the implementation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce a completion for the prompt
    async fn invoke(&self, prompt: &Prompt) -> Result<String, ModelError>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Deterministic scripted backend for tests
///
/// Successful calls return responses from the script in order, cycling once
/// exhausted. With a failure period `n`, every call whose 1-based index is
/// not a multiple of `n` raises a backend error - `with_failure_period(2)`
/// reproduces the classic fixture that fails on odd-numbered calls and
/// succeeds on even-numbered ones.
pub struct FakeChatModel {
    responses: Vec<String>,
    failure_period: Option<usize>,
    calls: Mutex<usize>,
}

impl FakeChatModel {
    /// Script a sequence of completions
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            failure_period: None,
            calls: Mutex::new(0),
        }
    }

    /// Fail every call except those whose 1-based index is a multiple of `period`
    pub fn with_failure_period(mut self, period: usize) -> Self {
        self.failure_period = Some(period.max(1));
        self
    }

    /// How many times the backend has been invoked
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl ChatModel for FakeChatModel {
    async fn invoke(&self, _prompt: &Prompt) -> Result<String, ModelError> {
        let call = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls
        };

        if let Some(period) = self.failure_period {
            if call % period != 0 {
                tracing::debug!(call, period, "fake model failing on schedule");
                return Err(ModelError::Backend("something went wrong".to_string()));
            }
        }

        if self.responses.is_empty() {
            return Err(ModelError::Backend("no scripted responses".to_string()));
        }

        let successes = match self.failure_period {
            Some(period) => call / period,
            None => call,
        };
        Ok(self.responses[(successes - 1) % self.responses.len()].clone())
    }

    fn name(&self) -> &str {
        "fake"
    }
}
