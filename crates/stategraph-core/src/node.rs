//! Node abstraction: units of work wrapped by cross-cutting behaviors
//!
//! A node reads the current state and produces a partial update. The engine
//! treats every node through the single-method [`Node`] trait, so the same
//! underlying callable can be used bare, wrapped with a retry policy
//! ([`RetryNode`](crate::retry::RetryNode)), backed by a fallback
//! ([`FallbackNode`]), or fanned out as a parallel aggregate
//! ([`ParallelNode`]) without the engine knowing the difference.
//!
//! Retry and fallback are deliberately independent wrappers: nest them in
//! either order, and precedence is exactly the nesting the caller chose.
//!
//! Failures carry a [`FailureKind`] so retry policies can decide which kinds
//! are worth another attempt. A node that prefers to keep the run alive can
//! catch its own failures and return a conservative default update instead
//! of an error - the engine only sees what the node returns.

use crate::config::RunConfig;
use crate::state::StateSchema;
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Classification of a node failure, used to match retry policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Temporary failure likely to succeed on retry (network hiccup, flaky backend)
    Transient,
    /// The call outlived its deadline
    Timeout,
    /// The backend refused the call due to rate limiting
    RateLimit,
    /// Output could not be parsed into the expected shape
    Parse,
    /// Permanent failure; retrying cannot help
    Fatal,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::Transient => "transient",
            FailureKind::Timeout => "timeout",
            FailureKind::RateLimit => "rate-limit",
            FailureKind::Parse => "parse",
            FailureKind::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// A node callable failed
#[derive(Debug, Clone, Error)]
#[error("{kind} failure: {message}")]
pub struct NodeError {
    /// Failure classification
    pub kind: FailureKind,
    /// Human-readable description
    pub message: String,
}

impl NodeError {
    /// Build an error of the given kind
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Shorthand for a [`FailureKind::Transient`] error
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transient, message)
    }

    /// Shorthand for a [`FailureKind::Parse`] error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Parse, message)
    }

    /// Shorthand for a [`FailureKind::Fatal`] error
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Fatal, message)
    }
}

/// A unit of work in the workflow graph
///
/// Implementations receive the current state and the run configuration, and
/// return a partial update to be merged through the state schema. The
/// callable may block on external calls; the engine simply awaits it.
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute against the current state, returning a partial update
    async fn run(&self, state: &Value, config: &RunConfig) -> Result<Value, NodeError>;
}

/// Future type produced by closure-backed nodes
pub type NodeFuture = Pin<Box<dyn Future<Output = Result<Value, NodeError>> + Send>>;

/// Closure-backed node
///
/// Adapts a plain async function into the [`Node`] interface. The closure
/// receives owned copies of the state and config so its future can be
/// `'static`.
pub struct FnNode {
    f: Arc<dyn Fn(Value, RunConfig) -> NodeFuture + Send + Sync>,
}

impl FnNode {
    /// Wrap an async closure as a node
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, RunConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, NodeError>> + Send + 'static,
    {
        Self {
            f: Arc::new(move |state, config| Box::pin(f(state, config))),
        }
    }
}

#[async_trait]
impl Node for FnNode {
    async fn run(&self, state: &Value, config: &RunConfig) -> Result<Value, NodeError> {
        (self.f)(state.clone(), config.clone()).await
    }
}

/// Node with an alternate to try when the primary fails
///
/// Any failure of the primary, regardless of kind, routes to the fallback.
/// Compose with [`RetryNode`](crate::retry::RetryNode) in whichever order
/// fits: retry-then-fallback retries the primary before switching, while
/// fallback-inside-retry retries the whole pair.
pub struct FallbackNode {
    primary: Arc<dyn Node>,
    fallback: Arc<dyn Node>,
}

impl FallbackNode {
    /// Build a fallback pair
    pub fn new(primary: Arc<dyn Node>, fallback: Arc<dyn Node>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl Node for FallbackNode {
    async fn run(&self, state: &Value, config: &RunConfig) -> Result<Value, NodeError> {
        match self.primary.run(state, config).await {
            Ok(update) => Ok(update),
            Err(error) => {
                tracing::warn!(%error, "primary node failed, running fallback");
                self.fallback.run(state, config).await
            }
        }
    }
}

/// Fixed set of child nodes executed concurrently against one snapshot
///
/// Every child observes the identical, frozen pre-step state. Child outputs
/// are folded into a single partial update in registration order through the
/// schema's reducers, so results stay reproducible even though execution
/// order is not. A child failure fails the aggregate with that child's error.
pub struct ParallelNode {
    children: Vec<(String, Arc<dyn Node>)>,
    schema: Arc<StateSchema>,
}

impl ParallelNode {
    /// Build an aggregate over named children; merge order is the order given
    pub fn new(children: Vec<(String, Arc<dyn Node>)>, schema: Arc<StateSchema>) -> Self {
        Self { children, schema }
    }
}

#[async_trait]
impl Node for ParallelNode {
    async fn run(&self, state: &Value, config: &RunConfig) -> Result<Value, NodeError> {
        let runs = self
            .children
            .iter()
            .map(|(_, child)| child.run(state, config));
        let results = join_all(runs).await;

        let mut combined = Value::Object(Map::new());
        for ((child_name, _), result) in self.children.iter().zip(results) {
            let update = result.map_err(|e| {
                NodeError::new(e.kind, format!("parallel child '{child_name}': {}", e.message))
            })?;
            combined = self.schema.merge(&combined, &update).map_err(|e| {
                NodeError::fatal(format!("merging output of parallel child '{child_name}': {e}"))
            })?;
        }

        Ok(combined)
    }
}
