//! Error types for graph construction and execution
//!
//! Configuration-time problems ([`GraphError::Validation`], duplicate reducer
//! registration surfaced through [`StateError`]) abort graph construction
//! entirely; no partial graph is ever produced. Run-time problems abort the
//! run with a tagged error naming the failing node, unless the node itself
//! caught the failure and returned a safe default update.
//!
//! Validation deliberately aggregates every structural problem it finds
//! instead of stopping at the first one, so an interactively built graph
//! reports all its mistakes at once.

use crate::node::NodeError;
use crate::state::StateError;
use thiserror::Error;

/// Convenience result type using [`GraphError`]
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors produced while building or running a workflow graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// Graph structure validation failed at compile time
    ///
    /// Carries every problem found: missing edge targets, a missing or
    /// ambiguous entry path, node names colliding with the START/END
    /// sentinels.
    #[error("graph validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),

    /// State declaration or merging failed
    ///
    /// Covers unknown fields in a node's partial update (fatal to the run)
    /// and duplicate reducer registration (fatal at construction).
    #[error(transparent)]
    State(#[from] StateError),

    /// A node's callable failed and the failure was not recovered
    ///
    /// Emitted after the node's retry policy, if any, is exhausted. The
    /// inner error carries the failure kind.
    #[error("node '{node}' execution failed: {source}")]
    NodeExecution {
        /// Name of the failing node
        node: String,
        /// The underlying failure, classified by kind
        source: NodeError,
    },

    /// More than one outgoing edge matched at run time
    #[error("ambiguous routing from '{node}': multiple outgoing edges ({targets:?})")]
    AmbiguousRouting {
        /// Node whose outgoing edges are ambiguous
        node: String,
        /// All candidate targets
        targets: Vec<String>,
    },

    /// No outgoing edge matched at run time
    #[error("no route from '{node}': {reason}")]
    NoRoute {
        /// Node with no well-defined successor
        node: String,
        /// Why routing failed (no edges, or a router returned an unknown name)
        reason: String,
    },

    /// The run exceeded its configured step limit
    ///
    /// Cycles are legal, so the limit is the caller's explicit guard against
    /// unbounded routing loops. See
    /// [`CompiledGraph::with_step_limit`](crate::CompiledGraph::with_step_limit).
    #[error("step limit of {limit} exceeded at node '{node}'")]
    StepLimitExceeded {
        /// The configured limit
        limit: usize,
        /// Node about to run when the limit was hit
        node: String,
    },
}
