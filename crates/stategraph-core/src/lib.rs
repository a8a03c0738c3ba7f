//! # stategraph-core - Minimal workflow-graph execution engine
//!
//! Build directed workflows of async nodes over a schema-checked state
//! record, with conditional routing, per-field reducers, and node-level
//! retry.
//!
//! ## Components
//!
//! - [`StateSchema`] - declared state fields, each merged through a
//!   [`Reducer`] ([`OverwriteReducer`] by default, [`AppendReducer`] for
//!   accumulating sequences). Unknown fields are rejected at merge time.
//! - [`Node`] - one async method over a state snapshot and a read-only
//!   [`RunConfig`], returning a partial update. Cross-cutting wrappers
//!   ([`RetryNode`], [`FallbackNode`], [`ParallelNode`]) implement the same
//!   trait and nest freely.
//! - [`StateGraph`] - builder for nodes and edges (fixed or conditional via
//!   a [`Router`]); [`compile`](StateGraph::compile) validates the whole
//!   structure at once and freezes it.
//! - [`CompiledGraph`] - the engine: run node, merge update, route on the
//!   post-merge state, repeat until [`END`]. Immutable and safely reusable
//!   across concurrent runs; cycle bounding is an explicit
//!   [`with_step_limit`](CompiledGraph::with_step_limit) policy.
//!
//! ## Quick start
//!
//! ```rust
//! use stategraph_core::{StateGraph, END, NodeId};
//! use stategraph_core::state::{AppendReducer, OverwriteReducer};
//! use serde_json::{json, Value};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> stategraph_core::Result<()> {
//! let mut graph = StateGraph::new();
//! graph
//!     .add_field("job_description", Box::new(OverwriteReducer))
//!     .add_field("is_suitable", Box::new(OverwriteReducer))
//!     .add_field("application", Box::new(OverwriteReducer));
//!
//! graph.add_node("analyze", |state: Value, _config| async move {
//!     let jd = state["job_description"].as_str().unwrap_or("");
//!     Ok(json!({"is_suitable": jd.len() > 100}))
//! });
//! graph.add_node("generate", |_state, _config| async move {
//!     Ok(json!({"application": "some_fake_application"}))
//! });
//!
//! graph.set_entry("analyze");
//! graph.add_conditional_edge(
//!     "analyze",
//!     |state: &Value| -> NodeId {
//!         if state["is_suitable"].as_bool().unwrap_or(false) {
//!             "generate".into()
//!         } else {
//!             END.into()
//!         }
//!     },
//!     ["generate", END],
//! );
//! graph.add_edge("generate", END);
//!
//! let compiled = graph.compile()?;
//! let result = compiled.invoke(json!({"job_description": "short jd"})).await?;
//! assert!(result.get("application").is_none());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod compiled;
pub mod config;
pub mod error;
pub mod graph;
pub mod node;
pub mod retry;
pub mod state;

pub use builder::StateGraph;
pub use compiled::{CompiledGraph, DEFAULT_STEP_LIMIT};
pub use config::RunConfig;
pub use error::{GraphError, Result};
pub use graph::{Edge, Graph, NodeId, Router, END, START};
pub use node::{FailureKind, FallbackNode, FnNode, Node, NodeError, ParallelNode};
pub use retry::{RetryNode, RetryPolicy};
pub use state::{AppendReducer, OverwriteReducer, Reducer, StateError, StateSchema};
