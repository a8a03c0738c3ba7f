//! StateGraph - the builder API for workflow graphs
//!
//! [`StateGraph`] collects state field declarations, nodes, and edges, then
//! freezes them into a [`CompiledGraph`] via [`compile`](StateGraph::compile).
//! Compilation is the single configuration-time gate: duplicate field
//! registration fails there, and structural validation reports every problem
//! it finds in one [`GraphError::Validation`].
//!
//! # Examples
//!
//! The tutorial job-application flow:
//!
//! ```rust
//! use stategraph_core::{StateGraph, END, NodeId};
//! use stategraph_core::state::{AppendReducer, OverwriteReducer};
//! use serde_json::{json, Value};
//!
//! # fn build() -> stategraph_core::Result<stategraph_core::CompiledGraph> {
//! let mut graph = StateGraph::new();
//! graph
//!     .add_field("job_description", Box::new(OverwriteReducer))
//!     .add_field("is_suitable", Box::new(OverwriteReducer))
//!     .add_field("application", Box::new(OverwriteReducer))
//!     .add_field("actions", Box::new(AppendReducer));
//!
//! graph.add_node("analyze", |state: Value, _config| async move {
//!     let long_enough = state["job_description"].as_str().unwrap_or("").len() > 100;
//!     Ok(json!({"is_suitable": long_enough, "actions": ["action1"]}))
//! });
//! graph.add_node("generate", |_state, _config| async move {
//!     Ok(json!({"application": "some_fake_application", "actions": ["action2"]}))
//! });
//!
//! graph.set_entry("analyze");
//! graph.add_conditional_edge(
//!     "analyze",
//!     |state: &Value| -> NodeId {
//!         if state["is_suitable"].as_bool().unwrap_or(false) {
//!             "generate".to_string()
//!         } else {
//!             END.to_string()
//!         }
//!     },
//!     ["generate", END],
//! );
//! graph.add_edge("generate", END);
//!
//! graph.compile()
//! # }
//! # build().unwrap();
//! ```

use crate::compiled::CompiledGraph;
use crate::config::RunConfig;
use crate::error::{GraphError, Result};
use crate::graph::{Graph, NodeId, Router, START};
use crate::node::{FallbackNode, FnNode, Node, NodeError, ParallelNode};
use crate::retry::{RetryNode, RetryPolicy};
use crate::state::{Reducer, StateSchema};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

enum NodePlan {
    Single(Arc<dyn Node>),
    Parallel(Vec<(String, Arc<dyn Node>)>),
}

/// Builder for workflow graphs
///
/// Mutating methods return `&mut Self` for chaining; [`compile`](Self::compile)
/// consumes the builder.
#[derive(Default)]
pub struct StateGraph {
    fields: Vec<(String, Box<dyn Reducer>)>,
    nodes: HashMap<NodeId, NodePlan>,
    graph: Graph,
}

impl StateGraph {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a state field with its reducer
    ///
    /// Duplicate declarations are rejected at [`compile`](Self::compile)
    /// time with [`StateError::DuplicateReducer`](crate::state::StateError).
    pub fn add_field(&mut self, name: impl Into<String>, reducer: Box<dyn Reducer>) -> &mut Self {
        self.fields.push((name.into(), reducer));
        self
    }

    /// Add a node backed by an async closure
    ///
    /// The closure receives the current state and the run configuration and
    /// returns a partial update.
    pub fn add_node<F, Fut>(&mut self, id: impl Into<NodeId>, f: F) -> &mut Self
    where
        F: Fn(Value, RunConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, NodeError>> + Send + 'static,
    {
        self.add_node_object(id, Arc::new(FnNode::new(f)))
    }

    /// Add a closure-backed node wrapped with a retry policy
    pub fn add_node_with_retry<F, Fut>(
        &mut self,
        id: impl Into<NodeId>,
        f: F,
        policy: RetryPolicy,
    ) -> &mut Self
    where
        F: Fn(Value, RunConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, NodeError>> + Send + 'static,
    {
        let inner: Arc<dyn Node> = Arc::new(FnNode::new(f));
        self.add_node_object(id, Arc::new(RetryNode::new(inner, policy)))
    }

    /// Add any [`Node`] implementation directly
    ///
    /// Use this for pre-wrapped nodes (retry, fallback, or custom
    /// implementations of the trait).
    pub fn add_node_object(&mut self, id: impl Into<NodeId>, node: Arc<dyn Node>) -> &mut Self {
        self.nodes.insert(id.into(), NodePlan::Single(node));
        self
    }

    /// Add a node that falls back to an alternate when the primary fails
    pub fn add_fallback_node(
        &mut self,
        id: impl Into<NodeId>,
        primary: Arc<dyn Node>,
        fallback: Arc<dyn Node>,
    ) -> &mut Self {
        self.add_node_object(id, Arc::new(FallbackNode::new(primary, fallback)))
    }

    /// Add a node that runs a fixed set of children concurrently
    ///
    /// Children all observe the same frozen state snapshot; their outputs
    /// merge in the order given here. The aggregate is wired up at compile
    /// time, once the state schema is final.
    pub fn add_parallel_node(
        &mut self,
        id: impl Into<NodeId>,
        children: Vec<(String, Arc<dyn Node>)>,
    ) -> &mut Self {
        self.nodes.insert(id.into(), NodePlan::Parallel(children));
        self
    }

    /// Add a fixed edge between two nodes (or [`START`]/[`END`](crate::END))
    pub fn add_edge(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> &mut Self {
        self.graph.add_edge(from.into(), to.into());
        self
    }

    /// Add a conditional edge with a router and its possible targets
    ///
    /// The router is invoked with the post-merge state and returns a node
    /// name or [`END`](crate::END). `branches` declares every name the
    /// router may return so compilation can check they exist.
    pub fn add_conditional_edge<R>(
        &mut self,
        from: impl Into<NodeId>,
        router: R,
        branches: impl IntoIterator<Item = impl Into<NodeId>>,
    ) -> &mut Self
    where
        R: Router + 'static,
    {
        self.graph.add_conditional_edge(
            from.into(),
            Arc::new(router),
            branches.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Designate the entry node; shorthand for `add_edge(START, node)`
    pub fn set_entry(&mut self, node: impl Into<NodeId>) -> &mut Self {
        self.graph.add_edge(START.to_string(), node.into());
        self
    }

    /// Freeze the builder into an executable graph
    ///
    /// Builds the state schema, wires parallel aggregates against it, and
    /// validates the structure.
    ///
    /// # Errors
    ///
    /// - [`GraphError::State`] on duplicate field registration
    /// - [`GraphError::Validation`] listing every structural problem found
    pub fn compile(self) -> Result<CompiledGraph> {
        let mut schema = StateSchema::new();
        for (name, reducer) in self.fields {
            schema.add_field(name, reducer)?;
        }
        let schema = Arc::new(schema);

        let mut graph = self.graph;
        for (id, plan) in self.nodes {
            let node: Arc<dyn Node> = match plan {
                NodePlan::Single(node) => node,
                NodePlan::Parallel(children) => {
                    Arc::new(ParallelNode::new(children, schema.clone()))
                }
            };
            graph.add_node(id, node);
        }

        graph.validate().map_err(GraphError::Validation)?;

        Ok(CompiledGraph::new(graph, schema))
    }
}
