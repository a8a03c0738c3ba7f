//! Compiled graph: the execution engine
//!
//! A [`CompiledGraph`] is immutable after construction and may be invoked
//! many times, concurrently, with different initial states - each run
//! threads its own fresh state value and the shared structure is never
//! written to.
//!
//! One run is one logical thread of control. The engine starts at the node
//! reachable from START, and repeats: invoke the current node with the state
//! and run config, merge its partial update through the state schema, then
//! evaluate the node's outgoing edges against the post-merge state to pick
//! the next node. Reaching [`END`] stops the run and returns the final
//! state.
//!
//! Cycles are legal - a router may route back to an earlier node - so the
//! engine carries an explicit, caller-configurable step limit rather than
//! guessing. The engine performs no I/O itself; anything a node does
//! (model calls, printing) is opaque to it.

use crate::config::RunConfig;
use crate::error::{GraphError, Result};
use crate::graph::{Edge, Graph, NodeId, END, START};
use crate::state::StateSchema;
use serde_json::Value;
use std::sync::Arc;

/// Default cap on executed steps per run
pub const DEFAULT_STEP_LIMIT: usize = 25;

/// An immutable, executable workflow graph
///
/// Produced by [`StateGraph::compile`](crate::StateGraph::compile).
pub struct CompiledGraph {
    graph: Graph,
    schema: Arc<StateSchema>,
    step_limit: usize,
}

impl CompiledGraph {
    pub(crate) fn new(graph: Graph, schema: Arc<StateSchema>) -> Self {
        Self {
            graph,
            schema,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    /// Cap the number of node executions per run
    ///
    /// Exceeding the cap fails the run with
    /// [`GraphError::StepLimitExceeded`]; progress is never silently
    /// truncated.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    /// The state schema this graph merges updates through
    pub fn schema(&self) -> &Arc<StateSchema> {
        &self.schema
    }

    /// Execute the graph to completion with an empty run configuration
    pub async fn invoke(&self, input: Value) -> Result<Value> {
        self.invoke_with_config(input, RunConfig::new()).await
    }

    /// Execute the graph to completion with caller-supplied options
    ///
    /// `input` supplies the initial field values; undeclared fields are
    /// rejected before any node runs. `config` is read-only for the whole
    /// run and handed to every node.
    #[tracing::instrument(skip(self, input, config), fields(node_count = self.graph.nodes.len()))]
    pub async fn invoke_with_config(&self, input: Value, config: RunConfig) -> Result<Value> {
        tracing::info!("starting graph run");

        let mut state = self.schema.initial(&input)?;
        let mut current: NodeId = START.to_string();
        let mut steps = 0usize;

        loop {
            let next = self.next_node(&current, &state)?;
            if next == END {
                break;
            }

            let node = match self.graph.nodes.get(&next) {
                Some(node) => node,
                // validation checks declared targets; this guards routers
                // returning a name outside their declared branches
                None => {
                    return Err(GraphError::NoRoute {
                        node: current,
                        reason: format!("router returned unknown node '{next}'"),
                    })
                }
            };

            steps += 1;
            if steps > self.step_limit {
                tracing::error!(limit = self.step_limit, node = %next, "step limit exceeded");
                return Err(GraphError::StepLimitExceeded {
                    limit: self.step_limit,
                    node: next,
                });
            }

            tracing::debug!(node = %next, step = steps, "executing node");
            let update = node.run(&state, &config).await.map_err(|source| {
                tracing::error!(node = %next, error = %source, "node execution failed");
                GraphError::NodeExecution {
                    node: next.clone(),
                    source,
                }
            })?;

            state = self.schema.merge(&state, &update)?;
            current = next;
        }

        tracing::info!(steps, "graph run completed");
        Ok(state)
    }

    /// Pick the successor of `current` from its outgoing edges and the
    /// post-merge state.
    fn next_node(&self, current: &str, state: &Value) -> Result<NodeId> {
        let edges = match self.graph.edges_from(current) {
            Some(edges) if !edges.is_empty() => edges,
            _ => {
                return Err(GraphError::NoRoute {
                    node: current.to_string(),
                    reason: "node has no outgoing edges".to_string(),
                })
            }
        };

        if edges.len() > 1 {
            let targets = edges
                .iter()
                .flat_map(|edge| match edge {
                    Edge::Direct(to) => vec![to.clone()],
                    Edge::Conditional { branches, .. } => branches.clone(),
                })
                .collect();
            return Err(GraphError::AmbiguousRouting {
                node: current.to_string(),
                targets,
            });
        }

        match &edges[0] {
            Edge::Direct(to) => Ok(to.clone()),
            Edge::Conditional { router, .. } => {
                let target = router.route(state);
                tracing::debug!(from = %current, to = %target, "conditional route");
                Ok(target)
            }
        }
    }
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("graph", &self.graph)
            .field("schema", &self.schema)
            .field("step_limit", &self.step_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateGraph;
    use crate::state::OverwriteReducer;
    use serde_json::json;

    #[tokio::test]
    async fn two_direct_edges_are_ambiguous_at_runtime() {
        let mut graph = StateGraph::new();
        graph.add_node("a", |_, _| async { Ok(json!({})) });
        graph.add_node("b", |_, _| async { Ok(json!({})) });
        graph.add_node("c", |_, _| async { Ok(json!({})) });
        graph.set_entry("a");
        graph.add_edge("a", "b").add_edge("a", "c");
        graph.add_edge("b", END).add_edge("c", END);

        let compiled = graph.compile().unwrap();
        let err = compiled.invoke(json!({})).await.unwrap_err();
        match err {
            GraphError::AmbiguousRouting { node, targets } => {
                assert_eq!(node, "a");
                assert_eq!(targets, vec!["b".to_string(), "c".to_string()]);
            }
            other => panic!("expected AmbiguousRouting, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dead_end_node_is_no_route() {
        let mut graph = StateGraph::new();
        graph.add_node("a", |_, _| async { Ok(json!({})) });
        graph.set_entry("a");
        // "a" has no outgoing edge

        let compiled = graph.compile().unwrap();
        let err = compiled.invoke(json!({})).await.unwrap_err();
        assert!(matches!(err, GraphError::NoRoute { node, .. } if node == "a"));
    }

    #[tokio::test]
    async fn router_returning_undeclared_node_is_no_route() {
        let mut graph = StateGraph::new();
        graph.add_node("a", |_, _| async { Ok(json!({})) });
        graph.set_entry("a");
        graph.add_conditional_edge("a", |_: &Value| "nowhere".to_string(), [END]);

        let compiled = graph.compile().unwrap();
        let err = compiled.invoke(json!({})).await.unwrap_err();
        match err {
            GraphError::NoRoute { node, reason } => {
                assert_eq!(node, "a");
                assert!(reason.contains("nowhere"));
            }
            other => panic!("expected NoRoute, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn step_limit_breaks_cycles() {
        let mut graph = StateGraph::new();
        graph.add_field("count", Box::new(OverwriteReducer));
        graph.add_node("spin", |state: Value, _| async move {
            let n = state["count"].as_i64().unwrap_or(0);
            Ok(json!({"count": n + 1}))
        });
        graph.set_entry("spin");
        graph.add_conditional_edge("spin", |_: &Value| "spin".to_string(), ["spin"]);

        let compiled = graph.compile().unwrap().with_step_limit(5);
        let err = compiled.invoke(json!({})).await.unwrap_err();
        assert!(matches!(err, GraphError::StepLimitExceeded { limit: 5, .. }));
    }

    #[tokio::test]
    async fn bounded_cycle_terminates_under_limit() {
        let mut graph = StateGraph::new();
        graph.add_field("count", Box::new(OverwriteReducer));
        graph.add_node("spin", |state: Value, _| async move {
            let n = state["count"].as_i64().unwrap_or(0);
            Ok(json!({"count": n + 1}))
        });
        graph.set_entry("spin");
        graph.add_conditional_edge(
            "spin",
            |state: &Value| {
                if state["count"].as_i64().unwrap_or(0) < 3 {
                    "spin".to_string()
                } else {
                    END.to_string()
                }
            },
            ["spin", END],
        );

        let compiled = graph.compile().unwrap();
        let result = compiled.invoke(json!({})).await.unwrap();
        assert_eq!(result["count"], json!(3));
    }

    #[tokio::test]
    async fn undeclared_initial_field_fails_before_any_node_runs() {
        let mut graph = StateGraph::new();
        graph.add_field("declared", Box::new(OverwriteReducer));
        graph.add_node("a", |_, _| async { panic!("must not run") });
        graph.set_entry("a").add_edge("a", END);

        let compiled = graph.compile().unwrap();
        let err = compiled.invoke(json!({"undeclared": 1})).await.unwrap_err();
        assert!(matches!(err, GraphError::State(_)));
    }
}
