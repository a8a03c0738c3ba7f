//! Graph structure: nodes, edges, routers, and structural validation
//!
//! A [`Graph`] is the raw directed structure behind a workflow: named nodes
//! connected by fixed or conditional edges, bracketed by the [`START`] and
//! [`END`] sentinels. It is normally assembled through
//! [`StateGraph`](crate::StateGraph) and frozen into a
//! [`CompiledGraph`](crate::CompiledGraph); compilation runs
//! [`Graph::validate`], which collects every structural problem instead of
//! stopping at the first - interactive graph building benefits from seeing
//! all mistakes at once.

use crate::node::Node;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Node identifier - unique name for each node in the graph
pub type NodeId = String;

/// Sentinel marking where execution begins
pub const START: &str = "__start__";

/// Sentinel marking successful termination
pub const END: &str = "__end__";

/// Selects the next node from the post-merge state
///
/// A router returns either a node name or [`END`]. Implemented for any
/// matching closure, so tutorials-style condition functions plug in
/// directly.
pub trait Router: Send + Sync {
    /// Inspect the state and pick the next node (or [`END`])
    fn route(&self, state: &Value) -> NodeId;
}

impl<F> Router for F
where
    F: Fn(&Value) -> NodeId + Send + Sync,
{
    fn route(&self, state: &Value) -> NodeId {
        self(state)
    }
}

/// Directed connection out of a node
#[derive(Clone)]
pub enum Edge {
    /// Unconditional transition to a specific node (or [`END`])
    Direct(NodeId),

    /// Dynamic transition chosen by a router at run time
    Conditional {
        /// Router invoked with the post-merge state
        router: Arc<dyn Router>,
        /// Every target the router may return, for validation
        branches: Vec<NodeId>,
    },
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edge::Direct(to) => f.debug_tuple("Direct").field(to).finish(),
            Edge::Conditional { branches, .. } => f
                .debug_struct("Conditional")
                .field("router", &"<function>")
                .field("branches", branches)
                .finish(),
        }
    }
}

/// Raw workflow structure: nodes plus outgoing edges per node
#[derive(Default)]
pub struct Graph {
    /// All nodes mapped by their unique IDs
    pub nodes: HashMap<NodeId, Arc<dyn Node>>,

    /// Outgoing edges per source node (START included)
    pub edges: HashMap<NodeId, Vec<Edge>>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.nodes.keys().collect();
        names.sort_unstable();
        f.debug_struct("Graph")
            .field("nodes", &names)
            .field("edges", &self.edges)
            .finish()
    }
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node under a unique ID
    pub fn add_node(&mut self, id: NodeId, node: Arc<dyn Node>) {
        self.nodes.insert(id, node);
    }

    /// Add a fixed edge between two nodes
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        self.edges.entry(from).or_default().push(Edge::Direct(to));
    }

    /// Add a conditional edge with its router and declared branch targets
    pub fn add_conditional_edge(&mut self, from: NodeId, router: Arc<dyn Router>, branches: Vec<NodeId>) {
        self.edges
            .entry(from)
            .or_default()
            .push(Edge::Conditional { router, branches });
    }

    /// Outgoing edges of a node, if any
    pub fn edges_from(&self, node: &str) -> Option<&[Edge]> {
        self.edges.get(node).map(Vec::as_slice)
    }

    fn target_exists(&self, target: &str) -> bool {
        target == END || self.nodes.contains_key(target)
    }

    /// Validate the structure, returning every problem found
    ///
    /// Checks:
    /// - no node is named [`START`] or [`END`]
    /// - [`START`] has exactly one outgoing path
    /// - every edge source is a known node (or [`START`])
    /// - every direct target and every declared branch target exists (or is [`END`])
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut problems = Vec::new();

        for name in self.nodes.keys() {
            if name == START || name == END {
                problems.push(format!("node name '{name}' collides with a reserved sentinel"));
            }
        }

        match self.edges.get(START).map(Vec::len).unwrap_or(0) {
            1 => {}
            0 => problems.push(format!("START has no outgoing path; call set_entry or add_edge(\"{START}\", ...)")),
            n => problems.push(format!("START must have exactly one outgoing path, found {n}")),
        }

        let mut sources: Vec<&String> = self.edges.keys().collect();
        sources.sort_unstable();
        for from in sources {
            if from != START && !self.nodes.contains_key(from) {
                problems.push(format!("edge source '{from}' does not exist"));
            }
            for edge in &self.edges[from] {
                match edge {
                    Edge::Direct(to) => {
                        if !self.target_exists(to) {
                            problems.push(format!("edge target '{to}' (from '{from}') does not exist"));
                        }
                    }
                    Edge::Conditional { branches, .. } => {
                        if branches.is_empty() {
                            problems.push(format!(
                                "conditional edge from '{from}' declares no branch targets"
                            ));
                        }
                        for to in branches {
                            if !self.target_exists(to) {
                                problems.push(format!(
                                    "branch target '{to}' (from '{from}') does not exist"
                                ));
                            }
                        }
                    }
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}
