//! Core graph data structures
//!
//! A [`Graph`] is the static topology of a control loop: named nodes, each with
//! exactly one outgoing edge, where an edge is either a fixed successor or a
//! routing decision with a label → successor map. Cycles are first-class - the
//! topology is an adjacency structure, not call-stack recursion, so a
//! self-correction loop can run for many iterations without growing the stack.
//!
//! ```text
//! entry ──▶ ┌─────────┐   Direct          ┌─────────┐
//!           │ node A  │ ────────────────▶ │ node B  │
//!           └─────────┘                   └─────────┘
//!                ▲                             │ Conditional
//!                │        "retry"              │ "done"
//!                └─────────────────────────────┼──────▶ END
//! ```
//!
//! Graphs are usually built through [`StateGraph`](crate::StateGraph), which
//! layers duplicate detection and typed routing outcomes on top of this raw
//! structure. The raw API here is string-labelled and unchecked until
//! [`Graph::validate`] runs; a router that returns a label missing from its
//! branch map is only caught at run time, as
//! [`GraphError::UnknownRouteOutcome`](crate::error::GraphError::UnknownRouteOutcome).

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use futures::future::BoxFuture;

/// Node identifier - unique name for each node in the graph.
pub type NodeId = String;

/// Special node identifier marking graph termination.
///
/// `END` is a virtual node: it never executes, and reaching it via an edge or
/// a routing outcome ends the run. It is the only way a run terminates
/// normally.
pub const END: &str = "__end__";

/// Boxed error type produced by node and router functions.
///
/// Collaborator failures (network errors, malformed judgments) cross the node
/// boundary as this type and are wrapped into
/// [`GraphError::NodeExecution`](crate::error::GraphError::NodeExecution) by
/// the engine - never silently absorbed.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Node function: an async transformation of the shared state.
///
/// Each node consumes the current state and returns the updated state (or an
/// error). Side effects such as retrieval or model calls happen inside the
/// function; the engine only sequences them.
pub type NodeFn<S> =
    Arc<dyn Fn(S) -> BoxFuture<'static, Result<S, BoxError>> + Send + Sync>;

/// Router function consulted at a decision point.
///
/// Receives a snapshot of the state and returns the outcome label selecting
/// the next node. Routers read state but never mutate it - the engine passes a
/// clone and discards it after the label is produced.
pub type RouterFn<S> =
    Arc<dyn Fn(S) -> BoxFuture<'static, Result<String, BoxError>> + Send + Sync>;

/// Edge type defining the transition out of a node.
pub enum Edge<S> {
    /// Unconditional transition to a single node (or [`END`]).
    Direct(NodeId),

    /// Routed transition: the router is invoked on the current state and its
    /// label is looked up in `branches` to pick the successor.
    Conditional {
        /// Decision function returning an outcome label.
        router: RouterFn<S>,
        /// Outcome label → successor node (or [`END`]).
        ///
        /// Must be exhaustive over every label the router can return; a label
        /// absent from this map aborts the run.
        branches: HashMap<String, NodeId>,
    },
}

impl<S> Clone for Edge<S> {
    fn clone(&self) -> Self {
        match self {
            Edge::Direct(to) => Edge::Direct(to.clone()),
            Edge::Conditional { router, branches } => Edge::Conditional {
                router: router.clone(),
                branches: branches.clone(),
            },
        }
    }
}

impl<S> Debug for Edge<S> {
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

/// Static topology of a control-flow graph.
///
/// Holds the node functions, the single outgoing edge per node, and the entry
/// point. The structure is data, not behavior: compiling it into a
/// [`CompiledGraph`](crate::CompiledGraph) is what makes it runnable.
///
/// Invariants enforced by [`validate`](Self::validate):
///
/// - the entry point is set and registered
/// - every edge source is a registered node
/// - every edge target (including every branch target) is registered or [`END`]
/// - every registered node has an outgoing edge
pub struct Graph<S> {
    /// All nodes mapped by their unique IDs.
    pub nodes: HashMap<NodeId, NodeFn<S>>,

    /// The single outgoing edge of each node.
    pub edges: HashMap<NodeId, Edge<S>>,

    /// Entry point where execution begins. `None` until set; compiling a
    /// graph without an entry point is a configuration error.
    pub entry: Option<NodeId>,
}

impl<S> Graph<S> {
    /// Create a new empty graph with no entry point.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
        }
    }

    /// Register a node function under `id`.
    ///
    /// Returns `false` if a node with the same id was already registered (the
    /// existing node is left in place). [`StateGraph`](crate::StateGraph)
    /// turns that into a build error.
    pub fn add_node(&mut self, id: impl Into<NodeId>, func: NodeFn<S>) -> bool {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return false;
        }
        self.nodes.insert(id, func);
        true
    }

    /// Add a direct (unconditional) edge from `from` to `to`.
    ///
    /// Returns `false` if `from` already has an outgoing edge; a node has
    /// exactly one way out.
    pub fn add_edge(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> bool {
        let from = from.into();
        if self.edges.contains_key(&from) {
            return false;
        }
        self.edges.insert(from, Edge::Direct(to.into()));
        true
    }

    /// Add a conditional edge out of `from` with a raw string-labelled router.
    ///
    /// This is the unchecked form: nothing ties the labels the router can
    /// return to the keys of `branches`, so exhaustiveness is the caller's
    /// problem and a stray label surfaces as a run-time
    /// `UnknownRouteOutcome`. Prefer
    /// [`StateGraph::add_conditional_edge`](crate::StateGraph::add_conditional_edge),
    /// which checks the branch map against a closed outcome enumeration at
    /// build time.
    ///
    /// Returns `false` if `from` already has an outgoing edge.
    pub fn add_conditional_edge(
        &mut self,
        from: impl Into<NodeId>,
        router: RouterFn<S>,
        branches: HashMap<String, NodeId>,
    ) -> bool {
        let from = from.into();
        if self.edges.contains_key(&from) {
            return false;
        }
        self.edges.insert(from, Edge::Conditional { router, branches });
        true
    }

    /// Set the entry point for graph execution.
    pub fn set_entry(&mut self, node: impl Into<NodeId>) {
        self.entry = Some(node.into());
    }

    /// Validate the graph structure for correctness.
    ///
    /// Checks the invariants listed on [`Graph`]. This runs automatically
    /// during [`StateGraph::compile`](crate::StateGraph::compile) but can be
    /// called directly to catch wiring mistakes early.
    pub fn validate(&self) -> Result<(), String> {
        let entry = self
            .entry
            .as_ref()
            .ok_or_else(|| "entry point was never set".to_string())?;
        if !self.nodes.contains_key(entry) {
            return Err(format!("entry point '{entry}' is not a registered node"));
        }

        for (from, edge) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(format!("edge source '{from}' is not a registered node"));
            }
            match edge {
                Edge::Direct(to) => {
                    if to != END && !self.nodes.contains_key(to) {
                        return Err(format!(
                            "edge target '{to}' (from '{from}') is not a registered node"
                        ));
                    }
                }
                Edge::Conditional { branches, .. } => {
                    if branches.is_empty() {
                        return Err(format!("conditional edge from '{from}' has no branches"));
                    }
                    for (label, to) in branches {
                        if to != END && !self.nodes.contains_key(to) {
                            return Err(format!(
                                "branch target '{to}' (label '{label}' from '{from}') is not a registered node"
                            ));
                        }
                    }
                }
            }
        }

        // A node with no way out would strand the run mid-graph.
        for id in self.nodes.keys() {
            if !self.edges.contains_key(id) {
                return Err(format!("node '{id}' has no outgoing edge"));
            }
        }

        Ok(())
    }

    /// Names of all registered nodes, in arbitrary order.
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }
}

impl<S> Default for Graph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Debug for Graph<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .field("entry", &self.entry)
            .finish()
    }
}
