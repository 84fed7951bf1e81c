//! High-level graph builder
//!
//! [`StateGraph`] is the primary construction API. It wraps the raw
//! [`Graph`](crate::Graph) with construction-time checks: duplicate
//! node names, second outgoing edges, and branch maps that disagree with
//! their router's declared label set are all recorded as build errors and
//! reported by [`compile`](StateGraph::compile) - a misconfigured graph never
//! becomes runnable.
//!
//! Methods chain with `&mut self`, so a topology reads as a flat wiring list:
//!
//! ```rust
//! use ragflow_core::{BoxError, StateGraph, END};
//!
//! #[derive(Clone)]
//! struct Counter(u32);
//!
//! let mut workflow = StateGraph::new();
//! workflow.add_node("bump", |Counter(n)| async move {
//!     Ok::<_, BoxError>(Counter(n + 1))
//! });
//! workflow.add_edge("bump", END);
//! workflow.set_entry("bump");
//!
//! let compiled = workflow.compile().unwrap();
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::{GraphError, Result};
use crate::executor::CompiledGraph;
use crate::graph::{BoxError, Graph, NodeFn, NodeId, RouterFn};
use crate::route::RouteOutcome;

/// Builder for a control-flow graph over a shared state type `S`.
///
/// Collects nodes and edges, accumulating configuration errors as it goes;
/// [`compile`](Self::compile) reports the first error or produces a
/// [`CompiledGraph`].
pub struct StateGraph<S> {
    graph: Graph<S>,
    build_errors: Vec<String>,
}

impl<S: Send + 'static> StateGraph<S> {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            build_errors: Vec::new(),
        }
    }

    /// Add a node: a named async transformation of the state.
    ///
    /// Registering the same name twice is a configuration error reported at
    /// [`compile`](Self::compile) time.
    pub fn add_node<F, Fut>(&mut self, id: impl Into<NodeId>, func: F) -> &mut Self
    where
        F: Fn(S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<S, BoxError>> + Send + 'static,
    {
        let id = id.into();
        let func: NodeFn<S> = Arc::new(move |state| Box::pin(func(state)));
        if !self.graph.add_node(id.clone(), func) {
            self.build_errors
                .push(format!("node '{id}' registered twice"));
        }
        self
    }

    /// Add a direct edge: after `from` completes, `to` always runs next.
    ///
    /// `to` may be [`END`](crate::END) to make `from` a terminal node.
    pub fn add_edge(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> &mut Self {
        let from = from.into();
        if !self.graph.add_edge(from.clone(), to) {
            self.build_errors
                .push(format!("node '{from}' already has an outgoing edge"));
        }
        self
    }

    /// Add a conditional edge with a typed router.
    ///
    /// The router is an async decision function returning a
    /// [`RouteOutcome`] - a closed enum whose `LABELS` const names every
    /// label it can produce. The branch map is checked against that set when
    /// the edge is added: a label the router can return but the map does not
    /// cover, or a branch keyed by a label the router can never return, is a
    /// build error. That makes the run-time unknown-outcome failure
    /// unreachable through this method.
    ///
    /// Branch targets may be [`END`](crate::END).
    pub fn add_conditional_edge<R, F, Fut, N>(
        &mut self,
        from: impl Into<NodeId>,
        router: F,
        branches: impl IntoIterator<Item = (&'static str, N)>,
    ) -> &mut Self
    where
        R: RouteOutcome,
        F: Fn(S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<R, BoxError>> + Send + 'static,
        N: Into<NodeId>,
    {
        let from = from.into();

        let mut map: HashMap<String, NodeId> = HashMap::new();
        for (label, target) in branches {
            if map.insert(label.to_string(), target.into()).is_some() {
                self.build_errors.push(format!(
                    "conditional edge from '{from}' maps label '{label}' twice"
                ));
            }
        }
        for label in R::LABELS {
            if !map.contains_key(*label) {
                self.build_errors.push(format!(
                    "conditional edge from '{from}' is missing a branch for outcome '{label}'"
                ));
            }
        }
        for label in map.keys() {
            if !R::LABELS.contains(&label.as_str()) {
                self.build_errors.push(format!(
                    "conditional edge from '{from}' maps label '{label}' its router never returns"
                ));
            }
        }

        let router: RouterFn<S> = Arc::new(move |state| {
            let fut = router(state);
            Box::pin(async move { fut.await.map(|outcome| outcome.label().to_string()) })
        });
        if !self.graph.add_conditional_edge(from.clone(), router, map) {
            self.build_errors
                .push(format!("node '{from}' already has an outgoing edge"));
        }
        self
    }

    /// Add a conditional edge with a raw string-labelled router.
    ///
    /// No build-time exhaustiveness check: a label missing from `branches`
    /// aborts the run with
    /// [`GraphError::UnknownRouteOutcome`](crate::GraphError::UnknownRouteOutcome).
    /// Exists for callers whose outcome vocabulary is open-ended; everything
    /// else should use [`add_conditional_edge`](Self::add_conditional_edge).
    pub fn add_conditional_edge_raw(
        &mut self,
        from: impl Into<NodeId>,
        router: RouterFn<S>,
        branches: HashMap<String, NodeId>,
    ) -> &mut Self {
        let from = from.into();
        if !self.graph.add_conditional_edge(from.clone(), router, branches) {
            self.build_errors
                .push(format!("node '{from}' already has an outgoing edge"));
        }
        self
    }

    /// Designate the entry node where every run begins.
    pub fn set_entry(&mut self, node: impl Into<NodeId>) -> &mut Self {
        self.graph.set_entry(node);
        self
    }

    /// Validate the accumulated topology and produce a runnable graph.
    ///
    /// # Errors
    ///
    /// [`GraphError::Configuration`] for errors recorded while building
    /// (duplicate nodes, double edges, branch/label mismatches);
    /// [`GraphError::Validation`] for structural errors (missing entry,
    /// unregistered targets, stranded nodes).
    pub fn compile(self) -> Result<CompiledGraph<S>> {
        if let Some(first) = self.build_errors.first() {
            return Err(GraphError::Configuration(first.clone()));
        }
        self.graph.validate().map_err(GraphError::Validation)?;
        Ok(CompiledGraph::new(self.graph))
    }

    /// Access the underlying raw graph.
    pub fn graph(&self) -> &Graph<S> {
        &self.graph
    }
}

impl<S: Send + 'static> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}
