//! Error types for graph construction and execution
//!
//! Two families of failure exist, and they never blur:
//!
//! - **Build time** - [`GraphError::Validation`] and
//!   [`GraphError::Configuration`]: the topology is malformed (unregistered
//!   step referenced, duplicate step, missing entry point, non-exhaustive
//!   branch map). The engine refuses to produce a runnable graph.
//! - **Run time** - [`GraphError::NodeExecution`] (a collaborator call
//!   failed), [`GraphError::UnknownRouteOutcome`] (a router produced a label
//!   its branch map does not know), [`GraphError::LoopLimitExceeded`],
//!   [`GraphError::Timeout`], and [`GraphError::Cancelled`]. All are fatal to
//!   the run: no partial answer is returned, and a streaming run stops
//!   yielding at the point of failure.

use thiserror::Error;

use crate::graph::{BoxError, NodeId};

/// Convenience result type using [`GraphError`].
pub type Result<T> = std::result::Result<T, GraphError>;

/// Error type for all graph operations.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Graph structure validation failed at build time.
    ///
    /// Unregistered edge target, stranded node, missing entry point, and
    /// similar wiring mistakes. Fix the topology; the graph will not run.
    #[error("graph validation failed: {0}")]
    Validation(String),

    /// Graph configuration is inconsistent at build time.
    ///
    /// Duplicate node registration, a second outgoing edge on one node, or a
    /// branch map that does not match its router's declared label set.
    #[error("graph configuration error: {0}")]
    Configuration(String),

    /// A node's function returned an error during execution.
    ///
    /// Collaborator failures (retrieval, grading, generation, rewriting)
    /// surface here with the node name attached. The run is aborted and
    /// partial state is discarded.
    #[error("node '{node}' execution failed: {source}")]
    NodeExecution {
        /// Name of the node that failed.
        node: NodeId,
        /// Underlying failure from the node or router function.
        #[source]
        source: BoxError,
    },

    /// A router returned a label absent from its registered branch map.
    ///
    /// Fatal at run time: execution halts immediately and no further nodes
    /// run. Unreachable through typed routing
    /// ([`RouteOutcome`](crate::RouteOutcome)); raw string routers can hit it.
    #[error("router at '{node}' returned unknown outcome '{outcome}' (expected one of: {expected:?})")]
    UnknownRouteOutcome {
        /// Node whose conditional edge was being resolved.
        node: NodeId,
        /// The label the router actually returned.
        outcome: String,
        /// The labels the branch map knows about.
        expected: Vec<String>,
    },

    /// The per-run step budget ran out before reaching [`END`](crate::END).
    ///
    /// The topology admits cycles with no intrinsic bound; the budget is what
    /// guarantees termination when judgments refuse to converge. Raised
    /// instead of dispatching the named node.
    #[error("step limit of {limit} exhausted before node '{node}'")]
    LoopLimitExceeded {
        /// The configured step budget.
        limit: usize,
        /// The node that was about to run when the budget ran out.
        node: NodeId,
    },

    /// The per-run deadline elapsed.
    #[error("run deadline of {deadline_ms}ms exceeded at node '{node}'")]
    Timeout {
        /// Node being dispatched when the deadline hit.
        node: NodeId,
        /// The configured deadline in milliseconds.
        deadline_ms: u64,
    },

    /// The run's cancellation token fired.
    ///
    /// Checked between step dispatches; the node named here did not run.
    #[error("run cancelled before node '{node}'")]
    Cancelled {
        /// The node that would have run next.
        node: NodeId,
    },

    /// Execution failed outside any specific node.
    #[error("execution failed: {0}")]
    Execution(String),
}

impl GraphError {
    /// Wrap a node or router failure with its node name.
    pub fn node_execution(node: impl Into<NodeId>, source: impl Into<BoxError>) -> Self {
        Self::NodeExecution {
            node: node.into(),
            source: source.into(),
        }
    }
}
