//! # ragflow-core - cyclic control-flow graphs for self-correcting pipelines
//!
//! A small orchestration engine for pipelines that loop on themselves: the
//! topology is a directed, *cyclic* graph of named nodes held as data, and an
//! executor walks it one node at a time, threading a single shared state
//! value through every step and consulting routing functions at decision
//! points.
//!
//! ## Core concepts
//!
//! - [`StateGraph`] - builder: register nodes (async `State → State`
//!   transformations), wire direct edges and conditional edges, designate the
//!   entry node, then [`compile`](StateGraph::compile).
//! - [`RouteOutcome`] - a closed enum per decision point. The branch map of a
//!   conditional edge is checked against the enum's label set at build time,
//!   so non-exhaustive routing is a build error, not a latent run-time one.
//! - [`CompiledGraph`] - the runnable graph: [`invoke`](CompiledGraph::invoke)
//!   blocks to the final state, [`stream`](CompiledGraph::stream) yields a
//!   [`StepEvent`] after every node for observation.
//! - [`ExecutionConfig`] - per-run step budget, wall-clock deadline, and
//!   cancellation token. Cycles carry no intrinsic bound; the budget is what
//!   guarantees termination when a loop refuses to converge.
//!
//! ## Example
//!
//! ```rust
//! use ragflow_core::{BoxError, ExecutionConfig, RouteOutcome, StateGraph, END};
//!
//! #[derive(Clone)]
//! struct Draft {
//!     text: String,
//!     attempts: u32,
//! }
//!
//! enum Review {
//!     Accept,
//!     Redo,
//! }
//!
//! impl RouteOutcome for Review {
//!     const LABELS: &'static [&'static str] = &["accept", "redo"];
//!
//!     fn label(&self) -> &'static str {
//!         match self {
//!             Review::Accept => "accept",
//!             Review::Redo => "redo",
//!         }
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ragflow_core::GraphError> {
//! let mut workflow = StateGraph::new();
//! workflow.add_node("draft", |mut state: Draft| async move {
//!     state.attempts += 1;
//!     state.text = format!("attempt {}", state.attempts);
//!     Ok::<_, BoxError>(state)
//! });
//! // Self-loop until the third attempt passes review.
//! workflow.add_conditional_edge(
//!     "draft",
//!     |state: Draft| async move {
//!         if state.attempts >= 3 {
//!             Ok::<_, BoxError>(Review::Accept)
//!         } else {
//!             Ok(Review::Redo)
//!         }
//!     },
//!     [("accept", END), ("redo", "draft")],
//! );
//! workflow.set_entry("draft");
//!
//! let graph = workflow.compile()?;
//! let final_state = graph
//!     .invoke_with_config(
//!         Draft { text: String::new(), attempts: 0 },
//!         ExecutionConfig::default().with_step_limit(10),
//!     )
//!     .await?;
//! assert_eq!(final_state.text, "attempt 3");
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod executor;
pub mod graph;
pub mod route;

pub use builder::StateGraph;
pub use error::{GraphError, Result};
pub use executor::{CompiledGraph, ExecutionConfig, StepEvent, DEFAULT_STEP_LIMIT};
pub use graph::{BoxError, Edge, Graph, NodeFn, NodeId, RouterFn, END};
pub use route::RouteOutcome;

// Re-exported so downstream crates configure cancellation without depending
// on tokio-util directly.
pub use tokio_util::sync::CancellationToken;
