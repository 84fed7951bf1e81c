//! Graph execution engine
//!
//! [`CompiledGraph`] walks a validated topology one node at a time: run the
//! current node, publish the post-step state, then follow the node's edge -
//! directly, or through its router - until [`END`](crate::END) is reached.
//! Execution is strictly sequential within one run; independent runs share
//! nothing and may proceed concurrently.
//!
//! Two invocation modes:
//!
//! - [`invoke`](CompiledGraph::invoke) - blocking: resolves to the final
//!   state once the terminal outcome is reached.
//! - [`stream`](CompiledGraph::stream) - observable: yields a
//!   [`StepEvent`] after every node, in execution order. The last event
//!   carries the final state. If the run fails, the stream ends with the
//!   error; everything yielded before it is valid observational history.
//!
//! The topology admits cycles with no intrinsic bound, so every run carries
//! an [`ExecutionConfig`]: a step budget (checked before each dispatch,
//! raising [`GraphError::LoopLimitExceeded`] when exhausted), an optional
//! wall-clock deadline, and an optional cancellation token checked between
//! dispatches.

use std::time::{Duration, Instant};

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{GraphError, Result};
use crate::graph::{BoxError, Edge, Graph, NodeId, END};

/// Default per-run step budget.
///
/// Generous enough for several trips around a self-correction cycle, small
/// enough that oscillating judgments fail fast instead of burning model calls.
pub const DEFAULT_STEP_LIMIT: usize = 25;

/// Per-run execution limits.
///
/// ```rust
/// use std::time::Duration;
/// use ragflow_core::ExecutionConfig;
///
/// let config = ExecutionConfig::default()
///     .with_step_limit(10)
///     .with_deadline(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Maximum number of node executions before the run aborts with
    /// [`GraphError::LoopLimitExceeded`].
    pub step_limit: usize,

    /// Optional wall-clock budget for the whole run. Node and router calls
    /// are clipped to the time remaining; overrunning it aborts with
    /// [`GraphError::Timeout`].
    pub deadline: Option<Duration>,

    /// Optional external cancellation token, checked between step
    /// dispatches. A node already in flight is not interrupted.
    pub cancellation: Option<CancellationToken>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
            deadline: None,
            cancellation: None,
        }
    }
}

impl ExecutionConfig {
    /// Replace the step budget.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    /// Set a wall-clock deadline for the run.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// State snapshot published after one node execution.
///
/// `state` is the shared state as it stood when `node` finished - the same
/// value the next node will receive.
#[derive(Debug, Clone, Serialize)]
pub struct StepEvent<S> {
    /// Name of the node that just executed.
    pub node: NodeId,
    /// Post-step state snapshot.
    pub state: S,
}

/// A validated, runnable control-flow graph.
///
/// Produced by [`StateGraph::compile`](crate::StateGraph::compile); holds the
/// topology immutably and can be shared (it is cheap to keep behind an `Arc`)
/// across any number of concurrent runs.
pub struct CompiledGraph<S> {
    graph: Graph<S>,
}

impl<S> CompiledGraph<S> {
    pub(crate) fn new(graph: Graph<S>) -> Self {
        Self { graph }
    }

    /// Names of the graph's nodes, for introspection and logging.
    pub fn node_names(&self) -> Vec<&str> {
        self.graph.node_names()
    }
}

impl<S> std::fmt::Debug for CompiledGraph<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("nodes", &self.graph.node_names())
            .field("entry", &self.graph.entry)
            .finish()
    }
}

impl<S: Clone + Send + 'static> CompiledGraph<S> {
    /// Execute the graph to completion with the default configuration.
    ///
    /// Returns the final state once the terminal outcome is reached.
    pub async fn invoke(&self, input: S) -> Result<S> {
        self.invoke_with_config(input, ExecutionConfig::default()).await
    }

    /// Execute the graph to completion under explicit limits.
    ///
    /// The first fatal error aborts the run; no partial state is returned.
    #[tracing::instrument(skip(self, input, config), fields(node_count = self.graph.nodes.len()))]
    pub async fn invoke_with_config(&self, input: S, config: ExecutionConfig) -> Result<S> {
        let stream = self.stream_with_config(input, config);
        futures::pin_mut!(stream);

        let mut last: Option<StepEvent<S>> = None;
        while let Some(event) = stream.next().await {
            last = Some(event?);
        }
        // The entry node always runs, so a completed stream has at least one event.
        let event = last
            .ok_or_else(|| GraphError::Execution("graph run produced no steps".to_string()))?;
        tracing::debug!(final_node = %event.node, "graph run completed");
        Ok(event.state)
    }

    /// Execute the graph, yielding a [`StepEvent`] after every node.
    pub fn stream(&self, input: S) -> impl Stream<Item = Result<StepEvent<S>>> + Send + '_ {
        self.stream_with_config(input, ExecutionConfig::default())
    }

    /// Execute the graph under explicit limits, yielding a [`StepEvent`]
    /// after every node, in execution order.
    ///
    /// On failure the stream yields the error and completes; events already
    /// yielded remain valid history.
    pub fn stream_with_config(
        &self,
        input: S,
        config: ExecutionConfig,
    ) -> impl Stream<Item = Result<StepEvent<S>>> + Send + '_ {
        try_stream! {
            let run_id = Uuid::new_v4();
            let mut current: NodeId = self
                .graph
                .entry
                .clone()
                .ok_or_else(|| GraphError::Validation("entry point was never set".to_string()))?;
            let deadline = config
                .deadline
                .map(|d| (Instant::now() + d, d.as_millis() as u64));
            let mut state = input;
            let mut steps = 0usize;

            tracing::debug!(%run_id, entry = %current, step_limit = config.step_limit, "starting graph run");

            loop {
                if let Some(token) = &config.cancellation {
                    if token.is_cancelled() {
                        tracing::warn!(%run_id, node = %current, "run cancelled");
                        Err::<(), GraphError>(GraphError::Cancelled { node: current.clone() })?;
                    }
                }
                if steps >= config.step_limit {
                    tracing::warn!(%run_id, node = %current, limit = config.step_limit, "step limit exhausted");
                    Err::<(), GraphError>(GraphError::LoopLimitExceeded {
                        limit: config.step_limit,
                        node: current.clone(),
                    })?;
                }

                // Post-compile, every dispatched node is registered; this guards
                // hand-built graphs that skipped validation.
                let func = self
                    .graph
                    .nodes
                    .get(&current)
                    .cloned()
                    .ok_or_else(|| {
                        GraphError::Validation(format!("node '{current}' is not registered"))
                    })?;

                tracing::debug!(%run_id, node = %current, step = steps, "executing node");
                state = bounded(&current, deadline, func(state)).await?;
                steps += 1;

                yield StepEvent {
                    node: current.clone(),
                    state: state.clone(),
                };

                let next: NodeId = match self.graph.edges.get(&current) {
                    Some(Edge::Direct(to)) => to.clone(),
                    Some(Edge::Conditional { router, branches }) => {
                        let outcome =
                            bounded(&current, deadline, router(state.clone())).await?;
                        match branches.get(&outcome) {
                            Some(to) => {
                                tracing::debug!(%run_id, node = %current, %outcome, next = %to, "routed");
                                to.clone()
                            }
                            None => Err::<NodeId, GraphError>(GraphError::UnknownRouteOutcome {
                                node: current.clone(),
                                outcome,
                                expected: branches.keys().cloned().collect(),
                            })?,
                        }
                    }
                    None => Err::<NodeId, GraphError>(GraphError::Validation(format!(
                        "node '{current}' has no outgoing edge"
                    )))?,
                };

                if next == END {
                    tracing::debug!(%run_id, steps, "reached terminal node");
                    break;
                }
                current = next;
            }
        }
    }
}

/// Run a node or router future, clipped to the time remaining before the
/// run's deadline. Failures are wrapped with the node's name.
async fn bounded<T>(
    node: &str,
    deadline: Option<(Instant, u64)>,
    fut: impl std::future::Future<Output = std::result::Result<T, BoxError>>,
) -> Result<T> {
    match deadline {
        None => fut.await.map_err(|e| GraphError::node_execution(node, e)),
        Some((at, deadline_ms)) => {
            let Some(remaining) = at.checked_duration_since(Instant::now()) else {
                return Err(GraphError::Timeout {
                    node: node.to_string(),
                    deadline_ms,
                });
            };
            match tokio::time::timeout(remaining, fut).await {
                Ok(result) => result.map_err(|e| GraphError::node_execution(node, e)),
                Err(_) => Err(GraphError::Timeout {
                    node: node.to_string(),
                    deadline_ms,
                }),
            }
        }
    }
}
