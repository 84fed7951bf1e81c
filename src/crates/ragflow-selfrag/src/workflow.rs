//! The self-RAG topology and run façade
//!
//! Wires the five steps and three decision points into a `ragflow-core`
//! graph:
//!
//! ```text
//! retrieve ──▶ grade_documents ──decide_to_generate──▶ generate
//!     ▲                │                                  │  ▲
//!     │          "transform_query"              "not supported" (self-loop)
//!     │                ▼                                  │
//!     └──────── transform_query ◀──"not useful"──┐  "supported"
//!                                                 │        ▼
//!                                        prepare_for_final_grade
//!                                                 │
//!                                             "useful" ──▶ END
//! ```
//!
//! Two cycles exist by construction: the query-refinement loop through
//! `transform_query` and the regeneration self-loop on `generate`. Neither
//! has an intrinsic bound - the per-run step budget in
//! [`ExecutionConfig`] is what guarantees termination.

use futures::Stream;
use ragflow_core::{
    BoxError, CompiledGraph, ExecutionConfig, GraphError, StateGraph, StepEvent, END,
};

use crate::collaborators::Collaborators;
use crate::edges;
use crate::error::PipelineError;
use crate::nodes;
use crate::state::GraphState;

/// Node names of the fixed topology.
pub const RETRIEVE: &str = "retrieve";
pub const GRADE_DOCUMENTS: &str = "grade_documents";
pub const GENERATE: &str = "generate";
pub const TRANSFORM_QUERY: &str = "transform_query";
pub const PREPARE_FOR_FINAL_GRADE: &str = "prepare_for_final_grade";

/// Build and compile the self-RAG workflow over the given collaborators.
///
/// The topology is fixed; only the collaborators vary. Compilation cannot
/// fail for a correct build of this crate, but the error is surfaced rather
/// than unwrapped so miswired forks fail loudly.
pub fn build_workflow(
    collaborators: Collaborators,
) -> Result<CompiledGraph<GraphState>, GraphError> {
    let mut workflow = StateGraph::new();

    let collab = collaborators.clone();
    workflow.add_node(RETRIEVE, move |state| {
        let collab = collab.clone();
        async move { nodes::retrieve(&collab, state).await }
    });
    let collab = collaborators.clone();
    workflow.add_node(GRADE_DOCUMENTS, move |state| {
        let collab = collab.clone();
        async move { nodes::grade_documents(&collab, state).await }
    });
    let collab = collaborators.clone();
    workflow.add_node(GENERATE, move |state| {
        let collab = collab.clone();
        async move { nodes::generate(&collab, state).await }
    });
    let collab = collaborators.clone();
    workflow.add_node(TRANSFORM_QUERY, move |state| {
        let collab = collab.clone();
        async move { nodes::transform_query(&collab, state).await }
    });
    workflow.add_node(PREPARE_FOR_FINAL_GRADE, nodes::prepare_for_final_grade);

    workflow.set_entry(RETRIEVE);
    workflow.add_edge(RETRIEVE, GRADE_DOCUMENTS);

    // Insufficient relevant evidence refines the query before generating.
    workflow.add_conditional_edge(
        GRADE_DOCUMENTS,
        |state: GraphState| async move { Ok::<_, BoxError>(edges::decide_to_generate(&state)) },
        [
            ("transform_query", TRANSFORM_QUERY),
            ("generate", GENERATE),
        ],
    );

    // Closes the retrieval-refinement cycle.
    workflow.add_edge(TRANSFORM_QUERY, RETRIEVE);

    // Ungrounded drafts regenerate against the same evidence.
    let collab = collaborators.clone();
    workflow.add_conditional_edge(
        GENERATE,
        move |state: GraphState| {
            let collab = collab.clone();
            async move { edges::grade_generation_v_documents(&collab, &state).await }
        },
        [
            ("supported", PREPARE_FOR_FINAL_GRADE),
            ("not supported", GENERATE),
        ],
    );

    // The final gate: a useful answer terminates, anything else restarts
    // retrieval with a reformulated question.
    let collab = collaborators;
    workflow.add_conditional_edge(
        PREPARE_FOR_FINAL_GRADE,
        move |state: GraphState| {
            let collab = collab.clone();
            async move { edges::grade_generation_v_question(&collab, &state).await }
        },
        [("useful", END), ("not useful", TRANSFORM_QUERY)],
    );

    workflow.compile()
}

/// A compiled self-RAG pipeline, ready to answer questions.
///
/// Cheap to share; one instance serves any number of concurrent runs, each
/// owning its own [`GraphState`].
#[derive(Debug)]
pub struct SelfRag {
    graph: CompiledGraph<GraphState>,
}

impl SelfRag {
    /// Compile the fixed topology over the given collaborators.
    pub fn new(collaborators: Collaborators) -> Result<Self, PipelineError> {
        Ok(Self {
            graph: build_workflow(collaborators)?,
        })
    }

    /// The underlying compiled graph, for introspection or direct execution
    /// with a caller-built [`GraphState`].
    pub fn graph(&self) -> &CompiledGraph<GraphState> {
        &self.graph
    }

    /// Answer a question, blocking until the terminal outcome is reached.
    pub async fn answer(&self, question: &str) -> Result<String, PipelineError> {
        self.answer_with_config(question, ExecutionConfig::default())
            .await
    }

    /// Answer a question under explicit execution limits.
    ///
    /// Returns the final generation, or the first fatal error - including
    /// [`GraphError::LoopLimitExceeded`] when the self-correction cycles
    /// fail to converge within the step budget.
    pub async fn answer_with_config(
        &self,
        question: &str,
        config: ExecutionConfig,
    ) -> Result<String, PipelineError> {
        if question.trim().is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }
        let final_state = self
            .graph
            .invoke_with_config(GraphState::new(question), config)
            .await?;
        final_state
            .generation
            .filter(|generation| !generation.is_empty())
            .ok_or(PipelineError::NoAnswer)
    }

    /// Answer a question, yielding the state after every step.
    ///
    /// The final event's `generation` is the answer. On failure the stream
    /// ends with the error; earlier events are valid history.
    pub fn stream(
        &self,
        question: &str,
    ) -> Result<impl Stream<Item = Result<StepEvent<GraphState>, GraphError>> + Send + '_, PipelineError>
    {
        self.stream_with_config(question, ExecutionConfig::default())
    }

    /// Streaming mode under explicit execution limits.
    pub fn stream_with_config(
        &self,
        question: &str,
        config: ExecutionConfig,
    ) -> Result<impl Stream<Item = Result<StepEvent<GraphState>, GraphError>> + Send + '_, PipelineError>
    {
        if question.trim().is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }
        Ok(self
            .graph
            .stream_with_config(GraphState::new(question), config))
    }
}
