//! Pipeline-level errors layered over the engine's [`GraphError`].

use ragflow_core::GraphError;
use thiserror::Error;

/// Errors a self-RAG run can surface to the caller.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Engine failure: configuration, routing, loop limit, timeout,
    /// cancellation, or a collaborator failure wrapped with its step name.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The initial question (or a rewritten one) was empty. The question
    /// must be non-empty for the whole run.
    #[error("question must be non-empty")]
    EmptyQuestion,

    /// A grading step ran before any generation existed. Indicates a wiring
    /// bug, not a data problem; the fixed topology cannot produce it.
    #[error("no generation available to grade")]
    NoGenerationToGrade,

    /// The run reached the terminal outcome without a generation in state.
    #[error("run completed without producing a generation")]
    NoAnswer,
}
