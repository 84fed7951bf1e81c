//! # ragflow-selfrag - a self-correcting RAG control loop
//!
//! Given a natural-language question, this pipeline retrieves supporting
//! documents, filters them for relevance, generates an answer grounded in
//! the retained documents, and loops - re-querying or regenerating - whenever
//! a judge finds the answer unsupported or unhelpful. The orchestration is a
//! cyclic [`ragflow_core`] graph; the retrieval, grading, generation, and
//! rewriting live behind the [`collaborators`] traits and are supplied by
//! the caller.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ragflow_selfrag::{Collaborators, SelfRag};
//! # async fn run(collaborators: Collaborators) -> Result<(), ragflow_selfrag::PipelineError> {
//! let pipeline = SelfRag::new(collaborators)?;
//! let answer = pipeline
//!     .answer("Explain how the different types of agent memory work?")
//!     .await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```
//!
//! Streaming mode yields the state after every step, in execution order:
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use ragflow_selfrag::{Collaborators, SelfRag};
//! # async fn run(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = SelfRag::new(collaborators)?;
//! let mut steps = Box::pin(pipeline.stream("Explain how the different types of agent memory work?")?);
//! while let Some(event) = steps.next().await {
//!     let event = event?;
//!     println!("finished step '{}'", event.node);
//! }
//! # Ok(())
//! # }
//! ```

pub mod collaborators;
pub mod edges;
pub mod error;
pub mod nodes;
pub mod state;
pub mod workflow;

pub use collaborators::{
    CollaboratorError, Collaborators, Generator, Groundedness, GroundednessJudge, QueryRewriter,
    Relevance, RelevanceGrader, Retriever, Usefulness, UsefulnessJudge,
};
pub use error::PipelineError;
pub use state::{Document, GraphState};
pub use workflow::{build_workflow, SelfRag};

// The engine types callers configure runs with.
pub use ragflow_core::{ExecutionConfig, GraphError, StepEvent};
