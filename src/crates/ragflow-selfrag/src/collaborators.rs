//! Contracts for the external collaborators the pipeline calls
//!
//! The control loop owns sequencing and routing; the actual retrieval,
//! grading, generation, and rewriting live behind these traits. Each trait is
//! one call with a fixed vocabulary of outcomes, so a vector store, an LLM
//! judge, or a test double plug in interchangeably.
//!
//! Implementations must be safe for concurrent invocation: one collaborator
//! set is shared across every run of a workflow.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::Document;

/// Error type collaborators return. Wrapped by the engine into a
/// `NodeExecution` failure with the step name attached - a failing
/// collaborator always fails the run.
pub type CollaboratorError = ragflow_core::BoxError;

/// Per-document relevance judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    Relevant,
    NotRelevant,
}

impl Relevance {
    pub fn is_relevant(self) -> bool {
        matches!(self, Relevance::Relevant)
    }
}

/// Whether a generation's claims are backed by the retrieved documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Groundedness {
    Supported,
    NotSupported,
}

/// Whether a generation actually addresses the question, independent of
/// groundedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Usefulness {
    Useful,
    NotUseful,
}

/// Supplies ranked candidate documents for a question.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, question: &str) -> Result<Vec<Document>, CollaboratorError>;
}

/// Judges one document's relevance to the question.
#[async_trait]
pub trait RelevanceGrader: Send + Sync {
    async fn grade(
        &self,
        question: &str,
        document: &Document,
    ) -> Result<Relevance, CollaboratorError>;
}

/// Produces a draft answer from the question and the retained documents.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        question: &str,
        documents: &[Document],
    ) -> Result<String, CollaboratorError>;
}

/// Reformulates a question that retrieved insufficient evidence.
#[async_trait]
pub trait QueryRewriter: Send + Sync {
    async fn rewrite(&self, question: &str) -> Result<String, CollaboratorError>;
}

/// Judges whether a generation's claims are supported by the documents.
#[async_trait]
pub trait GroundednessJudge: Send + Sync {
    async fn judge(
        &self,
        generation: &str,
        documents: &[Document],
    ) -> Result<Groundedness, CollaboratorError>;
}

/// Judges whether a generation addresses the question.
#[async_trait]
pub trait UsefulnessJudge: Send + Sync {
    async fn judge(
        &self,
        generation: &str,
        question: &str,
    ) -> Result<Usefulness, CollaboratorError>;
}

/// The full collaborator set a workflow is wired with.
///
/// Cheap to clone; every member is shared. Built once and handed to
/// [`SelfRag::new`](crate::SelfRag::new).
#[derive(Clone)]
pub struct Collaborators {
    pub retriever: Arc<dyn Retriever>,
    pub relevance_grader: Arc<dyn RelevanceGrader>,
    pub generator: Arc<dyn Generator>,
    pub query_rewriter: Arc<dyn QueryRewriter>,
    pub groundedness_judge: Arc<dyn GroundednessJudge>,
    pub usefulness_judge: Arc<dyn UsefulnessJudge>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
