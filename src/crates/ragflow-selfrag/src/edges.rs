//! Routing functions of the self-RAG loop
//!
//! Each decision point is a pure reader of [`GraphState`]: it may call a
//! judge, but it never mutates state. Outcomes are closed enums implementing
//! [`RouteOutcome`], so the workflow's branch maps are checked for
//! exhaustiveness when the graph is built.
//!
//! The outcome labels ("generate", "transform_query", "supported",
//! "not supported", "useful", "not useful") are the decision vocabulary of
//! the pipeline and appear verbatim in logs and branch maps.

use ragflow_core::RouteOutcome;

use crate::collaborators::{CollaboratorError, Collaborators, Groundedness, Usefulness};
use crate::error::PipelineError;
use crate::state::GraphState;

/// Outcome of [`decide_to_generate`]: proceed to generation, or refine the
/// query first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratePath {
    /// At least one relevant document survived grading.
    Generate,
    /// No relevant evidence remains; rewrite the question and retrieve again
    /// before wasting a generation attempt.
    TransformQuery,
}

impl RouteOutcome for GeneratePath {
    const LABELS: &'static [&'static str] = &["generate", "transform_query"];

    fn label(&self) -> &'static str {
        match self {
            GeneratePath::Generate => "generate",
            GeneratePath::TransformQuery => "transform_query",
        }
    }
}

impl RouteOutcome for Groundedness {
    const LABELS: &'static [&'static str] = &["supported", "not supported"];

    fn label(&self) -> &'static str {
        match self {
            Groundedness::Supported => "supported",
            Groundedness::NotSupported => "not supported",
        }
    }
}

impl RouteOutcome for Usefulness {
    const LABELS: &'static [&'static str] = &["useful", "not useful"];

    fn label(&self) -> &'static str {
        match self {
            Usefulness::Useful => "useful",
            Usefulness::NotUseful => "not useful",
        }
    }
}

/// After grading: generate if any relevant document remains, otherwise
/// refine the query. Exactly one surviving document is enough to generate.
pub fn decide_to_generate(state: &GraphState) -> GeneratePath {
    if state.documents.is_empty() {
        tracing::info!("no relevant documents, routing to transform_query");
        GeneratePath::TransformQuery
    } else {
        tracing::info!(relevant = state.documents.len(), "routing to generate");
        GeneratePath::Generate
    }
}

/// After generation: ask the groundedness judge whether the draft's claims
/// are backed by the retained documents. `NotSupported` regenerates against
/// the same evidence.
pub async fn grade_generation_v_documents(
    collab: &Collaborators,
    state: &GraphState,
) -> Result<Groundedness, CollaboratorError> {
    let generation = state
        .generation
        .as_deref()
        .ok_or(PipelineError::NoGenerationToGrade)?;
    let verdict = collab
        .groundedness_judge
        .judge(generation, &state.documents)
        .await?;
    tracing::info!(verdict = ?verdict, "groundedness judged");
    Ok(verdict)
}

/// At the final gate: ask the usefulness judge whether the draft addresses
/// the question. `Useful` terminates the run; `NotUseful` restarts retrieval
/// through a query rewrite.
pub async fn grade_generation_v_question(
    collab: &Collaborators,
    state: &GraphState,
) -> Result<Usefulness, CollaboratorError> {
    let generation = state
        .generation
        .as_deref()
        .ok_or(PipelineError::NoGenerationToGrade)?;
    let verdict = collab
        .usefulness_judge
        .judge(generation, &state.question)
        .await?;
    tracing::info!(verdict = ?verdict, "usefulness judged");
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Document;

    #[test]
    fn zero_relevant_documents_route_to_rewrite() {
        let state = GraphState::new("q");
        assert_eq!(decide_to_generate(&state), GeneratePath::TransformQuery);
    }

    #[test]
    fn one_relevant_document_routes_to_generate() {
        let mut state = GraphState::new("q");
        state.documents = vec![Document::new("the single surviving document")];
        state.documents_dropped = true;
        assert_eq!(decide_to_generate(&state), GeneratePath::Generate);
    }

    #[test]
    fn outcome_labels_match_branch_vocabulary() {
        assert_eq!(GeneratePath::Generate.label(), "generate");
        assert_eq!(GeneratePath::TransformQuery.label(), "transform_query");
        assert_eq!(Groundedness::Supported.label(), "supported");
        assert_eq!(Groundedness::NotSupported.label(), "not supported");
        assert_eq!(Usefulness::Useful.label(), "useful");
        assert_eq!(Usefulness::NotUseful.label(), "not useful");
    }
}
