//! Step functions of the self-RAG loop
//!
//! Each step is a single-output transformation of [`GraphState`]: extract the
//! fields it needs, call the collaborator, merge the result back under the
//! documented field. The steps own no judgment logic - that lives behind the
//! collaborator traits - and they never swallow a collaborator failure.

use crate::collaborators::{CollaboratorError, Collaborators};
use crate::error::PipelineError;
use crate::state::GraphState;

/// Read `question`; call the retriever; write `documents`.
pub async fn retrieve(
    collab: &Collaborators,
    mut state: GraphState,
) -> Result<GraphState, CollaboratorError> {
    tracing::info!(question = %state.question, "retrieve");
    state.documents = collab.retriever.retrieve(&state.question).await?;
    tracing::debug!(count = state.documents.len(), "documents retrieved");
    Ok(state)
}

/// Read `question` and `documents`; grade each document; keep the relevant
/// subset (order preserved) and record whether anything was dropped.
pub async fn grade_documents(
    collab: &Collaborators,
    mut state: GraphState,
) -> Result<GraphState, CollaboratorError> {
    tracing::info!(count = state.documents.len(), "grade documents");
    let candidates = std::mem::take(&mut state.documents);
    let mut relevant = Vec::with_capacity(candidates.len());
    let mut dropped = 0usize;
    for document in candidates {
        if collab
            .relevance_grader
            .grade(&state.question, &document)
            .await?
            .is_relevant()
        {
            relevant.push(document);
        } else {
            dropped += 1;
        }
    }
    tracing::debug!(kept = relevant.len(), dropped, "documents graded");
    state.documents = relevant;
    state.documents_dropped = dropped > 0;
    Ok(state)
}

/// Read `question` and `documents`; call the generator; overwrite
/// `generation` with the new draft.
pub async fn generate(
    collab: &Collaborators,
    mut state: GraphState,
) -> Result<GraphState, CollaboratorError> {
    tracing::info!("generate");
    let draft = collab
        .generator
        .generate(&state.question, &state.documents)
        .await?;
    state.generation = Some(draft);
    Ok(state)
}

/// Read `question`; call the rewriter; overwrite `question` with the
/// reformulation. An empty reformulation is rejected - the question stays
/// non-empty for the whole run.
pub async fn transform_query(
    collab: &Collaborators,
    mut state: GraphState,
) -> Result<GraphState, CollaboratorError> {
    tracing::info!(question = %state.question, "transform query");
    let rewritten = collab.query_rewriter.rewrite(&state.question).await?;
    if rewritten.trim().is_empty() {
        return Err(Box::new(PipelineError::EmptyQuestion));
    }
    tracing::debug!(rewritten = %rewritten, "query rewritten");
    state.question = rewritten;
    Ok(state)
}

/// Passthrough. Exists purely as a named node so the final-usefulness
/// decision has a distinct predecessor, decoupled from the groundedness
/// decision on `generate`.
pub async fn prepare_for_final_grade(
    state: GraphState,
) -> Result<GraphState, CollaboratorError> {
    tracing::info!("prepare for final grade");
    Ok(state)
}
