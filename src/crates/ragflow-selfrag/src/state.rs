//! Shared state threaded through a self-RAG run
//!
//! One [`GraphState`] value is created per run and handed from step to step.
//! It is a structured record rather than a loose key/value map: every field a
//! step may read or write is declared here with its type and its "unset"
//! representation, so a step cannot consume a key no predecessor produced.

use serde::{Deserialize, Serialize};

/// A retrieved document: candidate evidence for the current question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The document text graders and the generator consume.
    pub content: String,

    /// Retriever-supplied metadata (source, chunk ids, scores). Opaque to
    /// the pipeline; carried through grading untouched.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    /// Create a document with empty metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: serde_json::Map::new(),
        }
    }
}

/// The mutable record threaded through every step of a run.
///
/// Field lifecycle over one pass of the happy path:
///
/// | Field | Written by |
/// |---|---|
/// | `question` | caller, then overwritten by `transform_query` on refinement |
/// | `documents` | `retrieve`, then filtered in place by `grade_documents` |
/// | `generation` | `generate` - overwritten, never appended, on each attempt |
/// | `documents_dropped` | `grade_documents` |
///
/// `generation` is `None` until the first `generate` invocation; the run's
/// answer is the value it holds when the terminal outcome is reached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphState {
    /// Current query driving retrieval. Non-empty for the whole run.
    pub question: String,

    /// Candidate evidence for the current question. After `grade_documents`,
    /// only documents judged relevant remain (possibly none).
    #[serde(default)]
    pub documents: Vec<Document>,

    /// Current draft answer; `None` before the first generation attempt.
    #[serde(default)]
    pub generation: Option<String>,

    /// Whether the last grading pass dropped at least one document. Recorded
    /// for observability; routing keys off the surviving set instead.
    #[serde(default)]
    pub documents_dropped: bool,
}

impl GraphState {
    /// Initial state for a fresh run.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }
}
