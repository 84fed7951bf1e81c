//! End-to-end workflow tests with scripted collaborators: the happy path,
//! the query-refinement cycle, the regeneration self-loop, loop bounds, and
//! failure propagation.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use ragflow_selfrag::{
    CollaboratorError, Collaborators, Document, ExecutionConfig, Generator, GraphError,
    Groundedness, GroundednessJudge, PipelineError, QueryRewriter, Relevance, RelevanceGrader,
    Retriever, SelfRag, Usefulness, UsefulnessJudge,
};

const QUESTION: &str = "Explain how the different types of agent memory work?";

/// Returns scripted batches in order; repeats the last batch once exhausted.
/// Records every question it was asked.
struct ScriptedRetriever {
    calls: Mutex<Vec<String>>,
    batches: Mutex<VecDeque<Vec<Document>>>,
}

impl ScriptedRetriever {
    fn new(batches: impl IntoIterator<Item = Vec<Document>>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            batches: Mutex::new(batches.into_iter().collect()),
        })
    }

    fn questions(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for ScriptedRetriever {
    async fn retrieve(&self, question: &str) -> Result<Vec<Document>, CollaboratorError> {
        self.calls.lock().unwrap().push(question.to_string());
        let mut batches = self.batches.lock().unwrap();
        if batches.len() > 1 {
            Ok(batches.pop_front().unwrap())
        } else {
            Ok(batches.front().cloned().unwrap_or_default())
        }
    }
}

/// Relevant iff the document mentions the keyword.
struct KeywordGrader {
    keyword: &'static str,
}

#[async_trait]
impl RelevanceGrader for KeywordGrader {
    async fn grade(
        &self,
        _question: &str,
        document: &Document,
    ) -> Result<Relevance, CollaboratorError> {
        if document.content.contains(self.keyword) {
            Ok(Relevance::Relevant)
        } else {
            Ok(Relevance::NotRelevant)
        }
    }
}

/// Returns scripted drafts in order (repeating the last), recording the
/// exact inputs of every call.
struct ScriptedGenerator {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    drafts: Mutex<VecDeque<String>>,
}

impl ScriptedGenerator {
    fn new(drafts: impl IntoIterator<Item = &'static str>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            drafts: Mutex::new(drafts.into_iter().map(String::from).collect()),
        })
    }

    fn inputs(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        question: &str,
        documents: &[Document],
    ) -> Result<String, CollaboratorError> {
        self.calls.lock().unwrap().push((
            question.to_string(),
            documents.iter().map(|d| d.content.clone()).collect(),
        ));
        let mut drafts = self.drafts.lock().unwrap();
        if drafts.len() > 1 {
            Ok(drafts.pop_front().unwrap())
        } else {
            Ok(drafts.front().cloned().unwrap_or_else(|| "draft".to_string()))
        }
    }
}

/// Appends a marker so every rewrite is a distinct question.
struct SuffixRewriter {
    calls: Mutex<usize>,
}

impl SuffixRewriter {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(0),
        })
    }

    fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl QueryRewriter for SuffixRewriter {
    async fn rewrite(&self, question: &str) -> Result<String, CollaboratorError> {
        *self.calls.lock().unwrap() += 1;
        Ok(format!("{question} (refined)"))
    }
}

/// Pops scripted verdicts; falls back to a default once exhausted.
struct ScriptedGroundedness {
    verdicts: Mutex<VecDeque<Groundedness>>,
    default: Groundedness,
}

impl ScriptedGroundedness {
    fn new(verdicts: impl IntoIterator<Item = Groundedness>, default: Groundedness) -> Arc<Self> {
        Arc::new(Self {
            verdicts: Mutex::new(verdicts.into_iter().collect()),
            default,
        })
    }
}

#[async_trait]
impl GroundednessJudge for ScriptedGroundedness {
    async fn judge(
        &self,
        _generation: &str,
        _documents: &[Document],
    ) -> Result<Groundedness, CollaboratorError> {
        Ok(self
            .verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default))
    }
}

struct ScriptedUsefulness {
    verdicts: Mutex<VecDeque<Usefulness>>,
    default: Usefulness,
}

impl ScriptedUsefulness {
    fn new(verdicts: impl IntoIterator<Item = Usefulness>, default: Usefulness) -> Arc<Self> {
        Arc::new(Self {
            verdicts: Mutex::new(verdicts.into_iter().collect()),
            default,
        })
    }
}

#[async_trait]
impl UsefulnessJudge for ScriptedUsefulness {
    async fn judge(
        &self,
        _generation: &str,
        _question: &str,
    ) -> Result<Usefulness, CollaboratorError> {
        Ok(self
            .verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default))
    }
}

struct Mocks {
    retriever: Arc<ScriptedRetriever>,
    generator: Arc<ScriptedGenerator>,
    rewriter: Arc<SuffixRewriter>,
}

fn memory_documents() -> Vec<Document> {
    vec![
        Document::new("Short-term memory holds the current conversation window."),
        Document::new("Long-term memory persists facts across sessions."),
        Document::new("A recipe for sourdough bread."),
    ]
}

/// One collaborator set with handles kept for assertions.
fn collaborators(
    batches: Vec<Vec<Document>>,
    drafts: Vec<&'static str>,
    groundedness: Arc<ScriptedGroundedness>,
    usefulness: Arc<ScriptedUsefulness>,
) -> (Collaborators, Mocks) {
    let retriever = ScriptedRetriever::new(batches);
    let generator = ScriptedGenerator::new(drafts);
    let rewriter = SuffixRewriter::new();
    let set = Collaborators {
        retriever: retriever.clone(),
        relevance_grader: Arc::new(KeywordGrader { keyword: "memory" }),
        generator: generator.clone(),
        query_rewriter: rewriter.clone(),
        groundedness_judge: groundedness,
        usefulness_judge: usefulness,
    };
    (
        set,
        Mocks {
            retriever,
            generator,
            rewriter,
        },
    )
}

#[tokio::test]
async fn happy_path_terminates_after_one_generation_pass() {
    let draft = "Agent memory splits into short-term context and long-term stores.";
    let (set, mocks) = collaborators(
        vec![memory_documents()],
        vec![draft],
        ScriptedGroundedness::new([], Groundedness::Supported),
        ScriptedUsefulness::new([], Usefulness::Useful),
    );

    let pipeline = SelfRag::new(set).unwrap();
    let answer = pipeline.answer(QUESTION).await.unwrap();

    assert_eq!(answer, draft);
    assert_eq!(mocks.retriever.questions(), vec![QUESTION.to_string()]);
    assert_eq!(mocks.rewriter.call_count(), 0);

    // Exactly one pass through generate, fed only the two relevant documents.
    let inputs = mocks.generator.inputs();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].0, QUESTION);
    assert_eq!(inputs[0].1.len(), 2);
    assert!(inputs[0].1.iter().all(|c| c.contains("memory")));
}

#[tokio::test]
async fn zero_relevant_documents_trigger_query_rewrite() {
    let (set, mocks) = collaborators(
        vec![
            vec![Document::new("nothing about the topic at all")],
            memory_documents(),
        ],
        vec!["Memory comes in several kinds."],
        ScriptedGroundedness::new([], Groundedness::Supported),
        ScriptedUsefulness::new([], Usefulness::Useful),
    );

    let pipeline = SelfRag::new(set).unwrap();
    let answer = pipeline.answer(QUESTION).await.unwrap();

    assert_eq!(answer, "Memory comes in several kinds.");
    assert_eq!(mocks.rewriter.call_count(), 1);

    // Retrieval ran twice, with two distinct question values.
    let questions = mocks.retriever.questions();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0], QUESTION);
    assert_eq!(questions[1], format!("{QUESTION} (refined)"));
    assert_ne!(questions[0], questions[1]);
}

#[tokio::test]
async fn unsupported_draft_regenerates_with_identical_inputs() {
    let (set, mocks) = collaborators(
        vec![memory_documents()],
        vec!["first draft", "second draft"],
        ScriptedGroundedness::new(
            [Groundedness::NotSupported, Groundedness::Supported],
            Groundedness::Supported,
        ),
        ScriptedUsefulness::new([], Usefulness::Useful),
    );

    let pipeline = SelfRag::new(set).unwrap();
    let answer = pipeline.answer(QUESTION).await.unwrap();

    // Overwritten, not appended: the answer is the second draft alone.
    assert_eq!(answer, "second draft");

    // The generator was re-invoked with the same (question, documents) pair.
    let inputs = mocks.generator.inputs();
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[0], inputs[1]);
}

#[tokio::test]
async fn regeneration_self_loop_respects_step_limit() {
    let (set, _mocks) = collaborators(
        vec![memory_documents()],
        vec!["a draft"],
        ScriptedGroundedness::new([], Groundedness::NotSupported),
        ScriptedUsefulness::new([], Usefulness::Useful),
    );

    let pipeline = SelfRag::new(set).unwrap();
    let err = pipeline
        .answer_with_config(QUESTION, ExecutionConfig::default().with_step_limit(8))
        .await
        .unwrap_err();

    match err {
        PipelineError::Graph(GraphError::LoopLimitExceeded { limit, node }) => {
            assert_eq!(limit, 8);
            assert_eq!(node, "generate");
        }
        other => panic!("expected loop limit error, got {other}"),
    }
}

#[tokio::test]
async fn refinement_cycle_respects_step_limit() {
    let (set, mocks) = collaborators(
        vec![memory_documents()],
        vec!["a draft"],
        ScriptedGroundedness::new([], Groundedness::Supported),
        ScriptedUsefulness::new([], Usefulness::NotUseful),
    );

    let pipeline = SelfRag::new(set).unwrap();
    let err = pipeline
        .answer_with_config(QUESTION, ExecutionConfig::default().with_step_limit(12))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Graph(GraphError::LoopLimitExceeded { limit: 12, .. })
    ));
    // The loop made real trips through the rewriter before the bound hit.
    assert!(mocks.rewriter.call_count() >= 1);
}

#[tokio::test]
async fn stream_yields_every_step_in_execution_order() {
    let draft = "Agent memory splits into short-term context and long-term stores.";
    let (set, _mocks) = collaborators(
        vec![memory_documents()],
        vec![draft],
        ScriptedGroundedness::new([], Groundedness::Supported),
        ScriptedUsefulness::new([], Usefulness::Useful),
    );

    let pipeline = SelfRag::new(set).unwrap();
    let events: Vec<_> = Box::pin(pipeline.stream(QUESTION).unwrap())
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    let nodes: Vec<&str> = events.iter().map(|e| e.node.as_str()).collect();
    assert_eq!(
        nodes,
        vec![
            "retrieve",
            "grade_documents",
            "generate",
            "prepare_for_final_grade",
        ]
    );

    // Observable history: documents appear after retrieve, shrink after
    // grading, and the final event carries the answer.
    assert_eq!(events[0].state.documents.len(), 3);
    assert_eq!(events[1].state.documents.len(), 2);
    assert!(events[1].state.documents_dropped);
    assert_eq!(events[3].state.generation.as_deref(), Some(draft));
}

#[tokio::test]
async fn retriever_failure_fails_the_run() {
    struct FailingRetriever;

    #[async_trait]
    impl Retriever for FailingRetriever {
        async fn retrieve(&self, _: &str) -> Result<Vec<Document>, CollaboratorError> {
            Err("vector index unreachable".into())
        }
    }

    let (mut set, _mocks) = collaborators(
        vec![memory_documents()],
        vec!["a draft"],
        ScriptedGroundedness::new([], Groundedness::Supported),
        ScriptedUsefulness::new([], Usefulness::Useful),
    );
    set.retriever = Arc::new(FailingRetriever);

    let pipeline = SelfRag::new(set).unwrap();
    let err = pipeline.answer(QUESTION).await.unwrap_err();

    match err {
        PipelineError::Graph(GraphError::NodeExecution { node, source }) => {
            assert_eq!(node, "retrieve");
            assert!(source.to_string().contains("vector index unreachable"));
        }
        other => panic!("expected node execution failure, got {other}"),
    }
}

#[tokio::test]
async fn empty_question_is_rejected_before_running() {
    let (set, mocks) = collaborators(
        vec![memory_documents()],
        vec!["a draft"],
        ScriptedGroundedness::new([], Groundedness::Supported),
        ScriptedUsefulness::new([], Usefulness::Useful),
    );

    let pipeline = SelfRag::new(set).unwrap();
    let err = pipeline.answer("   ").await.unwrap_err();

    assert!(matches!(err, PipelineError::EmptyQuestion));
    assert!(mocks.retriever.questions().is_empty());
}

#[tokio::test]
async fn workflow_exposes_the_five_step_names() {
    let (set, _mocks) = collaborators(
        vec![memory_documents()],
        vec!["a draft"],
        ScriptedGroundedness::new([], Groundedness::Supported),
        ScriptedUsefulness::new([], Usefulness::Useful),
    );

    let pipeline = SelfRag::new(set).unwrap();
    let mut names = pipeline.graph().node_names();
    names.sort_unstable();
    assert_eq!(
        names,
        vec![
            "generate",
            "grade_documents",
            "prepare_for_final_grade",
            "retrieve",
            "transform_query",
        ]
    );
}
