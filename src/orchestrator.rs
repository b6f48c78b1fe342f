//! Pipeline orchestrator: the state machine that drives a document from
//! selection to a presentable quiz.
//!
//! ## States
//!
//! ```text
//!                 submit_credential
//! CredentialNeeded ───────────────▶ Ready ◀─────────────── retry / restart
//!        ▲                            │                          │
//!        │ retry_credential           │ select_file              │
//!        │ (credential failures)      ▼                          │
//!        │                       Extracting ──run()──▶ Generating ──▶ Complete
//!        │                            │                    │
//!        └──────────────────────── Failed ◀────────────────┘
//! ```
//!
//! `Complete` and `Failed` are resting states; nothing is terminal.
//!
//! ## Driving the pipeline
//!
//! Entering `Extracting` does not start work by itself. The caller drives the
//! edge once with [`Orchestrator::run`], which takes the pending document out
//! of the orchestrator before awaiting anything. A second `run()` finds no
//! document and is a no-op, so re-entry can never extract or generate twice.
//!
//! ## Failure classification
//!
//! Every stage error is caught here and parked in `Failed` as a
//! [`PipelineFailure`]. An error whose message contains
//! [`crate::error::CREDENTIAL_REJECTION_MARKER`] (case-insensitive), or a
//! missing key, is credential-flagged: the only way forward is
//! [`Orchestrator::retry_credential`]. Anything else offers
//! [`Orchestrator::retry`].

use crate::credential::{Credential, CredentialStore};
use crate::error::QuizError;
use crate::observer::{NoopObserver, SharedObserver};
use crate::pipeline::extract::TextExtractor;
use crate::pipeline::generate::QuizGenerator;
use crate::pipeline::input::Document;
use crate::quiz::QuizData;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Shown when a non-PDF document is selected.
pub const UNSUPPORTED_FILE_MESSAGE: &str = "Only PDF files are accepted. Please try again.";

/// Shown when the API key is missing or was rejected.
pub const CREDENTIAL_FAILURE_MESSAGE: &str =
    "Your API Key appears to be invalid or has expired. Please enter a valid key.";

/// Shown when generation succeeded but every section came back empty.
pub const NO_CONTENT_MESSAGE: &str =
    "Content could not be generated from this document. Try a different file.";

// ── State ────────────────────────────────────────────────────────────────

/// Payload-free discriminant of [`PipelineState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    CredentialNeeded,
    Ready,
    Extracting,
    Generating,
    Complete,
    Failed,
}

impl StateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKind::CredentialNeeded => "waiting for an API key",
            StateKind::Ready => "ready",
            StateKind::Extracting => "extracting text",
            StateKind::Generating => "generating",
            StateKind::Complete => "complete",
            StateKind::Failed => "failed",
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse failure class carried by a [`PipelineFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UnsupportedFileType,
    Extraction,
    InvalidCredential,
    Generation,
}

/// A classified failure, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineFailure {
    pub kind: FailureKind,
    /// User-facing message.
    pub message: String,
    /// Underlying error text, for logs and verbose output.
    pub detail: String,
    /// True when the user must enter a different API key.
    pub credential_rejected: bool,
}

impl PipelineFailure {
    /// Classify a stage error.
    pub fn classify(err: &QuizError) -> Self {
        let detail = err.to_string();
        if err.is_credential_failure() {
            return Self {
                kind: FailureKind::InvalidCredential,
                message: CREDENTIAL_FAILURE_MESSAGE.to_string(),
                detail,
                credential_rejected: true,
            };
        }
        let (kind, message) = match err {
            QuizError::UnsupportedFileType { .. } => (
                FailureKind::UnsupportedFileType,
                UNSUPPORTED_FILE_MESSAGE.to_string(),
            ),
            QuizError::Extraction { .. } => (
                FailureKind::Extraction,
                format!("Failed to process your request. {}", detail),
            ),
            _ => (
                FailureKind::Generation,
                format!("Failed to process your request. {}", detail),
            ),
        };
        Self {
            kind,
            message,
            detail,
            credential_rejected: false,
        }
    }
}

/// Orchestration progress. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    CredentialNeeded,
    Ready,
    Extracting { document_name: String },
    Generating { document_name: String },
    Complete { quiz: QuizData },
    Failed { failure: PipelineFailure },
}

impl PipelineState {
    pub fn kind(&self) -> StateKind {
        match self {
            PipelineState::CredentialNeeded => StateKind::CredentialNeeded,
            PipelineState::Ready => StateKind::Ready,
            PipelineState::Extracting { .. } => StateKind::Extracting,
            PipelineState::Generating { .. } => StateKind::Generating,
            PipelineState::Complete { .. } => StateKind::Complete,
            PipelineState::Failed { .. } => StateKind::Failed,
        }
    }

    pub fn quiz(&self) -> Option<&QuizData> {
        match self {
            PipelineState::Complete { quiz } => Some(quiz),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&PipelineFailure> {
        match self {
            PipelineState::Failed { failure } => Some(failure),
            _ => None,
        }
    }

    /// What a presentation layer should show for this state.
    pub fn screen(&self) -> Screen<'_> {
        match self {
            PipelineState::CredentialNeeded => Screen::CredentialEntry,
            PipelineState::Ready => Screen::FileSelection,
            PipelineState::Extracting { document_name }
            | PipelineState::Generating { document_name } => Screen::Processing {
                stage: self.kind(),
                document_name,
            },
            PipelineState::Complete { quiz } if quiz.is_empty() => Screen::NoContent,
            PipelineState::Complete { quiz } => Screen::Results(quiz),
            PipelineState::Failed { failure } => Screen::Error {
                message: &failure.message,
                credential_rejected: failure.credential_rejected,
            },
        }
    }
}

/// Presentation view of a [`PipelineState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen<'a> {
    CredentialEntry,
    FileSelection,
    Processing {
        stage: StateKind,
        document_name: &'a str,
    },
    Results(&'a QuizData),
    /// Generation succeeded but produced nothing. Not an error.
    NoContent,
    Error {
        message: &'a str,
        credential_rejected: bool,
    },
}

// ── Orchestrator ─────────────────────────────────────────────────────────

/// Drives one document at a time through extraction and generation.
pub struct Orchestrator {
    store: Box<dyn CredentialStore>,
    extractor: Arc<dyn TextExtractor>,
    generator: Arc<dyn QuizGenerator>,
    observer: SharedObserver,
    state: PipelineState,
    document: Option<Document>,
    last_error: Option<QuizError>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("state", &self.state)
            .field("document", &self.document)
            .field("has_credential", &self.store.get().is_some())
            .finish()
    }
}

impl Orchestrator {
    /// Create an orchestrator. Starts in `Ready` if the store already holds
    /// a key, otherwise in `CredentialNeeded`.
    pub fn new(
        store: impl CredentialStore + 'static,
        extractor: Arc<dyn TextExtractor>,
        generator: Arc<dyn QuizGenerator>,
    ) -> Self {
        let state = if store.get().is_some() {
            PipelineState::Ready
        } else {
            PipelineState::CredentialNeeded
        };
        Self {
            store: Box::new(store),
            extractor,
            generator,
            observer: Arc::new(NoopObserver),
            state,
            document: None,
            last_error: None,
        }
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn credential(&self) -> Option<Credential> {
        self.store.get()
    }

    /// Take the error behind the current `Failed` state, if any.
    pub fn take_error(&mut self) -> Option<QuizError> {
        self.last_error.take()
    }

    /// True while a selected document is waiting for `run()`.
    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    // ── Transitions ──────────────────────────────────────────────────────

    /// `CredentialNeeded → Ready`, storing the key for the session.
    ///
    /// A blank key is refused with [`QuizError::MissingCredential`] and the
    /// state does not change.
    pub fn submit_credential(&mut self, raw: impl Into<Credential>) -> Result<(), QuizError> {
        self.expect_state(&[StateKind::CredentialNeeded], "submit an API key")?;
        let credential = raw.into();
        if credential.is_empty() {
            return Err(QuizError::MissingCredential);
        }
        self.store.set(credential);
        self.transition(PipelineState::Ready);
        Ok(())
    }

    /// `Ready → Extracting`, or `Ready → Failed` for a non-PDF document.
    ///
    /// A non-PDF is rejected on its declared media type alone; the extractor
    /// is never called for it.
    pub fn select_file(&mut self, document: Document) -> Result<(), QuizError> {
        self.expect_state(&[StateKind::Ready], "select a file")?;

        if !document.is_pdf() {
            let err = QuizError::UnsupportedFileType {
                media_type: document.media_type().to_string(),
            };
            self.fail(err);
            return Ok(());
        }

        let document_name = document.name().to_string();
        debug!("Accepted {:?}", document);
        self.document = Some(document);
        self.transition(PipelineState::Extracting { document_name });
        Ok(())
    }

    /// Drive the `Extracting` edge: extract, then generate.
    ///
    /// Ends in `Complete` or `Failed`. Outside `Extracting`, or when the
    /// pending document was already consumed, this does nothing.
    pub async fn run(&mut self) -> StateKind {
        let document = match self.state {
            PipelineState::Extracting { .. } => self.document.take(),
            _ => None,
        };
        let Some(document) = document else {
            debug!("run() with nothing to process ({})", self.state.kind());
            return self.state.kind();
        };

        let credential = self.store.get().unwrap_or_else(|| Credential::new(""));

        let start = Instant::now();
        let text = match self.extractor.extract(&document).await {
            Ok(text) => text,
            Err(e) => {
                self.fail(e);
                return self.state.kind();
            }
        };
        let document_name = document.name().to_string();
        drop(document);

        let chars = text.chars().count();
        info!("Extracted {} characters in {:?}", chars, start.elapsed());
        self.observer
            .on_text_extracted(chars, chars > self.generator.max_input_chars());

        self.transition(PipelineState::Generating { document_name });

        match self.generator.generate_quiz(&text, &credential).await {
            Ok(quiz) => {
                self.observer.on_quiz_generated(&quiz);
                if quiz.is_empty() {
                    warn!("Generation returned no content in any section");
                }
                self.transition(PipelineState::Complete { quiz });
            }
            Err(e) => self.fail(e),
        }

        info!("Pipeline finished in {:?}", start.elapsed());
        self.state.kind()
    }

    /// Select and run in one call.
    pub async fn process(&mut self, document: Document) -> Result<StateKind, QuizError> {
        self.select_file(document)?;
        Ok(self.run().await)
    }

    /// `Failed → CredentialNeeded` after a credential failure.
    ///
    /// Clears the stored key and the error. The document is not retried.
    pub fn retry_credential(&mut self) -> Result<(), QuizError> {
        let flagged = self
            .state
            .failure()
            .map(|f| f.credential_rejected)
            .unwrap_or(false);
        if !flagged {
            return Err(self.invalid("re-enter the API key"));
        }
        self.store.clear();
        self.document = None;
        self.transition(PipelineState::CredentialNeeded);
        Ok(())
    }

    /// `Failed → Ready` for non-credential failures (also accepted from
    /// `Complete`). Clears document, result and error.
    pub fn retry(&mut self) -> Result<(), QuizError> {
        self.reset_to_ready("retry")
    }

    /// `Complete → Ready` (also accepted from a non-credential `Failed`).
    /// Clears document and result.
    pub fn restart(&mut self) -> Result<(), QuizError> {
        self.reset_to_ready("restart")
    }

    /// Explicit user reset of the API key: back to `CredentialNeeded`.
    ///
    /// Refused while a document is being processed.
    pub fn reset_credential(&mut self) -> Result<(), QuizError> {
        self.expect_state(
            &[
                StateKind::CredentialNeeded,
                StateKind::Ready,
                StateKind::Complete,
                StateKind::Failed,
            ],
            "reset the API key",
        )?;
        self.store.clear();
        self.document = None;
        if self.state.kind() != StateKind::CredentialNeeded {
            self.transition(PipelineState::CredentialNeeded);
        }
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn reset_to_ready(&mut self, action: &'static str) -> Result<(), QuizError> {
        match &self.state {
            PipelineState::Complete { .. } => {}
            PipelineState::Failed { failure } if !failure.credential_rejected => {}
            _ => return Err(self.invalid(action)),
        }
        self.document = None;
        self.transition(PipelineState::Ready);
        Ok(())
    }

    fn expect_state(&self, allowed: &[StateKind], action: &'static str) -> Result<(), QuizError> {
        if allowed.contains(&self.state.kind()) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> QuizError {
        QuizError::InvalidTransition {
            action,
            state: self.state.kind().as_str(),
        }
    }

    fn fail(&mut self, err: QuizError) {
        let failure = PipelineFailure::classify(&err);
        warn!(
            "Pipeline failed ({:?}, credential_rejected={}): {}",
            failure.kind, failure.credential_rejected, failure.detail
        );
        self.document = None;
        self.last_error = Some(err);
        self.transition(PipelineState::Failed {
            failure: failure.clone(),
        });
        self.observer.on_failure(&failure);
    }

    fn transition(&mut self, next: PipelineState) {
        let from = self.state.kind();
        let to = next.kind();
        if from == StateKind::Failed {
            self.last_error = None;
        }
        self.state = next;
        info!("Pipeline: {} → {}", from, to);
        self.observer.on_transition(from, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::SessionCredentialStore;
    use crate::observer::PipelineObserver;
    use crate::quiz::{ShortAnswerQuestion, TopicSummary};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // ── Fakes ────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct FakeExtractor {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TextExtractor for FakeExtractor {
        async fn extract(&self, document: &Document) -> Result<String, QuizError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(QuizError::extraction("image-only pages"));
            }
            Ok(format!("text of {}", document.name()))
        }
    }

    enum Reply {
        Quiz(QuizData),
        Reject,
        Fail(&'static str),
    }

    struct FakeGenerator {
        calls: AtomicUsize,
        reply: Reply,
        seen_key: Mutex<Option<String>>,
        limit: usize,
    }

    impl FakeGenerator {
        fn new(reply: Reply) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply,
                seen_key: Mutex::new(None),
                limit: crate::config::DEFAULT_MAX_INPUT_CHARS,
            }
        }
    }

    #[async_trait]
    impl QuizGenerator for FakeGenerator {
        fn max_input_chars(&self) -> usize {
            self.limit
        }

        async fn generate_quiz(
            &self,
            _text: &str,
            credential: &Credential,
        ) -> Result<QuizData, QuizError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_key.lock().unwrap() = Some(credential.expose().to_string());
            if credential.is_empty() {
                return Err(QuizError::MissingCredential);
            }
            match &self.reply {
                Reply::Quiz(q) => Ok(q.clone()),
                Reply::Reject => Err(QuizError::InvalidCredential),
                Reply::Fail(msg) => Err(QuizError::generation(*msg)),
            }
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(StateKind, StateKind)>>);

    impl PipelineObserver for Recorder {
        fn on_transition(&self, from: StateKind, to: StateKind) {
            self.0.lock().unwrap().push((from, to));
        }
    }

    #[derive(Default)]
    struct ExtractLog(Mutex<Vec<(usize, bool)>>);

    impl PipelineObserver for ExtractLog {
        fn on_text_extracted(&self, chars: usize, clipped: bool) {
            self.0.lock().unwrap().push((chars, clipped));
        }
    }

    fn sample_quiz() -> QuizData {
        QuizData {
            short_answer: vec![ShortAnswerQuestion {
                question: "What is ATP?".into(),
                answer: "Energy currency".into(),
            }],
            topic_summaries: vec![TopicSummary {
                topic: "Cells".into(),
                summary: "Basic unit of life.".into(),
            }],
            ..Default::default()
        }
    }

    fn pdf() -> Document {
        Document::new("notes.pdf", "application/pdf", b"%PDF-1.7".to_vec())
    }

    fn setup(
        key: &str,
        extractor: FakeExtractor,
        reply: Reply,
    ) -> (Orchestrator, Arc<FakeExtractor>, Arc<FakeGenerator>) {
        let extractor = Arc::new(extractor);
        let generator = Arc::new(FakeGenerator::new(reply));
        let orch = Orchestrator::new(
            SessionCredentialStore::with_credential(key),
            extractor.clone(),
            generator.clone(),
        );
        (orch, extractor, generator)
    }

    // ── Initial state and credential entry ───────────────────────────────

    #[test]
    fn initial_state_depends_on_store() {
        let (orch, _, _) = setup("", FakeExtractor::default(), Reply::Quiz(sample_quiz()));
        assert_eq!(orch.state().kind(), StateKind::CredentialNeeded);
        assert_eq!(orch.state().screen(), Screen::CredentialEntry);

        let (orch, _, _) = setup("k", FakeExtractor::default(), Reply::Quiz(sample_quiz()));
        assert_eq!(orch.state().kind(), StateKind::Ready);
    }

    #[test]
    fn submit_stores_credential() {
        let (mut orch, _, _) = setup("", FakeExtractor::default(), Reply::Quiz(sample_quiz()));
        orch.submit_credential("  my-key  ").unwrap();
        assert_eq!(orch.state().kind(), StateKind::Ready);
        assert_eq!(orch.credential(), Some(Credential::new("my-key")));
    }

    #[test]
    fn blank_credential_is_refused_without_state_change() {
        let (mut orch, _, _) = setup("", FakeExtractor::default(), Reply::Quiz(sample_quiz()));
        let err = orch.submit_credential("   ").unwrap_err();
        assert!(matches!(err, QuizError::MissingCredential));
        assert_eq!(orch.state().kind(), StateKind::CredentialNeeded);
        assert!(orch.credential().is_none());
    }

    #[test]
    fn select_file_requires_ready() {
        let (mut orch, ex, _) = setup("", FakeExtractor::default(), Reply::Quiz(sample_quiz()));
        let err = orch.select_file(pdf()).unwrap_err();
        assert!(matches!(err, QuizError::InvalidTransition { .. }));
        assert_eq!(ex.calls.load(Ordering::SeqCst), 0);
    }

    // ── Happy path ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn full_run_reaches_complete() {
        let recorder = Arc::new(Recorder::default());
        let (orch, ex, gen) = setup("k", FakeExtractor::default(), Reply::Quiz(sample_quiz()));
        let mut orch = orch.with_observer(recorder.clone());

        orch.select_file(pdf()).unwrap();
        assert_eq!(orch.state().kind(), StateKind::Extracting);
        assert!(orch.has_document());

        assert_eq!(orch.run().await, StateKind::Complete);
        assert_eq!(orch.state().quiz(), Some(&sample_quiz()));
        assert!(!orch.has_document());
        assert_eq!(ex.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gen.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gen.seen_key.lock().unwrap().as_deref(), Some("k"));

        let transitions = recorder.0.lock().unwrap().clone();
        assert_eq!(
            transitions,
            vec![
                (StateKind::Ready, StateKind::Extracting),
                (StateKind::Extracting, StateKind::Generating),
                (StateKind::Generating, StateKind::Complete),
            ]
        );
    }

    #[tokio::test]
    async fn second_run_is_a_noop() {
        let (mut orch, ex, gen) = setup("k", FakeExtractor::default(), Reply::Quiz(sample_quiz()));
        orch.process(pdf()).await.unwrap();
        assert_eq!(orch.run().await, StateKind::Complete);
        assert_eq!(ex.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gen.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_result_is_no_content_not_error() {
        let (mut orch, _, _) = setup("k", FakeExtractor::default(), Reply::Quiz(QuizData::default()));
        orch.process(pdf()).await.unwrap();
        assert_eq!(orch.state().kind(), StateKind::Complete);
        assert_eq!(orch.state().screen(), Screen::NoContent);
    }

    // ── Failures ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn non_pdf_fails_without_extraction() {
        let (mut orch, ex, gen) = setup("k", FakeExtractor::default(), Reply::Quiz(sample_quiz()));
        let docx = Document::from_named_bytes("essay.docx", b"PK\x03\x04".to_vec());
        orch.select_file(docx).unwrap();

        let failure = orch.state().failure().unwrap();
        assert_eq!(failure.kind, FailureKind::UnsupportedFileType);
        assert_eq!(failure.message, UNSUPPORTED_FILE_MESSAGE);
        assert!(!failure.credential_rejected);

        assert_eq!(orch.run().await, StateKind::Failed);
        assert_eq!(ex.calls.load(Ordering::SeqCst), 0);
        assert_eq!(gen.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn extraction_failure_short_circuits_generation() {
        let extractor = FakeExtractor {
            fail: true,
            ..Default::default()
        };
        let (mut orch, _, gen) = setup("k", extractor, Reply::Quiz(sample_quiz()));
        assert_eq!(orch.process(pdf()).await.unwrap(), StateKind::Failed);

        let failure = orch.state().failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Extraction);
        assert!(failure.message.starts_with("Failed to process your request."));
        assert!(failure.message.contains("image-only pages"));
        assert_eq!(gen.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejected_key_sets_credential_flag() {
        let (mut orch, _, _) = setup("bad", FakeExtractor::default(), Reply::Reject);
        orch.process(pdf()).await.unwrap();

        let failure = orch.state().failure().unwrap();
        assert!(failure.credential_rejected);
        assert_eq!(failure.kind, FailureKind::InvalidCredential);
        assert_eq!(failure.message, CREDENTIAL_FAILURE_MESSAGE);
        assert_eq!(
            orch.state().screen(),
            Screen::Error {
                message: CREDENTIAL_FAILURE_MESSAGE,
                credential_rejected: true
            }
        );
    }

    #[tokio::test]
    async fn marker_in_any_error_message_sets_flag() {
        let (mut orch, _, _) = setup(
            "k",
            FakeExtractor::default(),
            Reply::Fail("upstream said: API Key Is Not Valid"),
        );
        orch.process(pdf()).await.unwrap();
        assert!(orch.state().failure().unwrap().credential_rejected);
    }

    #[tokio::test]
    async fn generic_failure_wraps_error_text() {
        let (mut orch, _, _) = setup("k", FakeExtractor::default(), Reply::Fail("HTTP 503"));
        orch.process(pdf()).await.unwrap();
        let failure = orch.state().failure().unwrap();
        assert!(!failure.credential_rejected);
        assert_eq!(failure.kind, FailureKind::Generation);
        assert!(failure.message.starts_with("Failed to process your request."));
        assert!(failure.message.contains("HTTP 503"));

        let err = orch.take_error().unwrap();
        assert!(matches!(err, QuizError::GenerationFailed { .. }));
        assert!(orch.take_error().is_none());
    }

    // ── Recovery ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn retry_credential_clears_store() {
        let (mut orch, _, _) = setup("bad", FakeExtractor::default(), Reply::Reject);
        orch.process(pdf()).await.unwrap();

        assert!(matches!(
            orch.retry().unwrap_err(),
            QuizError::InvalidTransition { .. }
        ));

        orch.retry_credential().unwrap();
        assert_eq!(orch.state().kind(), StateKind::CredentialNeeded);
        assert!(orch.credential().is_none());
        assert!(orch.state().failure().is_none());
        assert!(!orch.has_document());
    }

    #[tokio::test]
    async fn retry_credential_refused_for_generic_failure() {
        let (mut orch, _, _) = setup("k", FakeExtractor::default(), Reply::Fail("boom"));
        orch.process(pdf()).await.unwrap();
        assert!(orch.retry_credential().is_err());
        assert!(orch.credential().is_some());
    }

    #[tokio::test]
    async fn retry_and_restart_clear_document_and_result() {
        // From Complete.
        let (mut orch, _, _) = setup("k", FakeExtractor::default(), Reply::Quiz(sample_quiz()));
        orch.process(pdf()).await.unwrap();
        orch.restart().unwrap();
        assert_eq!(orch.state(), &PipelineState::Ready);
        assert!(orch.state().quiz().is_none());
        assert!(!orch.has_document());
        assert_eq!(orch.credential(), Some(Credential::new("k")));

        // From Failed (non-credential), via either name.
        for use_retry in [true, false] {
            let (mut orch, _, _) = setup("k", FakeExtractor::default(), Reply::Fail("x"));
            orch.process(pdf()).await.unwrap();
            if use_retry {
                orch.retry().unwrap();
            } else {
                orch.restart().unwrap();
            }
            assert_eq!(orch.state(), &PipelineState::Ready);
            assert!(!orch.has_document());
        }
    }

    #[test]
    fn restart_refused_from_ready() {
        let (mut orch, _, _) = setup("k", FakeExtractor::default(), Reply::Quiz(sample_quiz()));
        assert!(orch.restart().is_err());
        assert_eq!(orch.state().kind(), StateKind::Ready);
    }

    #[tokio::test]
    async fn recovery_from_complete_works_once_via_either_name() {
        // (first call, second call): true = retry, false = restart
        for (first, second) in [(true, true), (true, false), (false, true), (false, false)] {
            let (mut orch, _, _) =
                setup("k", FakeExtractor::default(), Reply::Quiz(sample_quiz()));
            orch.process(pdf()).await.unwrap();
            assert_eq!(orch.state().kind(), StateKind::Complete);

            let recover = |orch: &mut Orchestrator, use_retry: bool| {
                if use_retry {
                    orch.retry()
                } else {
                    orch.restart()
                }
            };

            recover(&mut orch, first).unwrap();
            assert_eq!(orch.state(), &PipelineState::Ready);
            assert!(orch.state().quiz().is_none());
            assert!(!orch.has_document());

            let err = recover(&mut orch, second).unwrap_err();
            assert!(
                matches!(err, QuizError::InvalidTransition { .. }),
                "got: {err:?}"
            );
            assert_eq!(orch.state(), &PipelineState::Ready);
            assert_eq!(orch.credential(), Some(Credential::new("k")));
        }
    }

    #[tokio::test]
    async fn clip_flag_follows_generator_limit() {
        // "text of notes.pdf" is 17 characters.
        for (limit, clipped) in [(10, true), (17, false), (1_000, false)] {
            let log = Arc::new(ExtractLog::default());
            let mut generator = FakeGenerator::new(Reply::Quiz(sample_quiz()));
            generator.limit = limit;
            let mut orch = Orchestrator::new(
                SessionCredentialStore::with_credential("k"),
                Arc::new(FakeExtractor::default()),
                Arc::new(generator),
            )
            .with_observer(log.clone());

            orch.process(pdf()).await.unwrap();
            assert_eq!(*log.0.lock().unwrap(), vec![(17, clipped)], "limit {limit}");
        }
    }

    #[test]
    fn reset_credential_returns_to_entry() {
        let (mut orch, _, _) = setup("k", FakeExtractor::default(), Reply::Quiz(sample_quiz()));
        orch.reset_credential().unwrap();
        assert_eq!(orch.state().kind(), StateKind::CredentialNeeded);
        assert!(orch.credential().is_none());
    }

    #[test]
    fn reset_credential_refused_while_extracting() {
        let (mut orch, _, _) = setup("k", FakeExtractor::default(), Reply::Quiz(sample_quiz()));
        orch.select_file(pdf()).unwrap();
        assert!(orch.reset_credential().is_err());
        assert!(orch.credential().is_some());
    }

    #[tokio::test]
    async fn missing_key_at_generation_is_credential_failure() {
        let (mut orch, _, gen) = setup("k", FakeExtractor::default(), Reply::Quiz(sample_quiz()));
        orch.select_file(pdf()).unwrap();
        // Key cleared behind the orchestrator's back; generation must not proceed.
        orch.store.clear();
        orch.run().await;
        let failure = orch.state().failure().unwrap();
        assert!(failure.credential_rejected);
        assert_eq!(gen.seen_key.lock().unwrap().as_deref(), Some(""));
    }
}
