//! Observer trait for pipeline state changes.
//!
//! The orchestrator owns the state, but while `run()` is awaiting the
//! extractor or the service nobody else can look at it. Presentation layers
//! (the CLI spinner, a web socket, a log sink) register an
//! [`Arc<dyn PipelineObserver>`] instead and are told about every
//! transition as it happens.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2quiz::{PipelineObserver, StateKind};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Recorder(Mutex<Vec<StateKind>>);
//!
//! impl PipelineObserver for Recorder {
//!     fn on_transition(&self, _from: StateKind, to: StateKind) {
//!         self.0.lock().unwrap().push(to);
//!     }
//! }
//!
//! let recorder: Arc<dyn PipelineObserver> = Arc::new(Recorder::default());
//! recorder.on_transition(StateKind::Ready, StateKind::Extracting);
//! ```

use crate::orchestrator::{PipelineFailure, StateKind};
use crate::quiz::QuizData;
use std::sync::Arc;

/// Receives orchestrator events. All methods default to no-ops.
pub trait PipelineObserver: Send + Sync {
    /// Called after every state change.
    fn on_transition(&self, from: StateKind, to: StateKind) {
        let _ = (from, to);
    }

    /// Called when extraction succeeds, before generation starts.
    ///
    /// # Arguments
    /// * `chars`   — characters extracted from the document
    /// * `clipped` — true if only the first `max_input_chars` will be sent
    fn on_text_extracted(&self, chars: usize, clipped: bool) {
        let _ = (chars, clipped);
    }

    /// Called when generation returns a normalised result.
    fn on_quiz_generated(&self, quiz: &QuizData) {
        let _ = quiz;
    }

    /// Called when the pipeline parks in `Failed`.
    fn on_failure(&self, failure: &PipelineFailure) {
        let _ = failure;
    }
}

/// Observer that ignores every event. The default.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Convenience alias for the type held by the orchestrator.
pub type SharedObserver = Arc<dyn PipelineObserver>;
