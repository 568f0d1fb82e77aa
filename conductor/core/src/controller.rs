//! Chat Session Controller
//!
//! The controller orchestrates one chat session:
//! - Transcript mutation (greeting, user turns, placeholder, verdicts)
//! - File staging through the injected reader and the extension allow-list
//! - The single in-flight submission to the analysis backend
//!
//! # Design Philosophy
//!
//! The controller is UI-agnostic. Surfaces call its operations and watch
//! [`SessionSnapshot`]s; they never touch session state directly. Every
//! operation mutates the session inside one critical section and publishes
//! exactly one snapshot, so a surface never sees a half-applied update.
//!
//! # Submission lifecycle
//!
//! ```text
//! Idle ──submit()──► Submitting ──run()──► Resolved ──► Idle
//!                     (analyzing,           (placeholder swapped
//!                      placeholder shown)    for the final message)
//! ```
//!
//! [`ChatController::submit`] does the synchronous part (user turn,
//! staging cleared, placeholder) and hands back a [`Submission`]. Awaiting
//! [`Submission::run`] performs the network call and resolves the
//! transcript. While a submission is outstanding, further `submit` calls
//! are rejected as [`SubmitRejected::Busy`].

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;

use crate::backend::{AnalysisBackend, AnalysisError, AnalysisRequest};
use crate::intake::{
    decode_selection, ExtensionAllowList, FileHandle, FileReader, FsFileReader, StageReport,
};
use crate::messages::{AnalysisResult, AttachedFile, Message, Prediction, SessionId};
use crate::presentation::{format_percent, UNKNOWN_PERCENT};
use crate::session::{Session, SessionSnapshot};

/// Greeting shown at the start of every session
pub const DEFAULT_GREETING: &str = "Hello! I'm the SemEval 2026 Task 13 code detection assistant. \
Paste any code snippet or upload code files and I'll analyze whether it's human-written or \
machine-generated.";

/// Content of the transient placeholder
pub const PLACEHOLDER_TEXT: &str = "Analyzing...";

/// Resolution used when a submission is dropped before it runs
const ABANDONED_REASON: &str = "submission was abandoned before completing";

/// Controller configuration
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Greeting for new sessions
    pub greeting: String,
    /// Accepted upload extensions
    pub allow_list: ExtensionAllowList,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            allow_list: ExtensionAllowList::default(),
        }
    }
}

/// Why a submit call did nothing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    /// No text and no staged files
    #[error("nothing to submit")]
    Empty,
    /// A submission is already in flight
    #[error("an analysis is already in progress")]
    Busy,
}

/// Handle to the chat session controller
///
/// Cloning is cheap; clones share the same session.
pub struct ChatController<B: AnalysisBackend> {
    backend: Arc<B>,
    reader: Arc<dyn FileReader>,
    allow_list: Arc<ExtensionAllowList>,
    session: Arc<Mutex<Session>>,
    updates: Arc<watch::Sender<SessionSnapshot>>,
}

impl<B: AnalysisBackend> Clone for ChatController<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            reader: Arc::clone(&self.reader),
            allow_list: Arc::clone(&self.allow_list),
            session: Arc::clone(&self.session),
            updates: Arc::clone(&self.updates),
        }
    }
}

impl<B: AnalysisBackend + 'static> ChatController<B> {
    /// Create a controller with a fresh session, reading files from disk
    pub fn new(backend: B, config: ControllerConfig) -> Self {
        let session = Session::new(config.greeting);
        let (updates, _) = watch::channel(session.snapshot());

        Self {
            backend: Arc::new(backend),
            reader: Arc::new(FsFileReader),
            allow_list: Arc::new(config.allow_list),
            session: Arc::new(Mutex::new(session)),
            updates: Arc::new(updates),
        }
    }

    /// Replace the file-reading capability
    #[must_use]
    pub fn with_reader(mut self, reader: impl FileReader + 'static) -> Self {
        self.reader = Arc::new(reader);
        self
    }

    /// The analysis backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The accepted upload extensions
    pub fn allow_list(&self) -> &ExtensionAllowList {
        &self.allow_list
    }

    /// Watch session snapshots; the receiver starts at the current state
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    /// Current session state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    /// Whether a submission is in flight
    pub fn is_analyzing(&self) -> bool {
        self.session.lock().is_analyzing()
    }

    /// Start a new session: one greeting, nothing staged, not analyzing
    pub fn new_session(&self) {
        let mut session = self.session.lock();
        session.reset();
        tracing::info!(session = %session.id(), "Started new session");
        self.publish(&session);
    }

    /// Stage user-selected files
    ///
    /// Files outside the allow-list are dropped, decode failures are
    /// skipped; neither adds a transcript message. Accepted files are
    /// appended in selection order.
    pub async fn stage_files(&self, handles: Vec<FileHandle>) -> StageReport {
        let (files, report) =
            decode_selection(self.reader.as_ref(), &self.allow_list, handles).await;

        if !files.is_empty() {
            let mut session = self.session.lock();
            session.stage(files);
            tracing::debug!(
                staged = session.pending_files().len(),
                accepted = report.accepted.len(),
                "Staged files"
            );
            self.publish(&session);
        }

        report
    }

    /// Remove the staged file at `index`; out of range does nothing
    pub fn remove_staged_file(&self, index: usize) -> Option<AttachedFile> {
        let mut session = self.session.lock();
        let removed = session.remove_staged(index)?;
        tracing::debug!(file = %removed.name, index, "Removed staged file");
        self.publish(&session);
        Some(removed)
    }

    /// Begin a submission
    ///
    /// On success the user turn and the placeholder are already in the
    /// transcript, staging is cleared and the session is analyzing. The
    /// caller should clear its text input and then await
    /// [`Submission::run`], directly or on a spawned task.
    pub fn submit(&self, text: &str) -> Result<Submission<B>, SubmitRejected> {
        let mut session = self.session.lock();

        if session.is_analyzing() {
            tracing::debug!("Submit ignored: analysis in flight");
            return Err(SubmitRejected::Busy);
        }

        let trimmed = text.trim();
        if trimmed.is_empty() && session.pending_files().is_empty() {
            return Err(SubmitRejected::Empty);
        }

        let files = session.take_pending();
        let summary = if trimmed.is_empty() {
            format!("Uploaded {} file(s) for analysis", files.len())
        } else {
            trimmed.to_string()
        };
        let request = AnalysisRequest::new(trimmed, files.clone());

        session.push(Message::user(summary, files));
        session.set_analyzing(true);
        session.push(Message::placeholder(PLACEHOLDER_TEXT));

        tracing::info!(
            session = %session.id(),
            parts = request.parts().len(),
            backend = self.backend.name(),
            "Submitting for analysis"
        );
        self.publish(&session);

        Ok(Submission {
            controller: self.clone(),
            session_id: session.id().clone(),
            request,
            resolved: false,
        })
    }

    /// Submit and wait for the final assistant message
    pub async fn submit_and_wait(&self, text: &str) -> Result<Message, SubmitRejected> {
        let submission = self.submit(text)?;
        Ok(submission.run().await)
    }

    /// Swap the placeholder for `message` and release the guard
    fn resolve(&self, session_id: &SessionId, message: Message) {
        let mut session = self.session.lock();

        if session.id() != session_id {
            tracing::debug!(
                stale = %session_id,
                current = %session.id(),
                "Discarding result for a session that was reset"
            );
            return;
        }

        session.replace_last(message);
        session.set_analyzing(false);
        self.publish(&session);
    }

    fn publish(&self, session: &Session) {
        self.updates.send_replace(session.snapshot());
    }
}

/// An accepted submission waiting for its network round-trip
#[must_use = "a submission stays in flight until it is run"]
pub struct Submission<B: AnalysisBackend + 'static> {
    controller: ChatController<B>,
    session_id: SessionId,
    request: AnalysisRequest,
    resolved: bool,
}

impl<B: AnalysisBackend + 'static> Submission<B> {
    /// What will be sent
    pub fn request(&self) -> &AnalysisRequest {
        &self.request
    }

    /// Perform the analysis and resolve the transcript
    ///
    /// Never fails: transport and server errors become an `Error: ...`
    /// assistant message. The in-flight guard is released either way.
    pub async fn run(mut self) -> Message {
        let outcome = self
            .controller
            .backend
            .submit_for_analysis(&self.request)
            .await;

        match &outcome {
            Ok(result) => tracing::info!(
                prediction = %result.prediction,
                probability = ?result.probability_machine_generated,
                model = ?result.model,
                "Analysis complete"
            ),
            Err(e) => tracing::warn!(error = %e, "Analysis failed"),
        }

        let message = completion_message(outcome);
        self.controller.resolve(&self.session_id, message.clone());
        self.resolved = true;
        message
    }
}

impl<B: AnalysisBackend + 'static> Drop for Submission<B> {
    fn drop(&mut self) {
        if !self.resolved {
            tracing::warn!(session = %self.session_id, "Submission dropped before completing");
            self.controller.resolve(
                &self.session_id,
                Message::assistant(format!("Error: {ABANDONED_REASON}")),
            );
        }
    }
}

/// Build the final assistant message for an analysis outcome
pub fn completion_message(outcome: Result<AnalysisResult, AnalysisError>) -> Message {
    match outcome {
        Ok(result) => Message::assistant_analysis(narrate(&result), result),
        Err(AnalysisError::Rejected(reason)) => Message::assistant(reason),
        Err(e) => Message::assistant(format!("Error: {e}")),
    }
}

/// Narrative for a verdict: model name and machine probability
pub fn narrate(result: &AnalysisResult) -> String {
    let model = result.model.as_deref().unwrap_or("classifier");
    let verdict = result.prediction.label();
    match result.probability_machine_generated {
        None if result.prediction == Prediction::Unknown => format!(
            "Model {model} did not report a verdict. \
             Machine-generated probability: {UNKNOWN_PERCENT}."
        ),
        Some(p) => format!(
            "Model {model} estimates a {} probability that this code is machine-generated. \
             Verdict: {verdict}.",
            format_percent(p * 100.0)
        ),
        None => format!(
            "Model {model} classified this code as {verdict} but did not report a probability."
        ),
    }
}
