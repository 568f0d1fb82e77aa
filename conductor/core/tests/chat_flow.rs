//! Integration Tests for the Chat Session Controller
//!
//! These tests drive [`ChatController`] end-to-end against a configurable
//! in-process backend and check the observable transcript after every step.
//!
//! # Test Coverage
//!
//! 1. **Session reset**: one greeting, nothing staged, not analyzing
//! 2. **Staging**: allow-list filtering, selection order, removal
//! 3. **Submission**: empty no-op, file-only summary, success, failure
//! 4. **In-flight guard**: a second submit while analyzing is dropped
//! 5. **Change notification**: snapshots published through the watch channel

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio::sync::Notify;
use tokio::time::timeout;

use codetell_core::backend::NOT_CODE_REPLY;
use codetell_core::controller::{DEFAULT_GREETING, PLACEHOLDER_TEXT};
use codetell_core::{
    AnalysisBackend, AnalysisError, AnalysisRequest, AnalysisResult, ChatController,
    ControllerConfig, FileHandle, FileReader, FsFileReader, IntakeError, MessageRole, MockBackend,
    Prediction, SessionSnapshot, SubmitRejected,
};

// ============================================================================
// Configurable Test Backend
// ============================================================================

/// What the test backend answers with
#[derive(Clone)]
enum Reply {
    Result(AnalysisResult),
    Fail(u16),
}

/// Backend that records requests and can hold its reply until released
struct RecordingBackend {
    reply: Reply,
    request_count: AtomicUsize,
    requests: Mutex<Vec<AnalysisRequest>>,
    gate: Option<Arc<Notify>>,
}

impl RecordingBackend {
    fn answering(probability: f64) -> Self {
        Self {
            reply: Reply::Result(AnalysisResult::from_probability(
                probability,
                0.5,
                Some("adaboost".to_string()),
            )),
            request_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            reply: Reply::Fail(status),
            ..Self::answering(0.0)
        }
    }

    /// Hold every reply until the returned `Notify` is signalled
    fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    fn count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "Recording"
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn submit_for_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match &self.reply {
            Reply::Result(result) => Ok(result.clone()),
            Reply::Fail(status) => Err(AnalysisError::Server { status: *status }),
        }
    }
}

/// Reader that fails for names starting with `broken`
struct FlakyReader;

#[async_trait]
impl FileReader for FlakyReader {
    async fn read_text(&self, handle: &FileHandle) -> Result<String, IntakeError> {
        if handle.name.starts_with("broken") {
            return Err(IntakeError::Io {
                name: handle.name.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, "unreadable"),
            });
        }
        FsFileReader.read_text(handle).await
    }
}

fn controller<B: AnalysisBackend + 'static>(backend: B) -> ChatController<B> {
    ChatController::new(backend, ControllerConfig::default())
}

fn staged_names(snapshot: &SessionSnapshot) -> Vec<String> {
    snapshot.pending_files.iter().map(|f| f.name.clone()).collect()
}

fn assert_fresh(snapshot: &SessionSnapshot) {
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].role, MessageRole::Assistant);
    assert_eq!(snapshot.messages[0].content, DEFAULT_GREETING);
    assert!(snapshot.pending_files.is_empty());
    assert!(!snapshot.analyzing);
}

// ============================================================================
// Session Reset
// ============================================================================

#[tokio::test]
async fn test_new_controller_starts_with_greeting() {
    let controller = controller(RecordingBackend::answering(0.1));
    assert_fresh(&controller.snapshot());
}

#[tokio::test]
async fn test_new_session_after_activity_yields_single_greeting() {
    let controller = controller(RecordingBackend::answering(0.9));
    controller
        .submit_and_wait("def foo(): pass")
        .await
        .unwrap();
    controller
        .stage_files(vec![FileHandle::from_bytes("main.py", "print(1)")])
        .await;

    let before = controller.snapshot().id;
    controller.new_session();
    let after = controller.snapshot();

    assert_fresh(&after);
    assert_ne!(after.id, before);
}

// ============================================================================
// Staging
// ============================================================================

#[tokio::test]
async fn test_staging_keeps_allowed_files_in_selection_order() {
    let controller = controller(RecordingBackend::answering(0.5));

    let report = controller
        .stage_files(vec![
            FileHandle::from_bytes("main.py", "print('hi')"),
            FileHandle::from_bytes("image.png", vec![0x89, 0x50, 0x4e, 0x47]),
            FileHandle::from_bytes("lib.rs", "fn main() {}"),
            FileHandle::from_bytes("README", "docs"),
            FileHandle::from_bytes("App.TSX", "export {}"),
        ])
        .await;

    let snapshot = controller.snapshot();
    assert_eq!(staged_names(&snapshot), vec!["main.py", "lib.rs", "App.TSX"]);
    assert_eq!(report.unsupported, vec!["image.png".to_string(), "README".to_string()]);
    // dropped files never reach the transcript
    assert_eq!(snapshot.messages.len(), 1);
}

#[tokio::test]
async fn test_staging_appends_across_selections() {
    let controller = controller(RecordingBackend::answering(0.5));
    controller
        .stage_files(vec![FileHandle::from_bytes("a.go", "package a")])
        .await;
    controller
        .stage_files(vec![FileHandle::from_bytes("b.kt", "fun main() {}")])
        .await;
    assert_eq!(staged_names(&controller.snapshot()), vec!["a.go", "b.kt"]);
}

#[tokio::test]
async fn test_remove_staged_file_by_index() {
    let controller = controller(RecordingBackend::answering(0.5));
    controller
        .stage_files(vec![
            FileHandle::from_bytes("a.js", "1"),
            FileHandle::from_bytes("b.js", "2"),
            FileHandle::from_bytes("c.js", "3"),
        ])
        .await;

    let removed = controller.remove_staged_file(1).unwrap();
    assert_eq!(removed.name, "b.js");
    assert_eq!(staged_names(&controller.snapshot()), vec!["a.js", "c.js"]);

    assert!(controller.remove_staged_file(7).is_none());
    assert_eq!(staged_names(&controller.snapshot()), vec!["a.js", "c.js"]);
}

#[tokio::test]
async fn test_decode_failure_skips_only_that_file() {
    let controller = controller(RecordingBackend::answering(0.5)).with_reader(FlakyReader);

    let report = controller
        .stage_files(vec![
            FileHandle::from_bytes("first.py", "x = 1"),
            FileHandle::from_bytes("broken.py", "x = 2"),
            FileHandle::from_bytes("last.py", "x = 3"),
        ])
        .await;

    assert_eq!(staged_names(&controller.snapshot()), vec!["first.py", "last.py"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "broken.py");
    assert_eq!(controller.snapshot().messages.len(), 1);
}

#[tokio::test]
async fn test_staging_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("solver.cpp");
    tokio::fs::write(&path, "int main() { return 0; }").await.unwrap();

    let controller = controller(RecordingBackend::answering(0.5));
    let handle = FileHandle::from_path(&path).await.unwrap();
    controller.stage_files(vec![handle]).await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.pending_files[0].name, "solver.cpp");
    assert_eq!(snapshot.pending_files[0].content, "int main() { return 0; }");
    assert_eq!(snapshot.pending_files[0].size, 24);
}

// ============================================================================
// Submission
// ============================================================================

#[tokio::test]
async fn test_empty_submission_is_a_no_op() {
    let backend = RecordingBackend::answering(0.5);
    let controller = controller(backend);

    assert_eq!(controller.submit("").err(), Some(SubmitRejected::Empty));
    assert_eq!(controller.submit(" \n\t ").err(), Some(SubmitRejected::Empty));

    assert_fresh(&controller.snapshot());
    assert_eq!(controller.backend().count(), 0);
}

#[tokio::test]
async fn test_file_only_submission_summarizes_upload() {
    let controller = controller(RecordingBackend::answering(0.2));
    controller
        .stage_files(vec![FileHandle::from_bytes("main.py", "#".repeat(50))])
        .await;

    controller.submit_and_wait("").await.unwrap();

    let snapshot = controller.snapshot();
    let user = &snapshot.messages[1];
    assert_eq!(user.role, MessageRole::User);
    assert_eq!(user.content, "Uploaded 1 file(s) for analysis");
    assert_eq!(user.attachments.len(), 1);
    assert_eq!(user.attachments[0].name, "main.py");
    assert_eq!(user.attachments[0].size, 50);
    assert!(snapshot.pending_files.is_empty());

    let requests = controller.backend().requests.lock().clone();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].text.is_none());
    assert_eq!(requests[0].files.len(), 1);
}

#[tokio::test]
async fn test_successful_submission_replaces_placeholder() {
    let controller = controller(RecordingBackend::answering(0.823));

    let final_message = controller
        .submit_and_wait("  def foo(): pass  ")
        .await
        .unwrap();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.messages.len(), 3);
    assert_eq!(snapshot.messages[1].content, "def foo(): pass");
    assert!(!snapshot.has_placeholder());
    assert!(!snapshot.analyzing);

    let last = snapshot.last_message().unwrap();
    assert_eq!(last, &final_message);
    assert_eq!(last.role, MessageRole::Assistant);
    assert!(last.content.contains("82.3%"));
    assert!(last.content.contains("adaboost"));

    let analysis = last.analysis.as_ref().unwrap();
    assert_eq!(analysis.probability_machine_generated, Some(0.823));
    assert_eq!(analysis.prediction, Prediction::Machine);

    let with_analysis = snapshot.messages.iter().filter(|m| m.analysis.is_some()).count();
    assert_eq!(with_analysis, 1);
}

#[tokio::test]
async fn test_failed_submission_reports_error_and_releases_guard() {
    let controller = controller(RecordingBackend::failing(500));

    controller.submit_and_wait("class A {}").await.unwrap();

    let snapshot = controller.snapshot();
    assert!(!snapshot.analyzing);
    assert!(!snapshot.has_placeholder());
    let last = snapshot.last_message().unwrap();
    assert_eq!(last.content, "Error: Server error");
    assert!(last.analysis.is_none());

    // the guard is released, so the next submit is accepted
    assert!(controller.submit("class B {}").is_ok());
}

#[tokio::test]
async fn test_mock_backend_rejects_prose_without_error_prefix() {
    let controller = controller(MockBackend::default());
    controller.submit_and_wait("how are you?").await.unwrap();

    let last = controller.snapshot().last_message().cloned().unwrap();
    assert_eq!(last.content, NOT_CODE_REPLY);
    assert!(last.analysis.is_none());
}

// ============================================================================
// In-flight Guard
// ============================================================================

#[tokio::test]
async fn test_second_submit_while_analyzing_is_dropped() {
    let (backend, gate) = RecordingBackend::answering(0.7).gated();
    let controller = controller(backend);

    let submission = controller.submit("function a() {}").unwrap();
    let running = tokio::spawn(submission.run());

    let in_flight = controller.snapshot();
    assert!(in_flight.analyzing);
    assert!(in_flight.has_placeholder());
    assert_eq!(in_flight.last_message().unwrap().content, PLACEHOLDER_TEXT);

    assert_eq!(
        controller.submit("function b() {}").err(),
        Some(SubmitRejected::Busy)
    );
    assert_eq!(controller.snapshot().messages.len(), 3);

    gate.notify_one();
    timeout(Duration::from_secs(5), running)
        .await
        .expect("submission should resolve")
        .unwrap();

    assert_eq!(controller.backend().count(), 1);
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.messages.len(), 3);
    assert!(!snapshot.analyzing);
}

#[tokio::test]
async fn test_staging_clears_only_on_accepted_submit() {
    let (backend, gate) = RecordingBackend::answering(0.7).gated();
    let controller = controller(backend);

    let submission = controller.submit("const x = 1;").unwrap();
    controller
        .stage_files(vec![FileHandle::from_bytes("later.rs", "fn later() {}")])
        .await;

    assert_eq!(controller.submit("const y = 2;").err(), Some(SubmitRejected::Busy));
    assert_eq!(staged_names(&controller.snapshot()), vec!["later.rs"]);

    gate.notify_one();
    submission.run().await;
    assert_eq!(staged_names(&controller.snapshot()), vec!["later.rs"]);
}

// ============================================================================
// Change Notification
// ============================================================================

#[tokio::test]
async fn test_snapshots_follow_the_submission() {
    let (backend, gate) = RecordingBackend::answering(0.3).gated();
    let controller = controller(backend);
    let mut updates = controller.subscribe();

    let submission = controller.submit("def f(): return 1").unwrap();
    assert!(updates.has_changed().unwrap());
    {
        let seen = updates.borrow_and_update();
        assert!(seen.analyzing);
        assert!(seen.has_placeholder());
    }

    let running = tokio::spawn(submission.run());
    gate.notify_one();

    timeout(Duration::from_secs(5), updates.changed())
        .await
        .expect("resolution should publish")
        .unwrap();
    running.await.unwrap();

    let seen = updates.borrow().clone();
    assert!(!seen.analyzing);
    assert!(!seen.has_placeholder());
    let last = seen.last_message().unwrap();
    assert_eq!(last.analysis.as_ref().unwrap().prediction, Prediction::Human);
}
