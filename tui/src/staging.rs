//! Attach Queue
//!
//! Path lists typed into the attach prompt are staged by one long-lived
//! task, one list at a time, so staged files keep the order the user
//! picked them in even when an earlier list is slower to read.

use std::path::PathBuf;

use tokio::sync::mpsc;

use codetell_core::{AnalysisBackend, ChatController, FileHandle};

use crate::headless::stage_notices;

/// Sender side of the staging task
#[derive(Clone)]
pub struct StagingQueue {
    tx: mpsc::UnboundedSender<Vec<PathBuf>>,
}

impl StagingQueue {
    /// Start the staging task; notices for skipped files go to `notices`
    ///
    /// Must be called from within a tokio runtime. The task ends once every
    /// queue handle is dropped.
    pub fn spawn<B: AnalysisBackend + 'static>(
        controller: ChatController<B>,
        notices: mpsc::UnboundedSender<String>,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();

        tokio::spawn(async move {
            while let Some(paths) = rx.recv().await {
                let messages = stage_batch(&controller, paths).await;
                if !messages.is_empty() && notices.send(messages.join("; ")).is_err() {
                    tracing::debug!("Notice receiver gone");
                }
            }
            tracing::debug!("Staging queue closed");
        });

        Self { tx }
    }

    /// Queue a path list behind any earlier ones
    pub fn enqueue(&self, paths: Vec<PathBuf>) {
        if self.tx.send(paths).is_err() {
            tracing::warn!("Staging task is gone; dropping selection");
        }
    }
}

/// Open and stage one selection, returning notices to show
async fn stage_batch<B: AnalysisBackend + 'static>(
    controller: &ChatController<B>,
    paths: Vec<PathBuf>,
) -> Vec<String> {
    let mut handles = Vec::with_capacity(paths.len());
    let mut messages = Vec::new();
    for path in paths {
        match FileHandle::from_path(&path).await {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot open file");
                messages.push(format!("Cannot open {}", path.display()));
            }
        }
    }

    let report = controller.stage_files(handles).await;
    messages.extend(stage_notices(&report));
    messages
}
