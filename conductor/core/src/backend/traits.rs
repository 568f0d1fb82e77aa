//! Analysis Backend Traits
//!
//! Trait definitions for classifier backends. This abstraction lets the
//! controller submit code to the remote prediction service, a mock, or a
//! test double without changing core logic.
//!
//! # Design Philosophy
//!
//! The `AnalysisBackend` trait provides a common interface for:
//! - Submitting pasted text and staged files for classification
//! - Health checking the backend
//!
//! Implementations handle transport details (multipart encoding, status
//! mapping, response parsing).

use async_trait::async_trait;
use thiserror::Error;

use crate::messages::{AnalysisResult, AttachedFile};

/// Multipart field name every upload part uses
pub const UPLOAD_FIELD: &str = "file";

/// Filename given to pasted text
pub const PASTED_TEXT_FILENAME: &str = "input.txt";

/// Errors that can occur while analyzing a submission
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Network failure reaching the classifier
    #[error("{0}")]
    Transport(String),

    /// The classifier answered with a non-2xx status
    #[error("Server error")]
    Server {
        /// HTTP status code
        status: u16,
    },

    /// The classifier answered 2xx with a body we could not read
    #[error("Invalid response from classifier: {0}")]
    InvalidResponse(String),

    /// The backend declined the input (not a transport fault)
    #[error("{0}")]
    Rejected(String),
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// One part of the multipart upload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadPart {
    /// Filename reported for the part
    pub filename: String,
    /// Text content
    pub content: String,
}

/// A submission to classify
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Trimmed pasted text, if any
    pub text: Option<String>,
    /// Staged files in selection order
    pub files: Vec<AttachedFile>,
}

impl AnalysisRequest {
    /// Create a request; blank text is treated as absent
    pub fn new(text: &str, files: Vec<AttachedFile>) -> Self {
        let trimmed = text.trim();
        Self {
            text: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            files,
        }
    }

    /// Whether there is nothing to submit
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.files.is_empty()
    }

    /// Upload parts in wire order: pasted text first, then each file
    pub fn parts(&self) -> Vec<UploadPart> {
        let text = self.text.iter().map(|t| UploadPart {
            filename: PASTED_TEXT_FILENAME.to_string(),
            content: t.clone(),
        });
        let files = self.files.iter().map(|f| UploadPart {
            filename: f.name.clone(),
            content: f.content.clone(),
        });
        text.chain(files).collect()
    }

    /// All submitted text concatenated, pasted text first
    pub fn combined_text(&self) -> String {
        self.parts()
            .into_iter()
            .map(|p| p.content)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Classifier backend trait
///
/// Implement this trait to add a new way of classifying submissions.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Get the backend name (e.g., "HTTP", "Mock")
    fn name(&self) -> &str;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Classify a submission
    async fn submit_for_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, AnalysisError>;
}

#[async_trait]
impl<B: AnalysisBackend + ?Sized> AnalysisBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn health_check(&self) -> bool {
        (**self).health_check().await
    }

    async fn submit_for_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, AnalysisError> {
        (**self).submit_for_analysis(request).await
    }
}
