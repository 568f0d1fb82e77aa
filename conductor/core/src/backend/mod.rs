//! Analysis Backend Integration
//!
//! This module provides abstracted access to code classifiers through a
//! common trait interface.
//!
//! # Available Backends
//!
//! - **HTTP**: the remote prediction service (default)
//! - **Mock**: offline classifier for demos and tests
//!
//! # Usage
//!
//! ```ignore
//! use codetell_core::backend::{AnalysisBackend, AnalysisRequest, HttpAnalysisBackend};
//!
//! let backend = HttpAnalysisBackend::new("http://localhost:5050", "adaboost", timeout)?;
//! let request = AnalysisRequest::new("def foo(): pass", Vec::new());
//! let result = backend.submit_for_analysis(&request).await?;
//! ```

mod http;
mod mock;
mod traits;

pub use http::{HttpAnalysisBackend, DEFAULT_MACHINE_THRESHOLD, DEFAULT_MODEL};
pub use mock::{MockBackend, MockMode, MOCK_MODEL, NOT_CODE_REPLY};
pub use traits::{
    AnalysisBackend, AnalysisError, AnalysisRequest, UploadPart, PASTED_TEXT_FILENAME,
    UPLOAD_FIELD,
};
