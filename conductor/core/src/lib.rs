//! codetell Core - Headless Chat Controller for Code Provenance Analysis
//!
//! This crate holds everything codetell does apart from drawing: the chat
//! session, file intake, the classifier backends and the account clients.
//! It is independent of any UI framework and can drive the terminal UI, a
//! one-shot CLI, or run headless in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          Surfaces                              │
//! │   ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐  │
//! │   │  Chat TUI    │   │  analyze CLI │   │  Tests/Headless  │  │
//! │   │  (ratatui)   │   │              │   │                  │  │
//! │   └──────┬───────┘   └──────┬───────┘   └────────┬─────────┘  │
//! │          └──────────────────┼────────────────────┘            │
//! │              operations ▼   │   ▲ SessionSnapshot (watch)      │
//! └─────────────────────────────┼─────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────┼─────────────────────────────────┐
//! │                       CODETELL CORE                            │
//! │   ┌─────────────────────────┴──────────────────────────────┐  │
//! │   │                   ChatController                        │  │
//! │   │  ┌──────────┐  ┌──────────┐  ┌────────────────────────┐ │  │
//! │   │  │ Session  │  │  Intake  │  │ AnalysisBackend        │ │  │
//! │   │  │          │  │ (reader) │  │ (HTTP / Mock)          │ │  │
//! │   │  └──────────┘  └──────────┘  └────────────────────────┘ │  │
//! │   └─────────────────────────────────────────────────────────┘  │
//! │   ┌──────────────────┐   ┌──────────────────────────────────┐  │
//! │   │  AccountClient   │   │  Config (TOML + env + CLI)       │  │
//! │   └──────────────────┘   └──────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ChatController`]: Owns the session and runs submissions
//! - [`Submission`]: An accepted submission awaiting its network call
//! - [`SessionSnapshot`]: Immutable session view published to surfaces
//! - [`AnalysisBackend`]: Classifier abstraction
//! - [`AccountClient`]: Auth and subscription endpoints
//!
//! # Quick Start
//!
//! ```ignore
//! use codetell_core::{ChatController, ControllerConfig, MockBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let controller = ChatController::new(MockBackend::default(), ControllerConfig::default());
//!     let mut updates = controller.subscribe();
//!
//!     let submission = controller.submit("def foo(): pass").unwrap();
//!     tokio::spawn(submission.run());
//!
//!     while updates.changed().await.is_ok() {
//!         let snapshot = updates.borrow().clone();
//!         // Render snapshot.messages
//!         if !snapshot.analyzing {
//!             break;
//!         }
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`account`]: Auth and subscription REST clients, token storage
//! - [`backend`]: Classifier backends (HTTP, Mock)
//! - [`config`]: TOML/env/CLI configuration
//! - [`controller`]: The chat session controller
//! - [`intake`]: Extension filtering and file decoding
//! - [`messages`]: Transcript data model
//! - [`presentation`]: Surface-agnostic formatting helpers
//! - [`session`]: Session state and snapshots
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod account;
pub mod backend;
pub mod config;
pub mod controller;
pub mod intake;
pub mod messages;
pub mod presentation;
pub mod session;

// Re-exports for convenience
pub use account::{AccountClient, AccountError, FileTokenStore, MemoryTokenStore, TokenProvider};
pub use backend::{
    AnalysisBackend, AnalysisError, AnalysisRequest, HttpAnalysisBackend, MockBackend, MockMode,
};
pub use config::{load_config, CodetellConfig, ConfigError, ConfigOverrides, ConfigSource};
pub use controller::{ChatController, ControllerConfig, SubmitRejected, Submission};
pub use intake::{
    ExtensionAllowList, FileHandle, FileReader, FsFileReader, IntakeError, StageReport,
};
pub use messages::{
    AnalysisResult, AttachedFile, Message, MessageId, MessageRole, Prediction, SessionId,
};
pub use session::{Session, SessionSnapshot};
