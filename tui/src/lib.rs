//! codetell TUI - Terminal surface for codetell
//!
//! A full-screen chat for asking whether code is human-written or
//! machine-generated, plus the headless subcommands of the `codetell`
//! binary.
//!
//! # Architecture
//!
//! - **App**: Event loop; forwards keys to the core `ChatController`
//! - **Display**: Pure snapshot-to-lines rendering
//! - **Headless**: One-shot analysis, account and token commands
//! - **Staging**: Ordered queue for attached path lists
//! - **Cli**: clap definitions shared by the binary and tests

pub mod app;
pub mod cli;
pub mod display;
pub mod headless;
pub mod input;
pub mod staging;
pub mod theme;

pub use app::{App, DynBackend};
