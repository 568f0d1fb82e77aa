//! Command-line Interface
//!
//! ```text
//! codetell [chat]                         full-screen chat (default)
//! codetell analyze [FILES...] [--text T]  one submission, printed
//! codetell account <command>              auth and subscriptions
//! codetell token set|clear|show           stored session token
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use codetell_core::ConfigOverrides;

/// Human-vs-machine code classification chat
#[derive(Debug, Parser)]
#[command(name = "codetell", version, about)]
pub struct Cli {
    /// Shared options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// What to run (defaults to the chat)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Options accepted by every subcommand
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Config file (default: ~/.config/codetell/config.toml)
    #[arg(long, global = true, env = "CODETELL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Prediction service base URL
    #[arg(long, global = true)]
    pub analysis_url: Option<String>,

    /// Classifier model name
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Account service base URL
    #[arg(long, global = true)]
    pub account_url: Option<String>,

    /// Use the offline mock classifier
    #[arg(long, global = true)]
    pub mock: bool,

    /// Write logs to this file (chat mode logs nowhere otherwise)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

impl GlobalArgs {
    /// Config overrides from the flags that were given
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            analysis_url: self.analysis_url.clone(),
            model: self.model.clone(),
            account_url: self.account_url.clone(),
        }
    }
}

/// Subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Full-screen chat
    Chat,

    /// Submit files and/or text once and print the transcript
    Analyze {
        /// Source files to upload
        files: Vec<PathBuf>,

        /// Code to paste
        #[arg(long)]
        text: Option<String>,
    },

    /// Account and subscription management
    #[command(subcommand)]
    Account(AccountCommand),

    /// Stored session token
    #[command(subcommand)]
    Token(TokenCommand),
}

/// Account subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum AccountCommand {
    /// Email a password reset link
    ForgotPassword {
        /// Account email
        email: String,
    },

    /// Set a new password with an emailed reset token
    ResetPassword {
        /// Token from the reset email
        #[arg(long)]
        token: String,
        /// New password
        #[arg(long)]
        password: String,
        /// New password again
        #[arg(long)]
        confirm: String,
    },

    /// Show the current subscription
    Me,

    /// List available plans
    Plans,

    /// Subscribe to a plan
    Subscribe {
        /// Plan id, as listed by `plans`
        plan: String,
    },

    /// Cancel the current subscription
    Cancel,
}

/// Token subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum TokenCommand {
    /// Store a session token
    Set {
        /// Token value
        token: String,
    },
    /// Forget the stored token
    Clear,
    /// Show whether a token is stored
    Show,
}
