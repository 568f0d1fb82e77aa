//! Headless Commands
//!
//! The non-interactive subcommands: one-shot analysis, account calls and
//! token management. Each returns the text to print so it can be tested
//! without capturing stdout.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{bail, Context};

use codetell_core::account::{AccountClient, TokenProvider};
use codetell_core::presentation::{
    analysis_percent, attachment_header, fill_bar, prediction_line, preview,
};
use codetell_core::{
    AnalysisBackend, ChatController, FileHandle, MessageRole, SessionSnapshot, StageReport,
    SubmitRejected,
};

use crate::cli::{AccountCommand, TokenCommand};

/// Bar width in plain output
const PLAIN_BAR_WIDTH: usize = 20;

/// Stage `files`, submit them with `text`, and wait for the verdict
///
/// # Errors
///
/// Fails if a path cannot be opened or there is nothing to submit.
pub async fn analyze<B: AnalysisBackend + 'static>(
    controller: &ChatController<B>,
    files: Vec<PathBuf>,
    text: Option<String>,
) -> anyhow::Result<(SessionSnapshot, StageReport)> {
    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let handle = FileHandle::from_path(&path)
            .await
            .with_context(|| format!("cannot open {}", path.display()))?;
        handles.push(handle);
    }

    let report = controller.stage_files(handles).await;

    match controller.submit_and_wait(text.as_deref().unwrap_or_default()).await {
        Ok(_) => Ok((controller.snapshot(), report)),
        Err(SubmitRejected::Empty) => {
            bail!("nothing to analyze: pass source files or --text (unsupported files are skipped)")
        }
        Err(SubmitRejected::Busy) => bail!("an analysis is already running"),
    }
}

/// Notices for files that were not staged
pub fn stage_notices(report: &StageReport) -> Vec<String> {
    let mut notices: Vec<String> = report
        .unsupported
        .iter()
        .map(|name| format!("Skipped {name}: unsupported file type"))
        .collect();
    notices.extend(
        report
            .failed
            .iter()
            .map(|(name, reason)| format!("Skipped {name}: {reason}")),
    );
    notices
}

/// Plain-text transcript
pub fn render_plain(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    for message in &snapshot.messages {
        let who = match message.role {
            MessageRole::User => "you",
            MessageRole::Assistant => "codetell",
        };
        let _ = writeln!(out, "[{who}] {}", message.content);

        for file in &message.attachments {
            let _ = writeln!(out, "  + {}", attachment_header(file));
            for line in preview(&file.content).lines() {
                let _ = writeln!(out, "  | {line}");
            }
        }

        if let Some(analysis) = &message.analysis {
            let bar = analysis
                .machine_percent()
                .map_or_else(|| "-".repeat(PLAIN_BAR_WIDTH), |p| fill_bar(p, PLAIN_BAR_WIDTH));
            let _ = writeln!(
                out,
                "  {}  {}  {bar}",
                prediction_line(analysis),
                analysis_percent(analysis)
            );
        }
        out.push('\n');
    }
    out
}

/// Run an account subcommand and return what to print
///
/// # Errors
///
/// Propagates validation, server and network failures.
pub async fn account(client: &AccountClient, command: AccountCommand) -> anyhow::Result<String> {
    let output = match command {
        AccountCommand::ForgotPassword { email } => client.forgot_password(&email).await?,
        AccountCommand::ResetPassword {
            token,
            password,
            confirm,
        } => client.reset_password(&token, &password, &confirm).await?,
        AccountCommand::Me => {
            let info = client.me().await?;
            match info.subscription {
                None => "No active subscription".to_string(),
                Some(sub) => {
                    let mut out = format!("Plan: {}\nStatus: {}", sub.plan_type, sub.status);
                    match (sub.expires_on(), sub.end_date.as_deref()) {
                        (Some(date), _) => {
                            let _ = write!(out, "\nExpires: {date}");
                        }
                        (None, Some(raw)) => {
                            let _ = write!(out, "\nExpires: {raw}");
                        }
                        (None, None) => {}
                    }
                    out
                }
            }
        }
        AccountCommand::Plans => {
            let plans = client.plans().await?;
            if plans.is_empty() {
                "No plans available".to_string()
            } else {
                let mut out = String::new();
                for plan in plans {
                    let _ = writeln!(out, "{} ({}) - ${:.2}", plan.name, plan.id, plan.price);
                    for feature in plan.features {
                        let _ = writeln!(out, "  * {feature}");
                    }
                }
                out.trim_end().to_string()
            }
        }
        AccountCommand::Subscribe { plan } => client.subscribe(&plan).await?,
        AccountCommand::Cancel => client.cancel().await?,
    };
    Ok(output)
}

/// Run a token subcommand and return what to print
///
/// # Errors
///
/// Fails if the token store cannot be read or written.
pub async fn token(store: &dyn TokenProvider, command: TokenCommand) -> anyhow::Result<String> {
    let output = match command {
        TokenCommand::Set { token } => {
            let token = token.trim();
            if token.is_empty() {
                bail!("token must not be empty");
            }
            store.store(token).await?;
            "Session token saved".to_string()
        }
        TokenCommand::Clear => {
            store.clear().await?;
            "Session token cleared".to_string()
        }
        TokenCommand::Show => match store.token().await? {
            Some(token) => format!("Signed in (token {})", mask(&token)),
            None => "Not signed in".to_string(),
        },
    };
    Ok(output)
}

/// First four characters, the rest hidden
fn mask(token: &str) -> String {
    let shown: String = token.chars().take(4).collect();
    format!("{shown}****")
}
