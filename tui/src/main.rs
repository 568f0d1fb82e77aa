//! codetell Entry Point
//!
//! Launches the terminal chat, or runs one of the headless subcommands.
//!
//! Usage:
//!   codetell [OPTIONS] [chat]
//!   codetell [OPTIONS] analyze [FILES...] [--text TEXT]
//!   codetell [OPTIONS] account <COMMAND>
//!   codetell [OPTIONS] token <set|clear|show>

use std::io;
use std::panic;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use codetell_core::account::{AccountClient, FileTokenStore, TokenProvider};
use codetell_core::config::{load_config, load_config_from_path};
use codetell_core::{ChatController, CodetellConfig, HttpAnalysisBackend, MockBackend};
use codetell_tui::cli::{Cli, Command, GlobalArgs};
use codetell_tui::headless::{self, render_plain, stage_notices};
use codetell_tui::{App, DynBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or(Command::Chat);
    let chat_mode = matches!(command, Command::Chat);

    init_logging(cli.global.log_file.as_deref(), chat_mode)?;
    let config = load_configuration(&cli.global)?;

    match command {
        Command::Chat => {
            let controller = ChatController::new(
                build_backend(&cli.global, &config)?,
                config.controller_config(),
            );
            run_chat(controller, backend_label(&cli.global, &config)).await
        }
        Command::Analyze { files, text } => {
            let controller = ChatController::new(
                build_backend(&cli.global, &config)?,
                config.controller_config(),
            );
            let (snapshot, report) = headless::analyze(&controller, files, text).await?;
            for notice in stage_notices(&report) {
                eprintln!("{notice}");
            }
            print!("{}", render_plain(&snapshot));
            Ok(())
        }
        Command::Account(account) => {
            let client =
                AccountClient::new(config.account_url.clone(), config.timeout, token_store(&config)?)?;
            println!("{}", headless::account(&client, account).await?);
            Ok(())
        }
        Command::Token(token) => {
            let store = token_store(&config)?;
            println!("{}", headless::token(store.as_ref(), token).await?);
            Ok(())
        }
    }
}

/// Install the tracing subscriber
///
/// The chat owns the terminal, so it only logs when given a file.
fn init_logging(log_file: Option<&Path>, chat_mode: bool) -> anyhow::Result<()> {
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                .init();
        }
        None if chat_mode => {}
        None => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(io::stderr),
                )
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
                .init();
        }
    }
    Ok(())
}

/// Config file, then environment, then CLI flags
fn load_configuration(args: &GlobalArgs) -> anyhow::Result<CodetellConfig> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            load_config_from_path(Some(path.clone()))?
        }
        None => load_config()?,
    };
    args.overrides().apply(&mut config)?;
    tracing::debug!(source = %config.source(), model = %config.model, "Configuration loaded");
    Ok(config)
}

fn build_backend(args: &GlobalArgs, config: &CodetellConfig) -> anyhow::Result<DynBackend> {
    if args.mock {
        return Ok(Box::new(MockBackend::default()));
    }
    let backend = HttpAnalysisBackend::new(&config.analysis_url, &config.model, config.timeout)?
        .with_threshold(config.machine_threshold);
    Ok(Box::new(backend))
}

fn backend_label(args: &GlobalArgs, config: &CodetellConfig) -> String {
    if args.mock {
        "mock classifier".to_string()
    } else {
        format!("{} @ {}", config.model, config.analysis_url)
    }
}

fn token_store(config: &CodetellConfig) -> anyhow::Result<Arc<dyn TokenProvider>> {
    let path = config
        .token_path
        .clone()
        .context("no data directory for the session token; set CODETELL_TOKEN_PATH")?;
    Ok(Arc::new(FileTokenStore::new(path)))
}

async fn run_chat(controller: ChatController<DynBackend>, label: String) -> anyhow::Result<()> {
    use std::io::IsTerminal;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: the chat requires a terminal (TTY)");
        eprintln!("Use `codetell analyze FILES... --text TEXT` for non-interactive use.");
        std::process::exit(1);
    }

    // Shift+Enter is only distinguishable from Enter with the kitty protocol
    let enhanced_keys = matches!(supports_keyboard_enhancement(), Ok(true));

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        if enhanced_keys {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    if enhanced_keys {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(controller, label);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    if enhanced_keys {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}
