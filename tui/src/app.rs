//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, mouse, resize)
//! - ChatController operations for every user action
//! - SessionSnapshot updates from the controller's watch channel
//!
//! The App never mutates chat state itself. Submissions run on spawned
//! tasks; the watch channel wakes the loop when they resolve.

use std::io;

use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};
use tokio::sync::{mpsc, watch};

use codetell_core::{AnalysisBackend, ChatController, SessionSnapshot, SubmitRejected};

use crate::display::{staged_chips, transcript_lines};
use crate::input::{parse_path_list, InputBuffer};
use crate::staging::StagingQueue;
use crate::theme;

/// Input box height (lines, including the top border)
const INPUT_HEIGHT: u16 = 5;

/// Shown in an empty compose box
const INPUT_HINT: &str = " Paste code, or Ctrl+O to attach files";

/// Lines scrolled per mouse wheel step
const WHEEL_STEP: usize = 3;

/// Backend type the App drives; chosen at startup
pub type DynBackend = Box<dyn AnalysisBackend>;

/// What the input area is editing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InputMode {
    /// Composing a chat message
    Compose,
    /// Typing paths to attach
    AttachPrompt,
}

/// Main application state
pub struct App {
    // === Core State ===
    /// Is the app still running?
    running: bool,
    /// Header label, e.g. the model in use
    label: String,

    // === Controller Integration ===
    controller: ChatController<DynBackend>,
    updates: watch::Receiver<SessionSnapshot>,
    snapshot: SessionSnapshot,
    staging: StagingQueue,
    notices_rx: mpsc::UnboundedReceiver<String>,

    // === Input State ===
    mode: InputMode,
    input: InputBuffer,
    prompt: String,
    /// Latest transient notice (staging results)
    notice: Option<String>,

    // === Scrolling ===
    /// Scroll offset (lines from bottom, 0 = latest)
    scroll_offset: usize,
    /// Total rendered lines (for scroll bounds)
    total_lines: usize,
    /// Terminal size
    size: (u16, u16),
}

impl App {
    /// Create a new App around a controller
    ///
    /// Must be called from within a tokio runtime; it starts the staging task.
    pub fn new(controller: ChatController<DynBackend>, label: impl Into<String>) -> Self {
        let updates = controller.subscribe();
        let snapshot = updates.borrow().clone();
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        let staging = StagingQueue::spawn(controller.clone(), notices_tx);
        let size = crossterm::terminal::size().unwrap_or((80, 24));

        Self {
            running: true,
            label: label.into(),
            controller,
            updates,
            snapshot,
            staging,
            notices_rx,
            mode: InputMode::Compose,
            input: InputBuffer::default(),
            prompt: String::new(),
            notice: None,
            scroll_offset: 0,
            total_lines: 0,
            size,
        }
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();

        self.render(terminal)?;

        while self.running {
            tokio::select! {
                biased;

                // Terminal events - highest priority
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key);
                        }
                        Some(Ok(Event::Mouse(mouse))) => match mouse.kind {
                            MouseEventKind::ScrollUp => self.scroll_up(WHEEL_STEP),
                            MouseEventKind::ScrollDown => self.scroll_down(WHEEL_STEP),
                            _ => {}
                        },
                        Some(Ok(Event::Resize(w, h))) => self.size = (w, h),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => tracing::warn!(error = %e, "Terminal event error"),
                        None => self.running = false,
                    }
                }

                // Session changed
                changed = self.updates.changed() => {
                    if changed.is_err() {
                        self.running = false;
                    } else {
                        self.snapshot = self.updates.borrow_and_update().clone();
                    }
                }

                // Staging results
                Some(notice) = self.notices_rx.recv() => {
                    self.notice = Some(notice);
                }
            }

            self.render(terminal)?;
        }

        Ok(())
    }

    /// Handle keyboard input
    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.running = false;
            return;
        }

        match self.mode {
            InputMode::Compose => self.handle_compose_key(key),
            InputMode::AttachPrompt => self.handle_prompt_key(key),
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        match key.code {
            KeyCode::Esc => self.running = false,

            // Newline vs. submit
            KeyCode::Enter if shift || alt => self.input.newline(),
            KeyCode::Enter => self.submit(),

            // Attach files
            KeyCode::Char('o') if ctrl => {
                self.mode = InputMode::AttachPrompt;
                self.prompt.clear();
            }

            // New chat
            KeyCode::Char('n') if ctrl => {
                self.controller.new_session();
                self.input.clear();
                self.notice = None;
                self.scroll_offset = 0;
            }

            // Remove staged file N
            KeyCode::Char(c @ '1'..='9') if alt => {
                let index = c as usize - '1' as usize;
                if let Some(file) = self.controller.remove_staged_file(index) {
                    self.notice = Some(format!("Removed {}", file.name));
                }
            }

            KeyCode::Char(c) if !ctrl && !alt => self.input.insert(c),
            KeyCode::Backspace => self.input.backspace(),

            KeyCode::PageUp => self.scroll_up(self.page_size()),
            KeyCode::PageDown => self.scroll_down(self.page_size()),

            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.mode = InputMode::Compose,
            KeyCode::Enter => {
                let paths = parse_path_list(&self.prompt);
                self.mode = InputMode::Compose;
                self.prompt.clear();
                if !paths.is_empty() {
                    self.staging.enqueue(paths);
                }
            }
            KeyCode::Char(c) => self.prompt.push(c),
            KeyCode::Backspace => {
                self.prompt.pop();
            }
            _ => {}
        }
    }

    /// Submit the composed text; the input clears only if accepted
    fn submit(&mut self) {
        match self.controller.submit(self.input.as_str()) {
            Ok(submission) => {
                self.input.clear();
                self.notice = None;
                self.scroll_offset = 0;
                tokio::spawn(submission.run());
            }
            Err(SubmitRejected::Empty) => {}
            Err(SubmitRejected::Busy) => {
                self.notice = Some("Still analyzing the previous submission".to_string());
            }
        }
    }

    fn page_size(&self) -> usize {
        usize::from(self.size.1.saturating_sub(INPUT_HEIGHT + 3) / 2).max(1)
    }

    fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.total_lines.saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + lines).min(max_scroll);
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    fn render(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
        terminal.draw(|frame| self.draw(frame))?;
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let staged_height = u16::from(!self.snapshot.pending_files.is_empty());
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(staged_height),
                Constraint::Length(INPUT_HEIGHT),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_transcript(frame, chunks[1]);
        if staged_height > 0 {
            frame.render_widget(Paragraph::new(staged_chips(&self.snapshot.pending_files)), chunks[2]);
        }
        self.draw_input(frame, chunks[3]);
        self.draw_status(frame, chunks[4]);
    }

    fn draw_header(&self, frame: &mut Frame<'_>, area: Rect) {
        let header = Line::from(vec![
            Span::styled(
                " codetell ",
                Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("· {}", self.label), Style::default().fg(theme::CHROME)),
        ]);
        frame.render_widget(Paragraph::new(header), area);
    }

    fn draw_transcript(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let lines = transcript_lines(&self.snapshot, area.width.saturating_sub(1));
        self.total_lines = lines.len();

        let height = usize::from(area.height);
        let max_scroll = self.total_lines.saturating_sub(height);
        self.scroll_offset = self.scroll_offset.min(max_scroll);

        let visible_end = self.total_lines.saturating_sub(self.scroll_offset);
        let visible_start = visible_end.saturating_sub(height);
        let visible: Vec<Line<'static>> = lines[visible_start..visible_end].to_vec();

        frame.render_widget(Paragraph::new(visible), area);
    }

    fn draw_input(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(theme::CHROME));
        let inner_height = usize::from(area.height.saturating_sub(1));
        let width = usize::from(area.width).max(5);

        let (prefix, rows, style) = match self.mode {
            InputMode::Compose => (
                "> ",
                self.input.lines(),
                Style::default().fg(theme::USER_TEXT),
            ),
            InputMode::AttachPrompt => (
                "Attach (space-separated paths): ",
                vec![self.prompt.as_str()],
                Style::default().fg(theme::NOTICE),
            ),
        };

        if self.mode == InputMode::Compose && self.input.is_empty() {
            let hint = Line::from(vec![
                Span::styled("> _", style),
                Span::styled(INPUT_HINT, Style::default().fg(theme::CHROME)),
            ]);
            frame.render_widget(Paragraph::new(hint).block(block), area);
            return;
        }

        let mut wrapped: Vec<String> = Vec::new();
        for (i, raw) in rows.into_iter().enumerate() {
            let lead = if i == 0 { prefix } else { "  " };
            let full = format!("{lead}{raw}");
            let pieces = textwrap::wrap(&full, width);
            if pieces.is_empty() {
                wrapped.push(full);
            } else {
                wrapped.extend(pieces.into_iter().map(|p| p.into_owned()));
            }
        }
        if let Some(last) = wrapped.last_mut() {
            last.push('_');
        }

        let skip = wrapped.len().saturating_sub(inner_height);
        let lines: Vec<Line<'_>> = wrapped
            .into_iter()
            .skip(skip)
            .map(|l| Line::styled(l, style))
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let (state, state_style) = if self.snapshot.analyzing {
            ("Analyzing...", Style::default().fg(theme::ACCENT))
        } else {
            ("Ready", Style::default().fg(theme::CHROME))
        };

        let mut spans = vec![
            Span::styled(format!(" {state}"), state_style),
            Span::styled(
                " | Enter send | Shift/Alt+Enter newline | Ctrl+O attach | Alt+N unstage | Ctrl+N new chat | Esc quit",
                Style::default().fg(theme::CHROME),
            ),
        ];
        if self.scroll_offset > 0 {
            spans.push(Span::styled(
                format!(" [^{} lines]", self.scroll_offset),
                Style::default().fg(theme::CHROME),
            ));
        }
        if let Some(notice) = &self.notice {
            spans.push(Span::styled(format!(" | {notice}"), Style::default().fg(theme::NOTICE)));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
