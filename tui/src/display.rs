//! Transcript Rendering
//!
//! Turns a [`SessionSnapshot`] into styled ratatui lines. Pure functions of
//! the snapshot and the available width, so they are tested without a
//! terminal.
//!
//! # Layout
//!
//! ```text
//! 🤖 Hello! I'm the SemEval 2026 Task 13 code
//!    detection assistant...
//!
//!                                 def foo(): pass U
//!                             ┌ main.py (0.1 KB)
//!                             │ print('hi')
//!
//! 🤖 Model adaboost estimates...
//!    Prediction: Machine-Generated  82.3%
//!    ████████████████░░░░
//! ```

use ratatui::layout::Alignment;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use codetell_core::presentation::{
    analysis_percent, attachment_header, avatar, fill_cells, preview, prediction_line,
    AvatarSide,
};
use codetell_core::{AnalysisResult, AttachedFile, Message, SessionSnapshot};

use crate::theme;

/// Narrowest bubble we wrap to
const MIN_BUBBLE_WIDTH: usize = 20;

/// Cells of the verdict fill bar at most
const MAX_BAR_WIDTH: usize = 30;

/// Styled lines for the whole transcript, a blank line between messages
pub fn transcript_lines(snapshot: &SessionSnapshot, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in &snapshot.messages {
        lines.extend(message_lines(message, width));
        lines.push(Line::default());
    }
    lines
}

/// Width available for message text at a given terminal width
fn bubble_width(width: u16) -> usize {
    let width = usize::from(width);
    (width * 3 / 4).max(MIN_BUBBLE_WIDTH).min(width.max(1))
}

/// Styled lines for one message
pub fn message_lines(message: &Message, width: u16) -> Vec<Line<'static>> {
    let side = AvatarSide::for_role(message.role);
    let glyph = avatar(message.role);
    let glyph_cols = glyph.width() + 1;
    let text_width = bubble_width(width).saturating_sub(glyph_cols).max(1);

    let body_style = if message.pending {
        theme::pending_style()
    } else {
        theme::message_style(message.role)
    };
    let avatar_style = theme::avatar_style(message.role);

    let mut body: Vec<String> = Vec::new();
    for paragraph in message.content.split('\n') {
        if paragraph.is_empty() {
            body.push(String::new());
        } else {
            body.extend(
                textwrap::wrap(paragraph, text_width)
                    .into_iter()
                    .map(|l| l.into_owned()),
            );
        }
    }
    if body.is_empty() {
        body.push(String::new());
    }

    let indent = " ".repeat(glyph_cols);
    let mut lines: Vec<Line<'static>> = body
        .into_iter()
        .enumerate()
        .map(|(i, text)| match side {
            AvatarSide::Left => {
                let lead = if i == 0 {
                    Span::styled(format!("{glyph} "), avatar_style)
                } else {
                    Span::raw(indent.clone())
                };
                Line::from(vec![lead, Span::styled(text, body_style)])
            }
            AvatarSide::Right => {
                let tail = if i == 0 {
                    Span::styled(format!(" {glyph}"), avatar_style)
                } else {
                    Span::raw(indent.clone())
                };
                Line::from(vec![Span::styled(text, body_style), tail]).alignment(Alignment::Right)
            }
        })
        .collect();

    for file in &message.attachments {
        lines.extend(attachment_lines(file, side, text_width, &indent));
    }

    if let Some(analysis) = &message.analysis {
        lines.extend(analysis_lines(analysis, text_width, &indent));
    }

    lines
}

/// Card for one attachment: header, then the wrapped preview
fn attachment_lines(
    file: &AttachedFile,
    side: AvatarSide,
    text_width: usize,
    indent: &str,
) -> Vec<Line<'static>> {
    let card = Style::default().fg(theme::CARD_TEXT);
    let edge = Style::default().fg(theme::CHROME);
    let inner_width = text_width.saturating_sub(2).max(1);

    let mut rows = vec![(
        "┌ ".to_string(),
        attachment_header(file),
        card.add_modifier(Modifier::BOLD),
    )];
    for raw in preview(&file.content).lines() {
        for wrapped in textwrap::wrap(raw, inner_width) {
            rows.push(("│ ".to_string(), wrapped.into_owned(), card));
        }
    }

    rows.into_iter()
        .map(|(border, text, style)| {
            let spans = vec![Span::styled(border, edge), Span::styled(text, style)];
            match side {
                AvatarSide::Left => {
                    let mut line = vec![Span::raw(indent.to_string())];
                    line.extend(spans);
                    Line::from(line)
                }
                AvatarSide::Right => {
                    let mut line = spans;
                    line.push(Span::raw(indent.to_string()));
                    Line::from(line).alignment(Alignment::Right)
                }
            }
        })
        .collect()
}

/// Verdict label, percentage and proportional bar
fn analysis_lines(analysis: &AnalysisResult, text_width: usize, indent: &str) -> Vec<Line<'static>> {
    let color = theme::verdict_color(analysis.prediction);
    let bar_width = text_width.min(MAX_BAR_WIDTH);
    let filled = analysis
        .machine_percent()
        .map_or(0, |p| fill_cells(p, bar_width));

    vec![
        Line::from(vec![
            Span::raw(indent.to_string()),
            Span::styled(
                prediction_line(analysis),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(analysis_percent(analysis), Style::default().fg(color)),
        ]),
        Line::from(vec![
            Span::raw(indent.to_string()),
            Span::styled("█".repeat(filled), Style::default().fg(color)),
            Span::styled(
                "░".repeat(bar_width - filled),
                Style::default().fg(theme::BAR_EMPTY),
            ),
        ]),
    ]
}

/// One-line summary of the staged files, numbered for Alt+N removal
pub fn staged_chips(files: &[AttachedFile]) -> Line<'static> {
    let chip = Style::default().fg(theme::CARD_TEXT);
    let key = Style::default().fg(theme::ACCENT);

    let mut spans = vec![Span::styled("Staged: ", Style::default().fg(theme::CHROME))];
    for (i, file) in files.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(format!("[{}] ", i + 1), key));
        spans.push(Span::styled(attachment_header(file), chip));
    }
    Line::from(spans)
}

/// Plain text of a line, for tests and headless output
pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}
