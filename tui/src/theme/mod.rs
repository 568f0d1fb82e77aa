//! Theme and Colors
//!
//! codetell's palette. Verdict colors are chosen so machine and human
//! verdicts stay distinguishable on both dark and light terminals.

use ratatui::style::{Color, Modifier, Style};

use codetell_core::{MessageRole, Prediction};

// ============================================================================
// Brand
// ============================================================================

/// Accent for the header and the assistant avatar
pub const ACCENT: Color = Color::Rgb(120, 160, 255);

/// User bubble text
pub const USER_TEXT: Color = Color::Rgb(170, 230, 170);

/// Assistant bubble text
pub const ASSISTANT_TEXT: Color = Color::Rgb(225, 225, 235);

// ============================================================================
// Verdicts
// ============================================================================

/// Machine-generated verdict
pub const VERDICT_MACHINE: Color = Color::Rgb(255, 120, 120);

/// Human-written verdict
pub const VERDICT_HUMAN: Color = Color::Rgb(120, 220, 150);

/// Empty cells of a fill bar
pub const BAR_EMPTY: Color = Color::Rgb(70, 70, 80);

// ============================================================================
// UI Chrome
// ============================================================================

/// Borders, separators and hints
pub const CHROME: Color = Color::DarkGray;

/// Attachment card text
pub const CARD_TEXT: Color = Color::Rgb(180, 180, 190);

/// Transient notices
pub const NOTICE: Color = Color::Yellow;

/// Style for a message body
pub fn message_style(role: MessageRole) -> Style {
    match role {
        MessageRole::User => Style::default().fg(USER_TEXT),
        MessageRole::Assistant => Style::default().fg(ASSISTANT_TEXT),
    }
}

/// Style for an avatar glyph
pub fn avatar_style(role: MessageRole) -> Style {
    match role {
        MessageRole::User => Style::default().fg(USER_TEXT).add_modifier(Modifier::BOLD),
        MessageRole::Assistant => Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    }
}

/// Color of a verdict label and its bar
pub fn verdict_color(prediction: Prediction) -> Color {
    match prediction {
        Prediction::Machine => VERDICT_MACHINE,
        Prediction::Human => VERDICT_HUMAN,
        Prediction::Unknown => CHROME,
    }
}

/// Style of the placeholder shown while analyzing
pub fn pending_style() -> Style {
    Style::default()
        .fg(CHROME)
        .add_modifier(Modifier::ITALIC)
}
