//! Presentation Helpers
//!
//! Surface-agnostic formatting for transcript rendering: which side an
//! avatar sits on, how attachments are previewed, how verdicts are
//! labelled and how wide their fill bar is. Surfaces decide colors and
//! layout; the text they show comes from here.

use std::borrow::Cow;

use crate::messages::{AnalysisResult, AttachedFile, MessageRole};

/// Characters of an attachment shown in its preview
pub const PREVIEW_CHARS: usize = 300;

/// Suffix appended to a truncated preview
pub const ELLIPSIS: &str = "...";

/// Shown in place of a percentage the classifier did not report
pub const UNKNOWN_PERCENT: &str = "unknown";

/// Which side of the transcript a message's avatar sits on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AvatarSide {
    /// Avatar before the content (assistant)
    Left,
    /// Avatar after the content (user)
    Right,
}

impl AvatarSide {
    /// Placement for a role
    #[must_use]
    pub fn for_role(role: MessageRole) -> Self {
        match role {
            MessageRole::Assistant => Self::Left,
            MessageRole::User => Self::Right,
        }
    }
}

/// Avatar glyph for a role
#[must_use]
pub fn avatar(role: MessageRole) -> &'static str {
    match role {
        MessageRole::Assistant => "🤖",
        MessageRole::User => "U",
    }
}

/// The first [`PREVIEW_CHARS`] characters of `content`, with an ellipsis
/// when anything was cut
#[must_use]
pub fn preview(content: &str) -> Cow<'_, str> {
    match content.char_indices().nth(PREVIEW_CHARS) {
        None => Cow::Borrowed(content),
        Some((cut, _)) => Cow::Owned(format!("{}{ELLIPSIS}", &content[..cut])),
    }
}

/// File size in kilobytes to one decimal place
#[must_use]
pub fn format_size_kb(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

/// A percentage to one decimal place
#[must_use]
pub fn format_percent(percent: f64) -> String {
    format!("{percent:.1}%")
}

/// A probability in [0, 1] as a percentage, or "unknown"
#[must_use]
pub fn format_probability(probability: Option<f64>) -> String {
    probability.map_or_else(|| UNKNOWN_PERCENT.to_string(), |p| format_percent(p * 100.0))
}

/// Card header for an attachment: name and size
#[must_use]
pub fn attachment_header(file: &AttachedFile) -> String {
    format!("{} ({})", file.name, format_size_kb(file.size))
}

/// Number of filled cells in a bar of `width` cells for `percent`
#[must_use]
pub fn fill_cells(percent: f64, width: usize) -> usize {
    let ratio = (percent / 100.0).clamp(0.0, 1.0);
    ((ratio * width as f64).round() as usize).min(width)
}

/// Text bar of `width` cells, filled in proportion to `percent`
#[must_use]
pub fn fill_bar(percent: f64, width: usize) -> String {
    let filled = fill_cells(percent, width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// "Prediction: Machine-Generated" style label for a verdict
#[must_use]
pub fn prediction_line(analysis: &AnalysisResult) -> String {
    format!("Prediction: {}", analysis.prediction.label())
}

/// Percentage shown next to a verdict: the machine probability
#[must_use]
pub fn analysis_percent(analysis: &AnalysisResult) -> String {
    format_probability(analysis.probability_machine_generated)
}
