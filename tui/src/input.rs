//! Input Editing
//!
//! The multi-line compose buffer and the attach-path prompt.

use std::path::PathBuf;

/// Multi-line text being composed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
}

impl InputBuffer {
    /// Current text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether nothing has been typed
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Append a character
    pub fn insert(&mut self, c: char) {
        self.text.push(c);
    }

    /// Start a new line
    pub fn newline(&mut self) {
        self.text.push('\n');
    }

    /// Delete the last character
    pub fn backspace(&mut self) {
        self.text.pop();
    }

    /// Empty the buffer
    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Lines for display; a trailing newline yields an empty last line
    pub fn lines(&self) -> Vec<&str> {
        self.text.split('\n').collect()
    }
}

/// Paths typed into the attach prompt, separated by whitespace
pub fn parse_path_list(raw: &str) -> Vec<PathBuf> {
    raw.split_whitespace().map(PathBuf::from).collect()
}
