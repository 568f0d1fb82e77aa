//! Architectural Enforcement Integration Tests
//!
//! Source scans that keep the workspace honest:
//! - No sleep() calls in production code
//! - No blocking I/O inside async functions
//! - The core crate stays free of terminal dependencies
//!
//! The scans are line based. They look backwards from a match for the
//! enclosing `fn` header, which is good enough for rustfmt-formatted code.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source directories, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["conductor/core/src", "tui/src"];

/// Workspace root, two levels above this crate
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// A source file split into lines
pub struct SourceFile {
    /// Path relative to the workspace root
    pub path: PathBuf,
    /// File contents, one entry per line
    pub lines: Vec<String>,
}

impl SourceFile {
    /// Lines as borrowed slices, the shape the context helpers take
    pub fn line_refs(&self) -> Vec<&str> {
        self.lines.iter().map(String::as_str).collect()
    }
}

/// Every `.rs` file under `dir` (relative to the workspace root)
pub fn rust_sources(dir: &str) -> Vec<SourceFile> {
    let root = workspace_root();
    let base = root.join(dir);
    if !base.exists() {
        return Vec::new();
    }

    walkdir::WalkDir::new(&base)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .filter_map(|e| {
            let content = fs::read_to_string(e.path()).ok()?;
            let path = e
                .path()
                .strip_prefix(&root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| e.path().to_path_buf());
            Some(SourceFile {
                path,
                lines: content.lines().map(str::to_string).collect(),
            })
        })
        .collect()
}

/// The part of a line before any `//` comment
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Whether a trimmed line opens a function, with any visibility or qualifiers
pub fn is_fn_header(line: &str) -> bool {
    let mut rest = line.trim_start();
    for prefix in ["pub(crate) ", "pub(super) ", "pub ", "const ", "async ", "unsafe "] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
        }
    }
    rest.starts_with("fn ")
}

/// Whether a trimmed line is an `async fn` header
pub fn is_async_fn_header(line: &str) -> bool {
    is_fn_header(line) && line.contains("async fn ")
}

/// Index of the nearest enclosing function header, if any
fn enclosing_fn(lines: &[&str], current_idx: usize) -> Option<usize> {
    (0..current_idx)
        .rev()
        .find(|&i| is_fn_header(lines[i].trim()))
}

/// Check if line is inside a test function or a `#[cfg(test)]` module
pub fn is_in_test_code(lines: &[&str], current_idx: usize) -> bool {
    if lines[..current_idx]
        .iter()
        .any(|l| l.trim().starts_with("#[cfg(test)]"))
    {
        return true;
    }

    let Some(fn_idx) = enclosing_fn(lines, current_idx) else {
        return false;
    };
    for i in (0..fn_idx).rev() {
        let line = lines[i].trim();
        if line.starts_with("#[test]") || line.starts_with("#[tokio::test") {
            return true;
        }
        if !line.starts_with("#[") && !line.starts_with("///") {
            break;
        }
    }
    false
}

/// Check if line is inside an async function
pub fn is_in_async_function(lines: &[&str], current_idx: usize) -> bool {
    enclosing_fn(lines, current_idx).is_some_and(|i| is_async_fn_header(lines[i].trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_header_detection() {
        assert!(is_fn_header("fn main() {"));
        assert!(is_fn_header("pub fn load_config() -> Result<()> {"));
        assert!(is_fn_header("pub(crate) async fn fetch(&self) {"));
        assert!(!is_fn_header("let f = fn_pointer;"));
        assert!(is_async_fn_header("pub async fn run(mut self) -> Message {"));
        assert!(!is_async_fn_header("pub fn run(self) {"));
    }

    #[test]
    fn test_async_context_detection() {
        let code = [
            "pub async fn bad() {",
            "    let contents = std::fs::read_to_string(\"file.txt\")?;",
            "}",
            "pub fn fine() {",
            "    let contents = std::fs::read_to_string(\"config.toml\")?;",
            "}",
        ];
        assert!(is_in_async_function(&code, 1));
        assert!(!is_in_async_function(&code, 4));
    }

    #[test]
    fn test_test_code_detection() {
        let code = [
            "#[tokio::test]",
            "async fn test_something() {",
            "    std::fs::write(\"x\", \"y\").unwrap();",
            "}",
            "async fn production() {",
            "    run().await;",
            "}",
        ];
        assert!(is_in_test_code(&code, 2));
        assert!(!is_in_test_code(&code, 5));
    }

    #[test]
    fn test_workspace_root_holds_both_crates() {
        let root = workspace_root();
        assert!(root.join("conductor/core/Cargo.toml").exists());
        assert!(root.join("tui/Cargo.toml").exists());
    }
}
