//! Integration Test: Layering
//!
//! The core crate is headless. Terminal crates belong to the TUI, and the
//! TUI reaches the network only through the core.

use std::fs;

use architectural_enforcement::{code_part, rust_sources, workspace_root};

fn manifest(crate_dir: &str) -> String {
    fs::read_to_string(workspace_root().join(crate_dir).join("Cargo.toml"))
        .unwrap_or_else(|e| panic!("cannot read {crate_dir}/Cargo.toml: {e}"))
}

fn dependency_names(manifest: &str) -> Vec<String> {
    let mut in_deps = false;
    let mut names = Vec::new();
    for line in manifest.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_deps = line == "[dependencies]";
            continue;
        }
        if in_deps && !line.is_empty() && !line.starts_with('#') {
            if let Some((name, _)) = line.split_once('=') {
                names.push(name.trim().to_string());
            }
        }
    }
    names
}

#[test]
fn test_core_has_no_terminal_dependencies() {
    let deps = dependency_names(&manifest("conductor/core"));
    for forbidden in ["ratatui", "crossterm", "clap"] {
        assert!(
            !deps.iter().any(|d| d == forbidden),
            "codetell-core must stay headless but depends on {forbidden}"
        );
    }
}

#[test]
fn test_core_sources_never_touch_the_terminal() {
    for file in rust_sources("conductor/core/src") {
        for (idx, line) in file.lines.iter().enumerate() {
            let code = code_part(line);
            assert!(
                !code.contains("ratatui::") && !code.contains("crossterm::"),
                "{}:{} references a terminal crate",
                file.path.display(),
                idx + 1
            );
        }
    }
}

#[test]
fn test_tui_talks_http_only_through_core() {
    let deps = dependency_names(&manifest("tui"));
    assert!(deps.iter().any(|d| d == "codetell-core"));
    assert!(
        !deps.iter().any(|d| d == "reqwest"),
        "the TUI should reach services through codetell-core backends"
    );
}
