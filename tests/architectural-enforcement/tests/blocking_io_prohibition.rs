//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Async code in the TUI and core MUST NOT use blocking I/O.
//! **Required**: Use `tokio::fs` and the async `reqwest` client.
//! **Acceptable**: Non-async functions (config loading, log setup before
//! the event loop) and test code.

use architectural_enforcement::{
    code_part, is_in_async_function, is_in_test_code, rust_sources, PRODUCTION_DIRS,
};

const FORBIDDEN: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::net::", "Blocking network I/O"),
    ("std::process::Command", "Blocking process I/O"),
    ("reqwest::blocking", "Blocking HTTP client"),
    ("std::thread::spawn", "OS thread in async code"),
];

#[test]
fn test_no_blocking_io_in_async_code() {
    let mut violations = Vec::new();

    for dir in PRODUCTION_DIRS {
        for file in rust_sources(dir) {
            let lines = file.line_refs();
            for (idx, line) in lines.iter().enumerate() {
                let code = code_part(line);
                let Some((_, what)) = FORBIDDEN.iter().find(|(needle, _)| code.contains(needle))
                else {
                    continue;
                };
                if is_in_test_code(&lines, idx) || !is_in_async_function(&lines, idx) {
                    continue;
                }
                violations.push(format!(
                    "{}:{} - {}: {}",
                    file.path.display(),
                    idx + 1,
                    what,
                    line.trim()
                ));
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\n❌ Blocking I/O calls found in async production code:\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use tokio::fs::read().await, tokio::fs::write().await, reqwest async client");
        panic!("Found {} blocking I/O violation(s)", violations.len());
    }
}

#[test]
fn test_no_blocking_http_client_anywhere() {
    let offenders: Vec<String> = PRODUCTION_DIRS
        .iter()
        .flat_map(|dir| rust_sources(dir))
        .filter(|file| file.lines.iter().any(|l| code_part(l).contains("reqwest::blocking")))
        .map(|file| file.path.display().to_string())
        .collect();

    assert!(offenders.is_empty(), "reqwest::blocking used in: {offenders:?}");
}
