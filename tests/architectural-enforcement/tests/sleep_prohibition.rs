//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT sleep. The chat reacts to terminal
//! events, watch-channel updates and notices; nothing polls.

use architectural_enforcement::{code_part, is_in_test_code, rust_sources, PRODUCTION_DIRS};

#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = Vec::new();

    for dir in PRODUCTION_DIRS {
        for file in rust_sources(dir) {
            let lines = file.line_refs();
            for (idx, line) in lines.iter().enumerate() {
                let code = code_part(line);
                if !(code.contains("::sleep(") || code.contains(".sleep(")) {
                    continue;
                }
                if is_in_test_code(&lines, idx) {
                    continue;
                }
                violations.push(format!("{}:{} - {}", file.path.display(), idx + 1, line.trim()));
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\n❌ Sleep calls found in production code:\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Wait on I/O instead: tokio::select!, watch::Receiver::changed(), mpsc::recv()");
        panic!("Found {} sleep violation(s)", violations.len());
    }
}
