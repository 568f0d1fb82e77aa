//! Transcript Rendering Tests
//!
//! Drive the controller with the mock classifier and draw the resulting
//! transcript into a ratatui test backend.

use ratatui::backend::TestBackend;
use ratatui::widgets::Paragraph;
use ratatui::Terminal;

use codetell_core::{ChatController, ControllerConfig, FileHandle, MockBackend};
use codetell_tui::display::{line_text, staged_chips, transcript_lines};
use codetell_tui::headless::render_plain;

fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    let area = buffer.area;
    let mut out = String::new();
    for y in 0..area.height {
        for x in 0..area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

#[tokio::test]
async fn test_verdict_renders_in_terminal() {
    let controller = ChatController::new(MockBackend::default(), ControllerConfig::default());
    controller
        .submit_and_wait("def add(a, b): return a + b")
        .await
        .unwrap();

    let snapshot = controller.snapshot();
    let lines = transcript_lines(&snapshot, 100);

    let mut terminal = Terminal::new(TestBackend::new(100, 60)).unwrap();
    terminal
        .draw(|frame| frame.render_widget(Paragraph::new(lines), frame.area()))
        .unwrap();

    let screen = buffer_text(&terminal);
    assert!(screen.contains("def add(a, b)"));
    assert!(screen.contains("Prediction:"));
    assert!(screen.contains('%'));
}

#[tokio::test]
async fn test_staged_files_show_as_chips_until_submitted() {
    let controller = ChatController::new(MockBackend::default(), ControllerConfig::default());
    controller
        .stage_files(vec![
            FileHandle::from_bytes("main.py", "def main(): pass"),
            FileHandle::from_bytes("notes.txt", "todo"),
        ])
        .await;

    let chips = line_text(&staged_chips(&controller.snapshot().pending_files));
    assert!(chips.contains("main.py"));
    assert!(!chips.contains("notes.txt"));

    controller.submit_and_wait("").await.unwrap();
    let snapshot = controller.snapshot();
    assert!(snapshot.pending_files.is_empty());

    let plain = render_plain(&snapshot);
    assert!(plain.contains("[you] Uploaded 1 file(s) for analysis"));
    assert!(plain.contains("+ main.py"));
}

#[tokio::test]
async fn test_prose_gets_a_prompt_instead_of_a_verdict() {
    let controller = ChatController::new(MockBackend::default(), ControllerConfig::default());
    let reply = controller.submit_and_wait("how are you today?").await.unwrap();

    assert!(reply.analysis.is_none());
    assert!(reply.content.contains("paste a code snippet"));
}
