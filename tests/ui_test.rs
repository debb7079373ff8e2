use anyhow::Result;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use std::sync::Arc;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use hunkview::app::{App, AppOptions};
use hunkview::apply::GitBackend;
use hunkview::highlight::Highlighter;
use hunkview::types::*;
use hunkview::ui;
use hunkview::window::WindowConfig;

const MAIN_DIFF: &str = "\
diff --git a/src/main.rs b/src/main.rs
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,3 +1,3 @@
 use std::io;
-let x = 1;
+let x = 42;
 println!(\"hello\");
";

/// Serves canned diffs; the full-context request gets a long file.
struct CannedGit;

impl GitBackend for CannedGit {
    fn diff(&self, file: &ChangedFile, context: u32) -> Result<String> {
        if context > 100 {
            let body: String = (0..200).map(|i| format!(" fn f{i}() {{}}\n")).collect();
            return Ok(format!(
                "--- a/src/main.rs\n+++ b/src/main.rs\n@@ -1,200 +1,200 @@\n{body}"
            ));
        }
        if file.path.ends_with("main.rs") {
            Ok(MAIN_DIFF.to_string())
        } else {
            Ok("--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -5,1 +5,1 @@\n-old_fn()\n+new_fn()\n".to_string())
        }
    }

    fn apply_patch(&self, _patch: &str, _args: &[&str]) -> Result<bool> {
        Ok(true)
    }
}

fn make_test_files() -> Vec<ChangedFile> {
    vec![
        ChangedFile::new("src/main.rs", DiffSide::Unstaged, DeltaStatus::Modified),
        ChangedFile::new("src/lib.rs", DiffSide::Unstaged, DeltaStatus::Untracked),
    ]
}

fn make_app(options: AppOptions) -> App {
    App::new(make_test_files(), Arc::new(CannedGit), options)
}

/// Helper: render the UI into a TestBackend buffer and return the buffer content as a string.
fn render_to_string(width: u16, height: u16, app: &mut App) -> String {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).unwrap();
    let highlighter = Highlighter::new();

    terminal
        .draw(|frame| {
            ui::render(frame, app, &highlighter);
        })
        .unwrap();

    let buffer = terminal.backend().buffer().clone();
    let mut output = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            let cell = &buffer[(x, y)];
            output.push_str(cell.symbol());
        }
        output.push('\n');
    }
    output
}

#[test]
fn test_file_list_render() {
    let mut app = make_app(AppOptions::default());
    let output = render_to_string(100, 24, &mut app);

    assert!(
        output.contains("src/main.rs"),
        "Expected 'src/main.rs' in output:\n{}",
        output
    );
    assert!(
        output.contains("src/lib.rs"),
        "Expected 'src/lib.rs' in output:\n{}",
        output
    );
    assert!(output.contains("U M"), "Expected side and status icons:\n{output}");
    assert!(output.contains("U ?"), "Expected untracked icon:\n{output}");
}

#[test]
fn test_diff_view_render() {
    let mut app = make_app(AppOptions::default());
    let output = render_to_string(100, 30, &mut app);

    assert!(
        output.contains("@@ -1,3 +1,3 @@"),
        "Expected hunk header in output:\n{}",
        output
    );
    assert!(output.contains("+let x = 42;"), "Expected added line:\n{output}");
    assert!(output.contains("-let x = 1;"), "Expected removed line:\n{output}");
    assert!(output.contains("(unstaged)"), "Expected side in title:\n{output}");
    assert!(output.contains('▶'), "Expected cursor marker:\n{output}");
}

#[test]
fn test_status_bar_render() {
    let mut app = make_app(AppOptions::default());
    let output = render_to_string(140, 24, &mut app);

    assert!(
        output.contains("hunk 1/1"),
        "Expected hunk position in status bar:\n{}",
        output
    );
    assert!(output.contains("+1 -1"), "Expected change counts:\n{output}");
    assert!(output.contains("s:stage"), "Expected key hints:\n{output}");
    assert!(output.contains("q:quit"), "Expected key hints:\n{output}");
}

#[test]
fn test_status_bar_shows_message() {
    let mut app = make_app(AppOptions::default());
    app.handle_key(
        KeyEvent::new(KeyCode::Char('u'), KeyModifiers::NONE),
        Instant::now(),
    );
    let output = render_to_string(140, 24, &mut app);
    assert!(
        output.contains("Cannot unstage"),
        "Expected refusal message:\n{output}"
    );
}

#[test]
fn test_empty_state_render() {
    let mut app = App::new(Vec::new(), Arc::new(CannedGit), AppOptions::default());
    let output = render_to_string(80, 20, &mut app);
    assert!(output.contains("No changes to display."), "{output}");
    assert!(output.contains("no diff"), "{output}");
}

#[test]
fn test_full_file_view_render_with_window_markers() {
    let options = AppOptions {
        window: WindowConfig::new(50, 10, 20),
        ..AppOptions::default()
    };
    let mut app = make_app(options);
    app.toggle_full_file();
    let deadline = Instant::now() + std::time::Duration::from_secs(10);
    while app.view.is_fetching() && Instant::now() < deadline {
        app.poll_background();
        std::thread::yield_now();
    }

    let output = render_to_string(100, 24, &mut app);
    assert!(output.contains("full file"), "Expected full file title:\n{output}");
    assert!(output.contains("fn f0()"), "Expected first lines:\n{output}");

    app.view.go_to_bottom();
    let output = render_to_string(100, 24, &mut app);
    assert!(output.contains("fn f199()"), "Expected last line:\n{output}");
    assert!(
        !output.contains("fn f0()"),
        "Top of the file should be out of view:\n{output}"
    );
    assert!(output.contains("hunk 1/1"), "{output}");
}

#[test]
fn test_layout_proportions() {
    let mut app = make_app(AppOptions::default());

    let backend = TestBackend::new(100, 24);
    let mut terminal = Terminal::new(backend).unwrap();
    let highlighter = Highlighter::new();

    terminal
        .draw(|frame| {
            ui::render(frame, &mut app, &highlighter);
        })
        .unwrap();

    // After rendering, app.file_list_area should be populated
    let fl_area = app.file_list_area;

    // File list should be roughly 25% of total width (100)
    assert!(
        (20..=30).contains(&fl_area.width),
        "File list width {} should be ~25% of 100",
        fl_area.width
    );

    let diff_width = 100 - fl_area.width;
    assert!(
        (70..=80).contains(&diff_width),
        "Diff view width {} should be ~75% of 100",
        diff_width
    );
}
