pub mod diff_view;
pub mod file_list;
pub mod status_bar;
pub mod theme;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::App;
use crate::highlight::Highlighter;
use crate::types::FocusPanel;

/// Render the full TUI layout.
pub fn render(frame: &mut Frame, app: &mut App, highlighter: &Highlighter) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Main content area
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let main_area = chunks[0];
    let status_area = chunks[1];

    // Split main area into file list + diff view
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25), // File list
            Constraint::Percentage(75), // Diff view
        ])
        .split(main_area);

    let file_list_area = main_chunks[0];
    let diff_view_area = main_chunks[1];

    // Store panel areas for mouse click mapping
    app.file_list_area = file_list_area;
    app.diff_view_area = diff_view_area;

    // The borders take two rows.
    app.view
        .set_viewport_height(diff_view_area.height.saturating_sub(2) as usize);

    file_list::render(
        frame,
        file_list_area,
        &app.files,
        app.selected_file,
        app.focus == FocusPanel::FileList,
    );

    diff_view::render(
        frame,
        diff_view_area,
        &app.view,
        highlighter,
        app.focus == FocusPanel::DiffView,
    );

    status_bar::render(
        frame,
        status_area,
        &app.view,
        app.is_busy(),
        app.message.as_deref(),
    );
}
