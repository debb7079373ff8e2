use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::controller::{DiffViewController, ViewMode};
use crate::highlight::Highlighter;
use crate::ui::theme;
use crate::window::more_lines_marker;

/// Render the diff view panel: the controller's viewport with a gutter that
/// marks the cursor and the current hunk.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    view: &DiffViewController,
    highlighter: &Highlighter,
    focused: bool,
) {
    let title = match view.file() {
        Some(f) => {
            let suffix = if view.mode() == ViewMode::FullFile {
                ", full file"
            } else {
                ""
            };
            format!(" {} ({}{suffix}) ", f.path.display(), f.side)
        }
        None => " No file selected ".to_string(),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(theme::border_style(focused));

    let (Some(file), Some(_)) = (view.file(), view.document()) else {
        let paragraph = Paragraph::new("No changes to display.").block(block);
        frame.render_widget(paragraph, area);
        return;
    };
    let path = file.path.to_string_lossy();

    let current_hunk = view.current_hunk();
    let viewport = view.viewport();
    let mut lines: Vec<Line> = Vec::with_capacity(viewport.rows.len() + 2);

    if let Some(above) = viewport.hidden_above {
        lines.push(marker_line(above, "above"));
    }

    for row in &viewport.rows {
        let is_cursor = row.line == viewport.cursor;
        let in_hunk = current_hunk.is_some_and(|h| h.contains_line(row.line));

        let cursor_mark = if is_cursor { "▶" } else { " " };
        let hunk_mark = if in_hunk { "▌" } else { " " };

        let mut spans = vec![
            Span::styled(cursor_mark, theme::current_hunk_style()),
            Span::styled(hunk_mark, theme::current_hunk_style()),
            Span::styled(" ", theme::gutter_style()),
        ];
        spans.extend(highlighter.highlight_line(&path, row.text, row.kind).spans);

        let mut line = Line::from(spans);
        if is_cursor {
            line = line.patch_style(Style::default().bg(theme::current().cursor_bg));
        }
        lines.push(line);
    }

    if let Some(below) = viewport.hidden_below {
        lines.push(marker_line(below, "below"));
    }

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn marker_line(count: usize, direction: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("   {}", more_lines_marker(count, direction)),
        theme::marker_style(),
    ))
}
