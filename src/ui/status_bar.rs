use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::controller::{DiffViewController, ViewMode};
use crate::ui::theme;

const KEY_HINTS: &str = "s:stage u:unstage dd:discard n/p:hunk f:full r:refresh q:quit";

/// Render the status bar at the bottom of the screen.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    view: &DiffViewController,
    busy: bool,
    message: Option<&str>,
) {
    let mut spans = vec![Span::styled(
        format!(" {} ", position_summary(view)),
        theme::status_bar_style(),
    )];

    if busy {
        spans.push(Span::styled(" applying... ", theme::status_bar_style()));
    }

    let tail = match message {
        Some(msg) => format!(" {msg} "),
        None => format!(" {KEY_HINTS} "),
    };
    spans.push(Span::styled(tail, theme::status_bar_style()));

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_style());
    frame.render_widget(paragraph, area);
}

/// "hunk 2/5 | diff | +3 -1 | line 10/42", or a placeholder when empty.
pub fn position_summary(view: &DiffViewController) -> String {
    let status = view.status();
    let Some(doc) = view.document() else {
        return "no diff".to_string();
    };

    let hunk = match status.current_hunk {
        Some(index) => format!("hunk {}/{}", index + 1, status.hunk_count),
        None => "no hunks".to_string(),
    };
    let mode = match status.mode {
        ViewMode::FullFile => "full file",
        _ => "diff",
    };
    let (added, removed) = doc.change_counts();
    let line = if status.total_lines == 0 {
        "empty".to_string()
    } else {
        format!("line {}/{}", status.cursor + 1, status.total_lines)
    };

    format!("{hunk} | {mode} | +{added} -{removed} | {line}")
}
