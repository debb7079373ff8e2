use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

use crate::types::{ChangedFile, DeltaStatus, DiffSide};
use crate::ui::theme;

/// Render the file list panel.
pub fn render(frame: &mut Frame, area: Rect, files: &[ChangedFile], selected: usize, focused: bool) {
    let block = Block::default()
        .title(" Files ")
        .borders(Borders::ALL)
        .border_style(theme::border_style(focused));

    let items: Vec<ListItem> = files
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let style = if i == selected {
                theme::selected_style().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let line = Line::from(vec![
                Span::styled(side_icon(file.side), side_color(file.side)),
                Span::raw(" "),
                Span::styled(delta_status_icon(file.status), delta_color(file.status)),
                Span::raw(" "),
                Span::styled(file.path.to_string_lossy().to_string(), style),
            ]);

            ListItem::new(line)
        })
        .collect();

    let mut state = ListState::default();
    if !files.is_empty() {
        state.select(Some(selected));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::selected_style())
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(list, area, &mut state);
}

fn side_icon(side: DiffSide) -> &'static str {
    match side {
        DiffSide::Staged => "S",
        DiffSide::Unstaged => "U",
    }
}

fn side_color(side: DiffSide) -> Style {
    match side {
        DiffSide::Staged => Style::default().fg(theme::current().staged_fg),
        DiffSide::Unstaged => Style::default().fg(theme::current().unstaged_fg),
    }
}

fn delta_status_icon(status: DeltaStatus) -> &'static str {
    match status {
        DeltaStatus::Modified => "M",
        DeltaStatus::Added => "A",
        DeltaStatus::Deleted => "D",
        DeltaStatus::Renamed => "R",
        DeltaStatus::Untracked => "?",
    }
}

fn delta_color(status: DeltaStatus) -> Style {
    let colors = theme::current();
    match status {
        DeltaStatus::Modified => Style::default().fg(colors.file_header_fg),
        DeltaStatus::Added => Style::default().fg(colors.added_fg),
        DeltaStatus::Deleted => Style::default().fg(colors.deleted_fg),
        DeltaStatus::Renamed => Style::default().fg(colors.renamed_fg),
        DeltaStatus::Untracked => Style::default().fg(colors.untracked_fg),
    }
}
