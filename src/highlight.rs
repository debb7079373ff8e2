use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

use crate::types::LineKind;
use crate::ui::theme;

/// Highlighter wraps syntect for syntax highlighting of diff lines.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl Highlighter {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Detect the syntax name for a file path.
    pub fn detect_syntax(&self, path: &str) -> &str {
        let syntax = self
            .syntax_set
            .find_syntax_for_file(path)
            .ok()
            .flatten()
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());
        syntax.name.as_str()
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set.themes.get(theme::syntect_theme())
    }

    /// Render one raw diff line (prefix included) as styled spans.
    ///
    /// Headers and markers get flat styles. Added and context lines are
    /// syntax highlighted after the one-character prefix. Removed lines stay
    /// flat so they read as gone.
    pub fn highlight_line(&self, path: &str, line: &str, kind: LineKind) -> Line<'static> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match kind {
            LineKind::FileHeader => flat(line, theme::file_header_style()),
            LineKind::HunkHeader => flat(line, theme::hunk_header_style()),
            LineKind::NoNewline => flat(line, theme::marker_style()),
            LineKind::Removed => flat(line, theme::removed_style()),
            LineKind::Added | LineKind::Context => {
                let (prefix, code) = split_prefix(line);
                let (prefix_style, bg) = if kind == LineKind::Added {
                    (
                        theme::added_style().add_modifier(Modifier::BOLD),
                        Some(theme::current().added_bg),
                    )
                } else {
                    (theme::context_style(), None)
                };
                let mut spans = vec![Span::styled(prefix.to_string(), prefix_style)];
                spans.extend(self.highlight_code(path, code, bg));
                Line::from(spans)
            }
        }
    }

    fn highlight_code(&self, path: &str, code: &str, bg: Option<Color>) -> Vec<Span<'static>> {
        let plain = || {
            let style = match bg {
                Some(bg_color) => Style::default().bg(bg_color),
                None => theme::context_style(),
            };
            vec![Span::styled(code.to_string(), style)]
        };

        let Some(syntect_theme) = self.theme() else {
            return plain();
        };
        let syntax = self
            .syntax_set
            .find_syntax_for_file(path)
            .ok()
            .flatten()
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());
        let mut h = HighlightLines::new(syntax, syntect_theme);

        let with_newline = format!("{code}\n");
        match h.highlight_line(&with_newline, &self.syntax_set) {
            Ok(ranges) => ranges
                .iter()
                .map(|(style, text)| {
                    let fg =
                        Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
                    let mut ratatui_style = Style::default().fg(fg);

                    if style.font_style.contains(FontStyle::BOLD) {
                        ratatui_style = ratatui_style.add_modifier(Modifier::BOLD);
                    }
                    if style.font_style.contains(FontStyle::ITALIC) {
                        ratatui_style = ratatui_style.add_modifier(Modifier::ITALIC);
                    }
                    if let Some(bg_color) = bg {
                        ratatui_style = ratatui_style.bg(bg_color);
                    }

                    Span::styled(text.trim_end_matches('\n').to_string(), ratatui_style)
                })
                .filter(|span| !span.content.is_empty())
                .collect(),
            Err(e) => {
                log::debug!("highlighting {path} failed: {e}");
                plain()
            }
        }
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

fn flat(line: &str, style: Style) -> Line<'static> {
    Line::from(Span::styled(line.to_string(), style))
}

/// Split a diff body line into its `+`/`-`/` ` prefix and the code.
fn split_prefix(line: &str) -> (&str, &str) {
    match line.chars().next() {
        Some(c @ ('+' | '-' | ' ')) => line.split_at(c.len_utf8()),
        _ => ("", line),
    }
}
