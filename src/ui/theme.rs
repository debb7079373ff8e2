use ratatui::style::{Color, Modifier, Style};
use std::sync::OnceLock;

/// Which color variant is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

/// All colors used by the TUI.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub variant: ThemeVariant,

    pub added_bg: Color,
    pub added_fg: Color,

    pub removed_bg: Color,
    pub removed_fg: Color,

    pub context_fg: Color,
    pub marker_fg: Color,

    pub hunk_header_fg: Color,
    pub file_header_fg: Color,

    pub selected_bg: Color,
    pub selected_fg: Color,
    pub cursor_bg: Color,
    pub current_hunk_fg: Color,

    pub staged_fg: Color,
    pub unstaged_fg: Color,
    pub untracked_fg: Color,
    pub deleted_fg: Color,
    pub renamed_fg: Color,

    pub status_bar_bg: Color,
    pub status_bar_fg: Color,

    pub border_focused: Color,
    pub border_unfocused: Color,

    /// The syntect theme name to use for syntax highlighting.
    pub syntect_theme: &'static str,
}

impl ThemeColors {
    /// For dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            variant: ThemeVariant::Dark,

            added_bg: Color::Rgb(0, 60, 0),
            added_fg: Color::Green,

            removed_bg: Color::Rgb(60, 0, 0),
            removed_fg: Color::Red,

            context_fg: Color::Gray,
            marker_fg: Color::DarkGray,

            hunk_header_fg: Color::Cyan,
            file_header_fg: Color::Yellow,

            selected_bg: Color::Rgb(40, 40, 80),
            selected_fg: Color::White,
            cursor_bg: Color::Rgb(50, 50, 50),
            current_hunk_fg: Color::Cyan,

            staged_fg: Color::Green,
            unstaged_fg: Color::Yellow,
            untracked_fg: Color::Magenta,
            deleted_fg: Color::Red,
            renamed_fg: Color::Cyan,

            status_bar_bg: Color::Rgb(30, 30, 30),
            status_bar_fg: Color::White,

            border_focused: Color::Cyan,
            border_unfocused: Color::DarkGray,

            syntect_theme: "base16-ocean.dark",
        }
    }

    /// For light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            variant: ThemeVariant::Light,

            added_bg: Color::Rgb(210, 255, 210),
            added_fg: Color::Rgb(0, 120, 0),

            removed_bg: Color::Rgb(255, 220, 220),
            removed_fg: Color::Rgb(180, 0, 0),

            context_fg: Color::DarkGray,
            marker_fg: Color::Gray,

            hunk_header_fg: Color::Rgb(0, 130, 130),
            file_header_fg: Color::Rgb(150, 100, 0),

            selected_bg: Color::Rgb(200, 210, 240),
            selected_fg: Color::Black,
            cursor_bg: Color::Rgb(230, 230, 230),
            current_hunk_fg: Color::Rgb(0, 130, 130),

            staged_fg: Color::Rgb(0, 140, 0),
            unstaged_fg: Color::Rgb(180, 130, 0),
            untracked_fg: Color::Rgb(160, 0, 160),
            deleted_fg: Color::Rgb(180, 0, 0),
            renamed_fg: Color::Rgb(0, 130, 130),

            status_bar_bg: Color::Rgb(225, 225, 225),
            status_bar_fg: Color::Black,

            border_focused: Color::Rgb(0, 130, 130),
            border_unfocused: Color::Gray,

            syntect_theme: "InspiredGitHub",
        }
    }

    /// Resolve a `--theme` value: "dark", "light", or anything else for
    /// auto-detection.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            _ => Self::detect(std::env::var("COLORFGBG").ok().as_deref()),
        }
    }

    /// Guess from a `COLORFGBG` value ("fg;bg"). A background of 8 or more
    /// usually means a light terminal.
    fn detect(colorfgbg: Option<&str>) -> Self {
        if let Some(val) = colorfgbg
            && let Some(bg) = val.rsplit(';').next().and_then(|s| s.parse::<u8>().ok())
            && bg >= 8
        {
            Self::light()
        } else {
            Self::dark()
        }
    }
}

/// Global active theme, initialised once at startup.
static THEME: OnceLock<ThemeColors> = OnceLock::new();

/// Initialise the global theme. Call once from main before the TUI starts.
pub fn init(name: &str) {
    let colors = ThemeColors::from_name(name);
    log::debug!("using {:?} theme", colors.variant);
    let _ = THEME.set(colors);
}

/// Return the active theme. Falls back to dark if `init()` was not called.
pub fn current() -> &'static ThemeColors {
    THEME.get_or_init(ThemeColors::dark)
}

pub fn syntect_theme() -> &'static str {
    current().syntect_theme
}

// --- Style helpers ---

pub fn added_style() -> Style {
    Style::default().fg(current().added_fg).bg(current().added_bg)
}

pub fn removed_style() -> Style {
    Style::default()
        .fg(current().removed_fg)
        .bg(current().removed_bg)
}

pub fn context_style() -> Style {
    Style::default().fg(current().context_fg)
}

pub fn marker_style() -> Style {
    Style::default()
        .fg(current().marker_fg)
        .add_modifier(Modifier::ITALIC)
}

pub fn gutter_style() -> Style {
    Style::default()
        .fg(current().context_fg)
        .add_modifier(Modifier::DIM)
}

pub fn hunk_header_style() -> Style {
    Style::default()
        .fg(current().hunk_header_fg)
        .add_modifier(Modifier::BOLD)
}

pub fn file_header_style() -> Style {
    Style::default()
        .fg(current().file_header_fg)
        .add_modifier(Modifier::BOLD)
}

pub fn current_hunk_style() -> Style {
    Style::default()
        .fg(current().current_hunk_fg)
        .add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default()
        .fg(current().selected_fg)
        .bg(current().selected_bg)
}

pub fn status_bar_style() -> Style {
    Style::default()
        .fg(current().status_bar_fg)
        .bg(current().status_bar_bg)
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(current().border_focused)
    } else {
        Style::default().fg(current().border_unfocused)
    }
}
