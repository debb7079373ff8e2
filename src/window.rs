//! Bounded view over an arbitrarily long line sequence.
//!
//! Only `window_size` lines are ever handed to the renderer. The window moves
//! in `buffer_size` steps once the cursor gets within `buffer_threshold` lines
//! of an edge that is not the document boundary, and re-centers on jumps.

use std::sync::Arc;

/// Default maximum number of lines materialized at once.
pub const DEFAULT_WINDOW_SIZE: usize = 1000;
/// Default distance from a window edge that triggers a shift.
pub const DEFAULT_BUFFER_THRESHOLD: usize = 200;
/// Default number of lines the window moves per shift.
pub const DEFAULT_BUFFER_SIZE: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    window_size: usize,
    buffer_threshold: usize,
    buffer_size: usize,
}

impl WindowConfig {
    /// Build a config whose shifts always keep the cursor materialized.
    ///
    /// The threshold is capped below half the window and the step to what is
    /// left between the two threshold zones, so a shift never lands the
    /// cursor in the opposite zone.
    pub fn new(window_size: usize, buffer_threshold: usize, buffer_size: usize) -> Self {
        let window_size = window_size.max(1);
        let buffer_threshold = buffer_threshold.min((window_size - 1) / 2);
        let max_step = (window_size - 2 * buffer_threshold).max(1);
        Self {
            window_size,
            buffer_threshold,
            buffer_size: buffer_size.clamp(1, max_step),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn buffer_threshold(&self) -> usize {
        self.buffer_threshold
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_WINDOW_SIZE,
            DEFAULT_BUFFER_THRESHOLD,
            DEFAULT_BUFFER_SIZE,
        )
    }
}

/// Half-open `[start, end)` bounds of the materialized lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowState {
    pub start: usize,
    pub end: usize,
    pub total_lines: usize,
}

impl WindowState {
    pub fn contains(&self, position: usize) -> bool {
        (self.start..self.end).contains(&position)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Holds every line of a document and exposes a shiftable window over them.
#[derive(Debug, Clone)]
pub struct WindowedLines {
    config: WindowConfig,
    lines: Arc<[String]>,
    state: WindowState,
}

impl WindowedLines {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            lines: Arc::from(Vec::new()),
            state: WindowState::default(),
        }
    }

    pub fn config(&self) -> WindowConfig {
        self.config
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    /// Replace the line sequence and reset the window to the top.
    pub fn set_lines(&mut self, lines: Arc<[String]>) {
        let total = lines.len();
        self.lines = lines;
        self.state = WindowState {
            start: 0,
            end: total.min(self.config.window_size),
            total_lines: total,
        };
    }

    /// The materialized lines, without any markers.
    pub fn visible_lines(&self) -> &[String] {
        &self.lines[self.state.start..self.state.end]
    }

    /// Absolute line text, if the line is inside the window.
    pub fn line(&self, absolute: usize) -> Option<&str> {
        self.state
            .contains(absolute)
            .then(|| self.lines[absolute].as_str())
    }

    /// Lines hidden above the window, when a marker should be shown.
    pub fn hidden_above(&self) -> Option<usize> {
        (self.is_windowed() && self.state.start > 0).then_some(self.state.start)
    }

    /// Lines hidden below the window, when a marker should be shown.
    pub fn hidden_below(&self) -> Option<usize> {
        let below = self.state.total_lines - self.state.end;
        (self.is_windowed() && below > 0).then_some(below)
    }

    fn is_windowed(&self) -> bool {
        self.state.total_lines > self.config.window_size
    }

    /// Joined text of the window, with "more lines" markers at non-boundary
    /// edges. Markers are display-only and do not take part in position mapping.
    pub fn windowed_content(&self) -> String {
        let mut out: Vec<String> = Vec::with_capacity(self.state.len() + 2);
        if let Some(above) = self.hidden_above() {
            out.push(more_lines_marker(above, "above"));
        }
        out.extend(self.visible_lines().iter().cloned());
        if let Some(below) = self.hidden_below() {
            out.push(more_lines_marker(below, "below"));
        }
        out.join("\n")
    }

    /// React to the scroll cursor moving to `absolute`.
    ///
    /// Shifts the window by `buffer_size` when the cursor is within
    /// `buffer_threshold` lines of an edge that is not the document boundary.
    /// A cursor outside the window re-centers it instead. Returns whether the
    /// window moved.
    pub fn handle_scroll(&mut self, absolute: usize) -> bool {
        let total = self.state.total_lines;
        if total == 0 || !self.is_windowed() {
            return false;
        }
        let position = absolute.min(total - 1);
        if !self.state.contains(position) {
            return self.scroll_to_absolute(position);
        }

        let WindowConfig {
            window_size,
            buffer_threshold,
            buffer_size,
        } = self.config;

        let near_bottom =
            self.state.end < total && position + buffer_threshold >= self.state.end;
        let near_top = self.state.start > 0 && position < self.state.start + buffer_threshold;

        let shifted = if near_bottom {
            self.state.start + buffer_size
        } else if near_top {
            self.state.start.saturating_sub(buffer_size)
        } else {
            return false;
        };

        // The cursor stays materialized.
        let new_start = shifted
            .clamp((position + 1).saturating_sub(window_size), position)
            .min(total - window_size);
        self.move_to(new_start)
    }

    /// Make sure `position` is materialized, re-centering the window on it
    /// when it is not. Positions past the end clamp to the last line.
    pub fn scroll_to_absolute(&mut self, position: usize) -> bool {
        let total = self.state.total_lines;
        if total == 0 {
            return false;
        }
        let position = position.min(total - 1);
        if self.state.contains(position) {
            return false;
        }

        let window_size = self.config.window_size.min(total);
        let start = position
            .saturating_sub(window_size / 2)
            .min(total - window_size);
        self.move_to(start)
    }

    fn move_to(&mut self, start: usize) -> bool {
        let total = self.state.total_lines;
        let next = WindowState {
            start,
            end: (start + self.config.window_size).min(total),
            total_lines: total,
        };
        let moved = next != self.state;
        self.state = next;
        moved
    }

    pub fn to_absolute(&self, relative: usize) -> usize {
        self.state.start + relative
    }

    pub fn to_relative(&self, absolute: usize) -> usize {
        absolute.saturating_sub(self.state.start)
    }
}

pub(crate) fn more_lines_marker(count: usize, direction: &str) -> String {
    let arrow = if direction == "above" { '↑' } else { '↓' };
    let noun = if count == 1 { "line" } else { "lines" };
    format!("{arrow} {count} more {noun} {direction}")
}
