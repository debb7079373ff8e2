//! The diff view: one file's diff, a window over its lines, the current hunk,
//! and the hunk commands that are legal for it.
//!
//! This is the only engine type the key dispatch and rendering layers use.
//! It never refreshes itself after a hunk command; the caller re-fetches the
//! diff and calls [`DiffViewController::show_diff`] again.

use std::sync::Arc;
use thiserror::Error;

use crate::apply::{self, GitBackend, PendingRequest, RequestStatus, RequestToken, RequestTokens};
use crate::navigator::HunkNavigator;
use crate::patch::parse_document;
use crate::types::{ChangedFile, DeltaStatus, DiffDocument, DiffSide, Hunk, HunkIntent, LineKind};
use crate::window::{WindowConfig, WindowedLines};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Empty,
    Loaded,
    FullFile,
}

/// Result of asking for the full-file view to be toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Entered,
    Exited,
    /// The full-context diff is being fetched; [`DiffViewController::poll`]
    /// reports when it lands.
    Fetching,
    /// Nothing changed.
    Unavailable,
}

/// Why a hunk command was refused before reaching git.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HunkCommandError {
    #[error("no diff is loaded")]
    NoDiff,
    #[error("no hunk selected")]
    NoHunk,
    #[error("cannot {intent} a hunk from the {side} view")]
    WrongSide { intent: HunkIntent, side: DiffSide },
    #[error("refusing to discard an untracked file")]
    UntrackedDiscard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportRow<'a> {
    /// Absolute line in the document.
    pub line: usize,
    pub text: &'a str,
    pub kind: LineKind,
}

/// The rows to paint for the current viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport<'a> {
    /// "N more lines above" marker to draw before the rows.
    pub hidden_above: Option<usize>,
    pub rows: Vec<ViewportRow<'a>>,
    /// "N more lines below" marker to draw after the rows.
    pub hidden_below: Option<usize>,
    pub cursor: usize,
}

/// Hunk position metadata for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewStatus {
    pub mode: ViewMode,
    pub current_hunk: Option<usize>,
    pub hunk_count: usize,
    pub cursor: usize,
    pub total_lines: usize,
}

#[derive(Debug)]
pub struct DiffViewController {
    mode: ViewMode,
    file: Option<ChangedFile>,
    diff: DiffDocument,
    /// Full-context document, fetched at most once per `show_diff`.
    full: Option<DiffDocument>,
    window: WindowedLines,
    navigator: HunkNavigator,
    cursor: usize,
    top: usize,
    viewport_height: usize,
    tokens: RequestTokens,
    pending_fetch: Option<PendingRequest<Option<String>>>,
}

impl DiffViewController {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            mode: ViewMode::Empty,
            file: None,
            diff: DiffDocument::empty(),
            full: None,
            window: WindowedLines::new(config),
            navigator: HunkNavigator::default(),
            cursor: 0,
            top: 0,
            viewport_height: 1,
            tokens: RequestTokens::default(),
            pending_fetch: None,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn file(&self) -> Option<&ChangedFile> {
        self.file.as_ref()
    }

    /// The document currently on screen.
    pub fn document(&self) -> Option<&DiffDocument> {
        match self.mode {
            ViewMode::Empty => None,
            ViewMode::Loaded => Some(&self.diff),
            ViewMode::FullFile => self.full.as_ref(),
        }
    }

    pub fn window(&self) -> &WindowedLines {
        &self.window
    }

    pub fn is_fetching(&self) -> bool {
        self.pending_fetch.is_some()
    }

    /// Display a freshly fetched diff. Drops the full-context cache and
    /// abandons every in-flight request.
    pub fn show_diff(&mut self, text: &str, file: ChangedFile) {
        self.tokens.invalidate();
        self.pending_fetch = None;
        self.full = None;
        self.diff = parse_document(text);
        log::debug!(
            "showing {} ({}): {} lines, {} hunks",
            file.path.display(),
            file.side,
            self.diff.total_lines(),
            self.diff.hunks.len()
        );
        self.file = Some(file);
        self.mode = ViewMode::Loaded;
        self.reset_view();
    }

    /// Back to the empty state.
    pub fn clear(&mut self) {
        self.tokens.invalidate();
        self.pending_fetch = None;
        self.full = None;
        self.diff = DiffDocument::empty();
        self.file = None;
        self.mode = ViewMode::Empty;
        self.reset_view();
    }

    fn reset_view(&mut self) {
        let (lines, navigator) = match self.document() {
            Some(doc) => (doc.lines.clone(), HunkNavigator::new(&doc.hunks)),
            None => (Arc::from(Vec::new()), HunkNavigator::default()),
        };
        self.window.set_lines(lines);
        self.navigator = navigator;
        self.cursor = 0;
        self.top = 0;
    }

    /// Switch between the diff and the full-file view.
    ///
    /// The full-context diff is fetched in the background the first time
    /// and reused afterwards. Leaving the full-file view never fetches.
    pub fn toggle_full_file_view(&mut self, backend: &Arc<dyn GitBackend>) -> ToggleOutcome {
        match self.mode {
            ViewMode::Empty => ToggleOutcome::Unavailable,
            ViewMode::FullFile => {
                self.mode = ViewMode::Loaded;
                self.reset_view();
                ToggleOutcome::Exited
            }
            ViewMode::Loaded => {
                if self.full.is_some() {
                    self.mode = ViewMode::FullFile;
                    self.reset_view();
                    return ToggleOutcome::Entered;
                }
                if self.pending_fetch.is_some() {
                    return ToggleOutcome::Fetching;
                }
                let Some(file) = self.file.clone() else {
                    return ToggleOutcome::Unavailable;
                };
                let token = self.tokens.issue();
                self.pending_fetch = Some(apply::spawn_full_context(
                    Arc::clone(backend),
                    token,
                    file,
                ));
                ToggleOutcome::Fetching
            }
        }
    }

    /// Check on a background full-context fetch. Returns `None` while
    /// nothing has finished.
    pub fn poll(&mut self) -> Option<ToggleOutcome> {
        let pending = self.pending_fetch.as_ref()?;
        let token = pending.token();
        match pending.poll() {
            RequestStatus::Pending => None,
            RequestStatus::Ready(text) => {
                self.pending_fetch = None;
                Some(self.finish_full_context(token, text))
            }
            RequestStatus::Lost => {
                self.pending_fetch = None;
                Some(ToggleOutcome::Unavailable)
            }
        }
    }

    fn finish_full_context(&mut self, token: RequestToken, text: Option<String>) -> ToggleOutcome {
        if !self.tokens.is_live(token) || self.mode != ViewMode::Loaded {
            return ToggleOutcome::Unavailable;
        }
        match text {
            Some(text) => {
                self.full = Some(parse_document(&text));
                self.mode = ViewMode::FullFile;
                self.reset_view();
                ToggleOutcome::Entered
            }
            None => ToggleOutcome::Unavailable,
        }
    }

    fn total_lines(&self) -> usize {
        self.window.total_lines()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height.max(1);
        self.keep_cursor_visible();
    }

    /// Move the cursor by `delta` lines. Returns whether it moved.
    pub fn scroll_by(&mut self, delta: isize) -> bool {
        let total = self.total_lines();
        if total == 0 {
            return false;
        }
        let target = self.cursor.saturating_add_signed(delta).min(total - 1);
        let moved = target != self.cursor;
        self.cursor = target;
        self.window.handle_scroll(target);
        self.navigator.sync_to_line(target);
        self.keep_cursor_visible();
        moved
    }

    pub fn page_down(&mut self) -> bool {
        self.scroll_by(self.viewport_height as isize)
    }

    pub fn page_up(&mut self) -> bool {
        self.scroll_by(-(self.viewport_height as isize))
    }

    /// Put the cursor on an absolute line, clamped to the document.
    ///
    /// A line already on screen keeps the viewport where it is.
    pub fn scroll_to_line(&mut self, line: usize) {
        let total = self.total_lines();
        if total == 0 {
            return;
        }
        let target = line.min(total - 1);
        let on_screen = (self.top..self.top + self.viewport_height).contains(&target)
            && self.window.state().contains(target);
        if on_screen {
            self.cursor = target;
            self.window.handle_scroll(target);
            self.keep_cursor_visible();
        } else {
            self.jump_to(target);
        }
        self.navigator.sync_to_line(self.cursor);
    }

    /// Absolute line shown on viewport row `row`, counting the marker row.
    pub fn line_at_row(&self, row: usize) -> Option<usize> {
        let viewport = self.viewport();
        let row = row.checked_sub(usize::from(viewport.hidden_above.is_some()))?;
        viewport.rows.get(row).map(|r| r.line)
    }

    pub fn go_to_top(&mut self) {
        self.navigator.go_to_top();
        self.jump_to(0);
    }

    pub fn go_to_bottom(&mut self) {
        self.navigator.go_to_bottom();
        self.jump_to(usize::MAX);
    }

    pub fn next_hunk(&mut self) -> bool {
        match self.navigator.next_hunk() {
            Some(line) => {
                self.jump_to(line);
                true
            }
            None => false,
        }
    }

    pub fn previous_hunk(&mut self) -> bool {
        match self.navigator.previous_hunk() {
            Some(line) => {
                self.jump_to(line);
                true
            }
            None => false,
        }
    }

    /// Jump to hunk `index` (clamped), e.g. to stay in place after a refresh.
    pub fn select_hunk(&mut self, index: usize) -> bool {
        match self.navigator.select(index) {
            Some(line) => {
                self.jump_to(line);
                true
            }
            None => false,
        }
    }

    fn jump_to(&mut self, line: usize) {
        let total = self.total_lines();
        if total == 0 {
            return;
        }
        self.cursor = line.min(total - 1);
        self.window.scroll_to_absolute(self.cursor);
        self.top = self.cursor;
        self.keep_cursor_visible();
    }

    fn keep_cursor_visible(&mut self) {
        let state = self.window.state();
        if state.is_empty() {
            self.top = 0;
            return;
        }
        let height = self.viewport_height;
        if self.cursor < self.top {
            self.top = self.cursor;
        } else if self.cursor >= self.top + height {
            self.top = self.cursor + 1 - height;
        }
        // Fill the last page instead of leaving blank rows under the end.
        let max_top = state.end.saturating_sub(height).max(state.start);
        self.top = self.top.clamp(state.start, max_top);
    }

    pub fn current_hunk(&self) -> Option<&Hunk> {
        let index = self.navigator.current()?;
        self.document()?.hunks.get(index)
    }

    pub fn status(&self) -> ViewStatus {
        ViewStatus {
            mode: self.mode,
            current_hunk: self.navigator.current(),
            hunk_count: self.navigator.hunk_count(),
            cursor: self.cursor,
            total_lines: self.total_lines(),
        }
    }

    /// The materialized lines, without markers.
    pub fn visible_lines(&self) -> &[String] {
        self.window.visible_lines()
    }

    /// The window's text with its "more lines" markers.
    pub fn visible_text(&self) -> String {
        self.window.windowed_content()
    }

    /// Rows for a viewport of the height set by [`Self::set_viewport_height`].
    pub fn viewport(&self) -> Viewport<'_> {
        let height = self.viewport_height;
        let state = self.window.state();
        let Some(doc) = self.document() else {
            return Viewport {
                hidden_above: None,
                rows: Vec::new(),
                hidden_below: None,
                cursor: self.cursor,
            };
        };

        // The marker row would push the cursor off the bottom otherwise.
        let hidden_above = self
            .window
            .hidden_above()
            .filter(|_| self.top == state.start && self.cursor + 1 < self.top + height);
        let capacity = height - usize::from(hidden_above.is_some());
        let end = (self.top + capacity).min(state.end);

        let rows: Vec<ViewportRow<'_>> = (self.top..end)
            .filter_map(|line| {
                self.window.line(line).map(|text| ViewportRow {
                    line,
                    text,
                    kind: doc.line_kind(line),
                })
            })
            .collect();

        let hidden_below = self
            .window
            .hidden_below()
            .filter(|_| end == state.end && rows.len() < capacity);

        Viewport {
            hidden_above,
            rows,
            hidden_below,
            cursor: self.cursor,
        }
    }

    /// Check that `intent` is legal for the current hunk of this view.
    ///
    /// Stage and discard need the unstaged view, unstage the staged view.
    /// Untracked files are never discarded hunk-wise.
    pub fn check_hunk_command(&self, intent: HunkIntent) -> Result<&Hunk, HunkCommandError> {
        let file = match (&self.file, self.mode) {
            (Some(file), ViewMode::Loaded | ViewMode::FullFile) => file,
            _ => return Err(HunkCommandError::NoDiff),
        };

        let required = match intent {
            HunkIntent::Stage | HunkIntent::Discard => DiffSide::Unstaged,
            HunkIntent::Unstage => DiffSide::Staged,
        };
        if file.side != required {
            return Err(HunkCommandError::WrongSide {
                intent,
                side: file.side,
            });
        }
        if intent == HunkIntent::Discard && file.status == DeltaStatus::Untracked {
            return Err(HunkCommandError::UntrackedDiscard);
        }

        self.current_hunk().ok_or(HunkCommandError::NoHunk)
    }

    /// Start applying the current hunk in the background.
    pub fn hunk_command(
        &mut self,
        intent: HunkIntent,
        backend: &Arc<dyn GitBackend>,
    ) -> Result<PendingRequest<bool>, HunkCommandError> {
        let hunk = self.check_hunk_command(intent)?;
        let patch = hunk.patch.clone();
        log::debug!("{intent} hunk {}", hunk.index);
        let token = self.tokens.issue();
        Ok(apply::spawn_apply(Arc::clone(backend), token, patch, intent))
    }

    pub fn stage_current(
        &mut self,
        backend: &Arc<dyn GitBackend>,
    ) -> Result<PendingRequest<bool>, HunkCommandError> {
        self.hunk_command(HunkIntent::Stage, backend)
    }

    pub fn unstage_current(
        &mut self,
        backend: &Arc<dyn GitBackend>,
    ) -> Result<PendingRequest<bool>, HunkCommandError> {
        self.hunk_command(HunkIntent::Unstage, backend)
    }

    pub fn discard_current(
        &mut self,
        backend: &Arc<dyn GitBackend>,
    ) -> Result<PendingRequest<bool>, HunkCommandError> {
        self.hunk_command(HunkIntent::Discard, backend)
    }

    /// Whether a request result still belongs to what is on screen.
    pub fn accepts(&self, token: RequestToken) -> bool {
        self.tokens.is_live(token)
    }
}

impl Default for DiffViewController {
    fn default() -> Self {
        Self::new(WindowConfig::default())
    }
}
