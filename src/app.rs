use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEventKind};
use git2::Repository;
use ratatui::layout::{Position, Rect};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::apply::{GitBackend, PendingRequest, RequestStatus};
use crate::controller::{DiffViewController, ToggleOutcome};
use crate::git;
use crate::highlight::Highlighter;
use crate::types::{ChangedFile, DiffSide, FocusPanel, HunkIntent};
use crate::ui;
use crate::window::WindowConfig;

/// How long the first key of a two-key gesture (`gg`, `dd`) stays armed.
pub const CHORD_TIMEOUT: Duration = Duration::from_millis(500);

/// Default context lines for the normal diff view.
pub const DEFAULT_CONTEXT_LINES: u32 = 3;

/// Two-key gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyChord {
    Idle,
    AwaitingSecond { key: char, deadline: Instant },
}

impl KeyChord {
    /// Feed a chord key. Returns `true` when it completes `key key`.
    pub fn feed(&mut self, key: char, now: Instant) -> bool {
        match *self {
            KeyChord::AwaitingSecond {
                key: first,
                deadline,
            } if first == key && now <= deadline => {
                *self = KeyChord::Idle;
                true
            }
            _ => {
                *self = KeyChord::AwaitingSecond {
                    key,
                    deadline: now + CHORD_TIMEOUT,
                };
                false
            }
        }
    }

    pub fn reset(&mut self) {
        *self = KeyChord::Idle;
    }

    /// Drop an armed key whose deadline has passed. Returns whether it did.
    pub fn expire(&mut self, now: Instant) -> bool {
        match *self {
            KeyChord::AwaitingSecond { deadline, .. } if now > deadline => {
                *self = KeyChord::Idle;
                true
            }
            _ => false,
        }
    }
}

/// Startup settings taken from the command line.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub start_side: DiffSide,
    pub context_lines: u32,
    pub window: WindowConfig,
    pub filter: Option<glob::Pattern>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            start_side: DiffSide::Unstaged,
            context_lines: DEFAULT_CONTEXT_LINES,
            window: WindowConfig::default(),
            filter: None,
        }
    }
}

/// Keep only files matching the `--files` glob.
pub fn filter_files(files: Vec<ChangedFile>, filter: Option<&glob::Pattern>) -> Vec<ChangedFile> {
    match filter {
        Some(pattern) => files
            .into_iter()
            .filter(|f| pattern.matches_path(&f.path))
            .collect(),
        None => files,
    }
}

/// A hunk command running in the background. At most one exists at a time.
#[derive(Debug)]
pub struct PendingApply {
    pub request: PendingRequest<bool>,
    pub intent: HunkIntent,
    pub hunk_index: usize,
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
    /// Re-read the changed file list from git.
    Refresh,
}

/// Reported when a background apply lands and the file list needs reloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyFinished {
    pub applied: bool,
    /// Hunk to return to when the same file is shown again.
    pub hunk_index: Option<usize>,
}

/// Application state for the TUI.
pub struct App {
    pub files: Vec<ChangedFile>,
    pub selected_file: usize,
    pub focus: FocusPanel,
    pub view: DiffViewController,
    pub message: Option<String>,
    /// Cached file list area for mouse click mapping.
    pub file_list_area: Rect,
    /// Cached diff view area; a click there moves the cursor.
    pub diff_view_area: Rect,
    /// Whether the UI needs to be redrawn.
    pub dirty: bool,
    pub pending_apply: Option<PendingApply>,
    chord: KeyChord,
    context_lines: u32,
    filter: Option<glob::Pattern>,
    backend: Arc<dyn GitBackend>,
}

impl App {
    pub fn new(files: Vec<ChangedFile>, backend: Arc<dyn GitBackend>, options: AppOptions) -> Self {
        let files = filter_files(files, options.filter.as_ref());
        let selected_file = files
            .iter()
            .position(|f| f.side == options.start_side)
            .unwrap_or(0);
        let mut app = Self {
            files,
            selected_file,
            focus: FocusPanel::DiffView,
            view: DiffViewController::new(options.window),
            message: None,
            file_list_area: Rect::default(),
            diff_view_area: Rect::default(),
            dirty: true,
            pending_apply: None,
            chord: KeyChord::Idle,
            context_lines: options.context_lines,
            filter: options.filter,
            backend,
        };
        app.load_selected();
        app
    }

    /// Get the currently selected file, if any.
    pub fn current_file(&self) -> Option<&ChangedFile> {
        self.files.get(self.selected_file)
    }

    pub fn is_busy(&self) -> bool {
        self.pending_apply.is_some()
    }

    /// Fetch the selected file's diff and hand it to the view.
    pub fn load_selected(&mut self) {
        self.dirty = true;
        let Some(file) = self.current_file().cloned() else {
            self.view.clear();
            return;
        };
        match self.backend.diff(&file, self.context_lines) {
            Ok(text) => self.view.show_diff(&text, file),
            Err(e) => {
                log::warn!("diff of {} failed: {e:#}", file.path.display());
                self.view.clear();
                self.message = Some(format!("Diff error: {e}"));
            }
        }
    }

    /// Replace the file list, keeping the selection on the same file and
    /// side when it still has changes.
    pub fn set_files(&mut self, files: Vec<ChangedFile>, hunk_index: Option<usize>) {
        let previous = self.current_file().cloned();
        self.files = filter_files(files, self.filter.as_ref());

        let same = previous.as_ref().and_then(|prev| {
            self.files
                .iter()
                .position(|f| f.path == prev.path && f.side == prev.side)
        });
        self.selected_file = match same {
            Some(index) => index,
            None => self.selected_file.min(self.files.len().saturating_sub(1)),
        };
        self.load_selected();

        if same.is_some()
            && let Some(index) = hunk_index
        {
            self.view.select_hunk(index);
        }
    }

    /// Select the next file (wraps around).
    pub fn select_next_file(&mut self) {
        if self.files.is_empty() {
            return;
        }
        self.selected_file = (self.selected_file + 1) % self.files.len();
        self.load_selected();
    }

    /// Select the previous file (wraps around).
    pub fn select_prev_file(&mut self) {
        if self.files.is_empty() {
            return;
        }
        self.selected_file = self
            .selected_file
            .checked_sub(1)
            .unwrap_or(self.files.len() - 1);
        self.load_selected();
    }

    /// Toggle focus between file list and diff view.
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPanel::FileList => FocusPanel::DiffView,
            FocusPanel::DiffView => FocusPanel::FileList,
        };
        self.dirty = true;
    }

    pub fn toggle_full_file(&mut self) {
        let outcome = self.view.toggle_full_file_view(&self.backend);
        self.report_toggle(outcome);
    }

    fn report_toggle(&mut self, outcome: ToggleOutcome) {
        self.message = match outcome {
            ToggleOutcome::Entered => Some("Full file view".to_string()),
            ToggleOutcome::Exited => Some("Diff view".to_string()),
            ToggleOutcome::Fetching => Some("Loading full file...".to_string()),
            ToggleOutcome::Unavailable => Some("Full file view unavailable".to_string()),
        };
        self.dirty = true;
    }

    /// Start a hunk command on the current hunk.
    pub fn start_hunk_command(&mut self, intent: HunkIntent) {
        self.dirty = true;
        if self.is_busy() {
            self.message = Some("Still applying the previous hunk".to_string());
            return;
        }
        let hunk_index = self.view.status().current_hunk;
        match self.view.hunk_command(intent, &self.backend) {
            Ok(request) => {
                self.pending_apply = Some(PendingApply {
                    request,
                    intent,
                    hunk_index: hunk_index.unwrap_or(0),
                });
            }
            Err(e) => self.message = Some(format!("Cannot {intent}: {e}")),
        }
    }

    /// Drain finished background work. Returns `Some` when an apply landed
    /// and the caller should reload the file list.
    pub fn poll_background(&mut self) -> Option<ApplyFinished> {
        if let Some(outcome) = self.view.poll() {
            if outcome == ToggleOutcome::Unavailable {
                self.message = Some("Could not load the full file".to_string());
                self.dirty = true;
            } else {
                self.report_toggle(outcome);
            }
        }

        let pending = self.pending_apply.as_ref()?;
        let applied = match pending.request.poll() {
            RequestStatus::Pending => return None,
            RequestStatus::Ready(applied) => applied,
            RequestStatus::Lost => false,
        };
        let pending = self.pending_apply.take()?;
        self.dirty = true;

        // A result for a diff that is no longer on screen only refreshes
        // the file list.
        if !self.view.accepts(pending.request.token()) {
            log::debug!("dropping stale {} result", pending.intent);
            return Some(ApplyFinished {
                applied,
                hunk_index: None,
            });
        }

        self.message = Some(if applied {
            format!("Hunk {}", pending.intent.done_label())
        } else {
            format!("Could not {} hunk: patch did not apply", pending.intent)
        });
        Some(ApplyFinished {
            applied,
            hunk_index: Some(pending.hunk_index),
        })
    }

    /// Clear an expired chord and its prompt.
    pub fn tick(&mut self, now: Instant) {
        if self.chord.expire(now) {
            self.message = None;
            self.dirty = true;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> KeyAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return self.handle_control_key(key.code);
        }

        let chord_key = matches!(key.code, KeyCode::Char('g' | 'd'));
        if !chord_key {
            self.chord.reset();
        }
        self.message = None;
        self.dirty = true;

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
            KeyCode::Char('r') => return KeyAction::Refresh,
            KeyCode::Tab => self.toggle_focus(),
            KeyCode::Enter | KeyCode::Char('l') if self.focus == FocusPanel::FileList => {
                self.focus = FocusPanel::DiffView;
            }
            KeyCode::Char('h') if self.focus == FocusPanel::DiffView => {
                self.focus = FocusPanel::FileList;
            }
            KeyCode::Char('j') | KeyCode::Down => match self.focus {
                FocusPanel::FileList => self.select_next_file(),
                FocusPanel::DiffView => {
                    self.view.scroll_by(1);
                }
            },
            KeyCode::Char('k') | KeyCode::Up => match self.focus {
                FocusPanel::FileList => self.select_prev_file(),
                FocusPanel::DiffView => {
                    self.view.scroll_by(-1);
                }
            },
            KeyCode::PageDown | KeyCode::Char(' ') => {
                self.view.page_down();
            }
            KeyCode::PageUp => {
                self.view.page_up();
            }
            KeyCode::Char('n') | KeyCode::Char(']') => {
                self.view.next_hunk();
            }
            KeyCode::Char('p') | KeyCode::Char('[') => {
                self.view.previous_hunk();
            }
            KeyCode::Char('g') => {
                if self.chord.feed('g', now) {
                    self.view.go_to_top();
                }
            }
            KeyCode::Char('G') | KeyCode::End => self.view.go_to_bottom(),
            KeyCode::Home => self.view.go_to_top(),
            KeyCode::Char('f') => self.toggle_full_file(),
            KeyCode::Char('s') => self.start_hunk_command(HunkIntent::Stage),
            KeyCode::Char('u') => self.start_hunk_command(HunkIntent::Unstage),
            KeyCode::Char('d') => {
                if self.chord.feed('d', now) {
                    self.start_hunk_command(HunkIntent::Discard);
                } else {
                    self.message = Some("Press d again to discard this hunk".to_string());
                }
            }
            _ => {}
        }
        KeyAction::Continue
    }

    fn handle_control_key(&mut self, code: KeyCode) -> KeyAction {
        self.chord.reset();
        self.dirty = true;
        match code {
            KeyCode::Char('c') => return KeyAction::Quit,
            KeyCode::Char('d') => {
                self.view.page_down();
            }
            KeyCode::Char('u') => {
                self.view.page_up();
            }
            _ => {}
        }
        KeyAction::Continue
    }

    /// Handle a mouse click at the given coordinates.
    pub fn handle_mouse_click(&mut self, column: u16, row: u16) {
        let area = self.file_list_area;
        if area.contains(Position::new(column, row)) {
            // +1 for the border, row within the list content
            let idx = row.saturating_sub(area.y + 1) as usize;
            if idx < self.files.len() {
                self.focus = FocusPanel::FileList;
                if idx != self.selected_file {
                    self.selected_file = idx;
                    self.load_selected();
                }
                self.dirty = true;
            }
            return;
        }

        let area = self.diff_view_area;
        if area.contains(Position::new(column, row)) && row > area.y {
            let clicked = (row - area.y - 1) as usize;
            if let Some(line) = self.view.line_at_row(clicked) {
                self.focus = FocusPanel::DiffView;
                self.view.scroll_to_line(line);
                self.dirty = true;
            }
        }
    }
}

/// Guard that restores terminal state on drop (including panics).
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableMouseCapture,
        );
    }
}

fn reload_files(app: &mut App, repo: &Repository, hunk_index: Option<usize>) {
    match git::list_changed_files(repo) {
        Ok(files) => app.set_files(files, hunk_index),
        Err(e) => {
            log::warn!("listing changed files failed: {e:#}");
            app.message = Some(format!("Refresh error: {e}"));
            app.dirty = true;
        }
    }
}

/// Run the TUI application until the user quits.
pub fn run(repo: &Repository, files: Vec<ChangedFile>, options: AppOptions) -> Result<()> {
    let backend: Arc<dyn GitBackend> = Arc::new(git::GitCli::for_repo(repo)?);

    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture,
    )?;

    // Guard ensures terminal is restored even on panic
    let _guard = TerminalGuard;

    let terminal_backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(terminal_backend)?;

    let mut app = App::new(files, backend, options);
    let highlighter = Highlighter::new();

    loop {
        if app.dirty {
            terminal.draw(|frame| {
                ui::render(frame, &mut app, &highlighter);
            })?;
            app.dirty = false;
        }

        if let Some(done) = app.poll_background() {
            reload_files(&mut app, repo, done.hunk_index);
        }
        app.tick(Instant::now());

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => match app.handle_key(key, Instant::now()) {
                KeyAction::Quit => break,
                KeyAction::Refresh => {
                    let hunk_index = app.view.status().current_hunk;
                    reload_files(&mut app, repo, hunk_index);
                    app.message = Some("Refreshed".to_string());
                }
                KeyAction::Continue => {}
            },
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollDown => {
                    app.view.scroll_by(3);
                    app.dirty = true;
                }
                MouseEventKind::ScrollUp => {
                    app.view.scroll_by(-3);
                    app.dirty = true;
                }
                MouseEventKind::Down(MouseButton::Left) => {
                    app.handle_mouse_click(mouse.column, mouse.row);
                }
                _ => {}
            },
            Event::Resize(_, _) => {
                app.dirty = true;
            }
            _ => {}
        }
    }

    Ok(())
}
