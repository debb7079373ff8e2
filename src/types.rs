use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Which side of the index a file's diff was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffSide {
    /// Index to working tree (`git diff`).
    Unstaged,
    /// HEAD to index (`git diff --cached`).
    Staged,
}

/// Maps to git2 status bits we care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
    Untracked,
}

/// A file with changes on one side of the index.
///
/// A file that is partially staged shows up twice, once per side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: PathBuf,
    pub side: DiffSide,
    pub status: DeltaStatus,
}

impl ChangedFile {
    pub fn new(path: impl Into<PathBuf>, side: DiffSide, status: DeltaStatus) -> Self {
        Self {
            path: path.into(),
            side,
            status,
        }
    }
}

/// What the user wants done with a single hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkIntent {
    Stage,
    Unstage,
    Discard,
}

impl fmt::Display for DiffSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffSide::Unstaged => write!(f, "unstaged"),
            DiffSide::Staged => write!(f, "staged"),
        }
    }
}

impl fmt::Display for HunkIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HunkIntent::Stage => write!(f, "stage"),
            HunkIntent::Unstage => write!(f, "unstage"),
            HunkIntent::Discard => write!(f, "discard"),
        }
    }
}

impl HunkIntent {
    /// Past-tense verb used in status messages.
    pub fn done_label(self) -> &'static str {
        match self {
            HunkIntent::Stage => "staged",
            HunkIntent::Unstage => "unstaged",
            HunkIntent::Discard => "discarded",
        }
    }
}

/// Line numbers from a `@@ -a,b +c,d @@` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRange {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
}

/// One independently appliable change region of a [`DiffDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// Position among the document's hunks.
    pub index: usize,
    /// Absolute line holding the `@@` header.
    pub start_line: usize,
    /// Absolute last line of the hunk body (inclusive).
    pub end_line: usize,
    /// Preamble plus this hunk's header and body, newline-terminated.
    pub patch: String,
    /// Parsed header numbers, `None` when the header is not well formed.
    pub range: Option<HunkRange>,
}

impl Hunk {
    pub fn contains_line(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}

/// The parsed representation of one file's diff.
///
/// Built once by [`crate::patch::parse_document`] and never mutated; any
/// change in content produces a new document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffDocument {
    pub full_text: String,
    pub lines: Arc<[String]>,
    /// Number of lines before the first `@@` header.
    pub preamble_len: usize,
    pub hunks: Vec<Hunk>,
}

impl DiffDocument {
    pub fn empty() -> Self {
        Self {
            full_text: String::new(),
            lines: Arc::from(Vec::new()),
            preamble_len: 0,
            hunks: Vec::new(),
        }
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn preamble(&self) -> &[String] {
        &self.lines[..self.preamble_len]
    }

    /// The captured lines (header and body) of hunk `index`.
    pub fn hunk_lines(&self, index: usize) -> Option<&[String]> {
        self.hunks
            .get(index)
            .map(|h| &self.lines[h.start_line..=h.end_line])
    }

    /// The hunk whose range contains the absolute line, if any.
    pub fn hunk_at_line(&self, line: usize) -> Option<&Hunk> {
        self.hunks.iter().find(|h| h.contains_line(line))
    }
}

/// Classification of a raw diff line for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    FileHeader,
    HunkHeader,
    Context,
    Added,
    Removed,
    /// `\ No newline at end of file`
    NoNewline,
}

/// Which panel is focused in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPanel {
    FileList,
    DiffView,
}
