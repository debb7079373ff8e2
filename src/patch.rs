use anyhow::{Result, bail};

use crate::types::{DiffDocument, Hunk, HunkRange, LineKind};

/// Parse a single file's unified diff (as produced by `git diff -- <path>`)
/// into a [`DiffDocument`].
///
/// Lines before the first `@@` line form the preamble. Every `@@` line opens
/// a hunk that runs until the next `@@` line or the end of the text. Each
/// hunk carries a standalone patch made of the preamble plus its own lines,
/// so it can be handed to `git apply` without its siblings.
///
/// A diff without any `@@` line (pure rename, mode change, binary file) is
/// preamble-only and has no hunks. This never fails.
pub fn parse_document(text: &str) -> DiffDocument {
    let lines = split_lines(text);

    let preamble_len = lines
        .iter()
        .position(|l| is_hunk_header(l))
        .unwrap_or(lines.len());

    let starts: Vec<usize> = (preamble_len..lines.len())
        .filter(|&i| is_hunk_header(&lines[i]))
        .collect();

    let preamble = &lines[..preamble_len];
    let hunks = starts
        .iter()
        .enumerate()
        .map(|(index, &start)| {
            let end = starts.get(index + 1).copied().unwrap_or(lines.len()) - 1;
            build_hunk(index, start, end, preamble, &lines[start..=end])
        })
        .collect();

    DiffDocument {
        full_text: text.to_string(),
        lines: lines.into(),
        preamble_len,
        hunks,
    }
}

/// Split on `\n` only. Carriage returns belong to the content of CRLF files
/// and must survive into the hunk patches.
fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n').map(String::from).collect()
}

fn is_hunk_header(line: &str) -> bool {
    line.starts_with("@@")
}

fn build_hunk(index: usize, start: usize, end: usize, preamble: &[String], body: &[String]) -> Hunk {
    let capacity = preamble
        .iter()
        .chain(body)
        .map(|l| l.len() + 1)
        .sum();
    let mut patch = String::with_capacity(capacity);
    for line in preamble.iter().chain(body) {
        patch.push_str(line);
        patch.push('\n');
    }

    Hunk {
        index,
        start_line: start,
        end_line: end,
        patch,
        range: parse_hunk_header(&body[0]).ok(),
    }
}

impl DiffDocument {
    /// Path of the file this diff describes, read from the preamble.
    ///
    /// Prefers the `+++` line, falls back to `---` for deletions and to the
    /// `diff --git` line for diffs without path markers (renames, mode changes).
    pub fn path(&self) -> Option<String> {
        let preamble = self.preamble();

        let marker_path = |prefix: &str| {
            preamble.iter().find_map(|line| {
                let rest = line.strip_prefix(prefix)?;
                let rest = rest.split('\t').next().unwrap_or(rest);
                (rest != "/dev/null").then(|| strip_ab_prefix(rest).to_string())
            })
        };

        marker_path("+++ ")
            .or_else(|| marker_path("--- "))
            .or_else(|| {
                preamble
                    .iter()
                    .find_map(|line| line.strip_prefix("diff --git "))
                    .map(parse_git_header_path)
            })
    }

    /// Classify an absolute line for rendering. Out-of-range lines are context.
    pub fn line_kind(&self, line: usize) -> LineKind {
        if line < self.preamble_len {
            return LineKind::FileHeader;
        }
        match self.lines.get(line) {
            Some(text) if is_hunk_header(text) => LineKind::HunkHeader,
            Some(text) if text.starts_with('+') => LineKind::Added,
            Some(text) if text.starts_with('-') => LineKind::Removed,
            Some(text) if text.starts_with('\\') => LineKind::NoNewline,
            _ => LineKind::Context,
        }
    }

    /// Count of (added, removed) lines across all hunks.
    pub fn change_counts(&self) -> (usize, usize) {
        (self.preamble_len..self.lines.len()).fold((0, 0), |(added, removed), i| {
            match self.line_kind(i) {
                LineKind::Added => (added + 1, removed),
                LineKind::Removed => (added, removed + 1),
                _ => (added, removed),
            }
        })
    }
}

/// Parse the path from the git diff header "a/path b/path".
/// Handles paths with spaces by splitting on " b/".
fn parse_git_header_path(header: &str) -> String {
    if let Some(pos) = header.find(" b/") {
        header[pos + 3..].to_string()
    } else {
        header
            .split_whitespace()
            .last()
            .map(|s| strip_ab_prefix(s).to_string())
            .unwrap_or_else(|| header.to_string())
    }
}

/// Strip "a/" or "b/" prefix from a path.
fn strip_ab_prefix(path: &str) -> &str {
    if let Some(rest) = path.strip_prefix("a/") {
        rest
    } else if let Some(rest) = path.strip_prefix("b/") {
        rest
    } else {
        path
    }
}

/// Parse a hunk header like "@@ -10,5 +10,7 @@ fn foo()".
pub fn parse_hunk_header(line: &str) -> Result<HunkRange> {
    let after_at = line
        .strip_prefix("@@ ")
        .ok_or_else(|| anyhow::anyhow!("Invalid hunk header: {}", line))?;

    let end_at = after_at
        .find(" @@")
        .ok_or_else(|| anyhow::anyhow!("Invalid hunk header: {}", line))?;

    let parts: Vec<&str> = after_at[..end_at].split_whitespace().collect();
    if parts.len() != 2 {
        bail!("Invalid hunk header range: {}", &after_at[..end_at]);
    }

    let old = parts[0]
        .strip_prefix('-')
        .ok_or_else(|| anyhow::anyhow!("Missing old range in: {}", line))?;
    let new = parts[1]
        .strip_prefix('+')
        .ok_or_else(|| anyhow::anyhow!("Missing new range in: {}", line))?;

    let (old_start, old_lines) = parse_range(old)?;
    let (new_start, new_lines) = parse_range(new)?;

    Ok(HunkRange {
        old_start,
        old_lines,
        new_start,
        new_lines,
    })
}

/// Parse a range like "10,5" or "10" (omitted count = 1).
fn parse_range(range: &str) -> Result<(u32, u32)> {
    if let Some((start_s, count_s)) = range.split_once(',') {
        let start: u32 = start_s.parse()?;
        let count: u32 = count_s.parse()?;
        Ok((start, count))
    } else {
        let start: u32 = range.parse()?;
        Ok((start, 1))
    }
}
