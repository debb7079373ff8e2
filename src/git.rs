use anyhow::{Context, Result, bail};
use git2::{Repository, Status, StatusOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::apply::GitBackend;
use crate::types::{ChangedFile, DeltaStatus, DiffSide};

/// Open a git repository at the given path.
pub fn open_repo(path: impl AsRef<Path>) -> Result<Repository> {
    Repository::discover(path.as_ref())
        .context("Failed to open git repository. Are you in a git repo?")
}

/// List every file with staged or unstaged changes.
///
/// A file with changes on both sides appears once per side. Staged entries
/// come first, each group sorted by path.
pub fn list_changed_files(repo: &Repository) -> Result<Vec<ChangedFile>> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .renames_head_to_index(true);

    let statuses = repo
        .statuses(Some(&mut opts))
        .context("Failed to get repo status")?;

    let mut files = Vec::new();
    for entry in statuses.iter() {
        let status = entry.status();
        if status.contains(Status::CONFLICTED) {
            continue;
        }

        let staged_path = entry
            .head_to_index()
            .and_then(|d| d.new_file().path().map(Path::to_path_buf))
            .or_else(|| entry.path().map(PathBuf::from));
        if let Some(delta) = staged_status(status)
            && let Some(path) = staged_path
        {
            files.push(ChangedFile::new(path, DiffSide::Staged, delta));
        }

        if let Some(delta) = unstaged_status(status)
            && let Some(path) = entry.path()
        {
            files.push(ChangedFile::new(path, DiffSide::Unstaged, delta));
        }
    }

    files.sort_by(|a, b| {
        side_order(a.side)
            .cmp(&side_order(b.side))
            .then_with(|| a.path.cmp(&b.path))
    });
    Ok(files)
}

fn side_order(side: DiffSide) -> u8 {
    match side {
        DiffSide::Staged => 0,
        DiffSide::Unstaged => 1,
    }
}

fn staged_status(status: Status) -> Option<DeltaStatus> {
    if status.contains(Status::INDEX_NEW) {
        Some(DeltaStatus::Added)
    } else if status.contains(Status::INDEX_DELETED) {
        Some(DeltaStatus::Deleted)
    } else if status.contains(Status::INDEX_RENAMED) {
        Some(DeltaStatus::Renamed)
    } else if status.intersects(Status::INDEX_MODIFIED | Status::INDEX_TYPECHANGE) {
        Some(DeltaStatus::Modified)
    } else {
        None
    }
}

fn unstaged_status(status: Status) -> Option<DeltaStatus> {
    if status.contains(Status::WT_NEW) {
        Some(DeltaStatus::Untracked)
    } else if status.contains(Status::WT_DELETED) {
        Some(DeltaStatus::Deleted)
    } else if status.contains(Status::WT_RENAMED) {
        Some(DeltaStatus::Renamed)
    } else if status.intersects(Status::WT_MODIFIED | Status::WT_TYPECHANGE) {
        Some(DeltaStatus::Modified)
    } else {
        None
    }
}

/// [`GitBackend`] that runs the `git` executable inside a work tree.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn for_repo(repo: &Repository) -> Result<Self> {
        let workdir = repo.workdir().context("Bare repository not supported")?;
        Ok(Self::new(workdir))
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn run(&self, args: &[String]) -> Result<Output> {
        log::debug!("git {}", args.join(" "));
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .context("Failed to run git")
    }
}

/// Arguments for `git diff` of one file on one side.
pub fn build_diff_args(file: &ChangedFile, context: u32) -> Vec<String> {
    let path = file.path.to_string_lossy().to_string();
    let mut args = vec![
        "diff".to_string(),
        "--no-color".to_string(),
        "--no-ext-diff".to_string(),
        format!("-U{context}"),
    ];

    if file.status == DeltaStatus::Untracked {
        // Untracked files have no index entry to diff against.
        args.extend(["--no-index", "--", "/dev/null"].map(String::from));
    } else {
        if file.side == DiffSide::Staged {
            args.push("--cached".to_string());
        }
        args.push("--".to_string());
    }
    args.push(path);
    args
}

impl GitBackend for GitCli {
    fn diff(&self, file: &ChangedFile, context: u32) -> Result<String> {
        let output = self.run(&build_diff_args(file, context))?;

        // `--no-index` exits with 1 when the files differ.
        let ok = output.status.success()
            || (file.status == DeltaStatus::Untracked && output.status.code() == Some(1));
        if !ok {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git diff failed for {}: {}", file.path.display(), stderr.trim());
        }

        String::from_utf8(output.stdout)
            .with_context(|| format!("Diff of {} is not valid UTF-8", file.path.display()))
    }

    fn apply_patch(&self, patch: &str, args: &[&str]) -> Result<bool> {
        let mut tmpfile = tempfile::Builder::new()
            .prefix("hunkview-")
            .suffix(".patch")
            .tempfile()
            .context("Failed to create temp file")?;
        tmpfile
            .write_all(patch.as_bytes())
            .context("Failed to write patch")?;
        tmpfile.flush()?;

        let mut full: Vec<String> = vec!["apply".to_string()];
        full.extend(args.iter().map(|a| a.to_string()));
        full.push("--whitespace=nowarn".to_string());
        full.push(tmpfile.path().to_string_lossy().to_string());

        let output = self.run(&full)?;
        if !output.status.success() {
            log::debug!(
                "git apply exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.status.success())
    }
}
