#![allow(dead_code)]

use git2::{Repository, Signature};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create a temporary git repository with an initial commit.
pub fn create_temp_repo() -> (TempDir, Repository) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let repo = Repository::init(dir.path()).expect("Failed to init repo");

    // Create initial commit so HEAD exists
    {
        let mut index = repo.index().unwrap();
        let tree_oid = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_oid).unwrap();
        let sig = Signature::now("Test", "test@test.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
            .unwrap();
    }

    (dir, repo)
}

/// Add and commit a file to the repository.
pub fn commit_file(repo: &Repository, path: &str, content: &str) {
    write_file(repo, path, content);
    stage_file(repo, path);

    let mut index = repo.index().unwrap();
    let tree_oid = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_oid).unwrap();
    let sig = Signature::now("Test", "test@test.com").unwrap();

    let head = repo.head().unwrap();
    let parent_commit = head.peel_to_commit().unwrap();

    repo.commit(
        Some("HEAD"),
        &sig,
        &sig,
        &format!("Add {}", path),
        &tree,
        &[&parent_commit],
    )
    .unwrap();
}

/// Write a file in the working directory (without staging).
pub fn write_file(repo: &Repository, path: &str, content: &str) {
    let workdir = repo.workdir().expect("Not a bare repo");
    let full_path = workdir.join(path);

    // Create parent directories if needed
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }

    fs::write(&full_path, content).unwrap();
}

/// Stage the working tree version of a file, like `git add`.
pub fn stage_file(repo: &Repository, path: &str) {
    let mut index = repo.index().unwrap();
    index.read(true).unwrap();
    index.add_path(Path::new(path)).unwrap();
    index.write().unwrap();
}

/// Delete a tracked file from the working directory.
pub fn delete_file(repo: &Repository, path: &str) {
    let workdir = repo.workdir().expect("Not a bare repo");
    fs::remove_file(workdir.join(path)).unwrap();
}

/// Current working tree content of a file.
pub fn read_workdir(repo: &Repository, path: &str) -> String {
    let workdir = repo.workdir().expect("Not a bare repo");
    fs::read_to_string(workdir.join(path)).unwrap()
}

/// Content of a file as recorded in the index, `None` when it has no entry.
pub fn read_index(repo: &Repository, path: &str) -> Option<String> {
    let mut index = repo.index().unwrap();
    // git itself may have rewritten the index behind libgit2's back.
    index.read(true).unwrap();
    let entry = index.get_path(Path::new(path), 0)?;
    let blob = repo.find_blob(entry.id).unwrap();
    Some(String::from_utf8(blob.content().to_vec()).unwrap())
}

/// "line 1\n" .. "line N\n"
pub fn numbered_lines(count: usize) -> String {
    (1..=count).map(|i| format!("line {i}\n")).collect()
}

/// `numbered_lines(count)` with the given 1-based lines replaced.
pub fn numbered_lines_with(count: usize, edits: &[(usize, &str)]) -> String {
    (1..=count)
        .map(|i| match edits.iter().find(|(n, _)| *n == i) {
            Some((_, text)) => format!("{text}\n"),
            None => format!("line {i}\n"),
        })
        .collect()
}
