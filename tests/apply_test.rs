mod helpers;

use git2::Repository;
use std::sync::Arc;

use hunkview::apply::{GitBackend, apply, fetch_full_context};
use hunkview::controller::{DiffViewController, HunkCommandError};
use hunkview::git::{GitCli, list_changed_files};
use hunkview::patch::parse_document;
use hunkview::types::{ChangedFile, DeltaStatus, DiffDocument, DiffSide, HunkIntent};

const FILE: &str = "notes.txt";

fn original() -> String {
    helpers::numbered_lines(20)
}

fn edited() -> String {
    helpers::numbered_lines_with(20, &[(2, "line 2 changed"), (18, "line 18 changed")])
}

fn unstaged(path: &str) -> ChangedFile {
    ChangedFile::new(path, DiffSide::Unstaged, DeltaStatus::Modified)
}

fn staged(path: &str) -> ChangedFile {
    ChangedFile::new(path, DiffSide::Staged, DeltaStatus::Modified)
}

fn cli_for(repo: &Repository) -> GitCli {
    GitCli::for_repo(repo).unwrap()
}

fn document(cli: &GitCli, file: &ChangedFile) -> DiffDocument {
    parse_document(&cli.diff(file, 3).unwrap())
}

/// Repository with `notes.txt` committed and edited in two far apart places.
fn two_hunk_repo() -> (tempfile::TempDir, Repository) {
    let (dir, repo) = helpers::create_temp_repo();
    helpers::commit_file(&repo, FILE, &original());
    helpers::write_file(&repo, FILE, &edited());
    (dir, repo)
}

#[test]
fn test_unstaged_diff_has_two_hunks() {
    let (_dir, repo) = two_hunk_repo();
    let doc = document(&cli_for(&repo), &unstaged(FILE));

    assert_eq!(doc.hunks.len(), 2);
    assert_eq!(doc.path().as_deref(), Some(FILE));
    assert!(doc.hunks[0].patch.contains("+line 2 changed"));
    assert!(!doc.hunks[0].patch.contains("line 18 changed"));
    assert!(doc.hunks[1].patch.contains("+line 18 changed"));
}

#[test]
fn test_stage_one_of_two_hunks() {
    let (_dir, repo) = two_hunk_repo();
    let cli = cli_for(&repo);
    let doc = document(&cli, &unstaged(FILE));

    assert!(apply(&cli, &doc.hunks[0].patch, HunkIntent::Stage));

    let index = helpers::read_index(&repo, FILE).unwrap();
    assert_eq!(index, helpers::numbered_lines_with(20, &[(2, "line 2 changed")]));
    assert_eq!(helpers::read_workdir(&repo, FILE), edited());

    assert_eq!(document(&cli, &unstaged(FILE)).hunks.len(), 1);
    assert_eq!(document(&cli, &staged(FILE)).hunks.len(), 1);
}

#[test]
fn test_unstage_one_of_two_hunks() {
    let (_dir, repo) = two_hunk_repo();
    helpers::stage_file(&repo, FILE);
    let cli = cli_for(&repo);
    let doc = document(&cli, &staged(FILE));
    assert_eq!(doc.hunks.len(), 2);

    assert!(apply(&cli, &doc.hunks[1].patch, HunkIntent::Unstage));

    let index = helpers::read_index(&repo, FILE).unwrap();
    assert_eq!(index, helpers::numbered_lines_with(20, &[(2, "line 2 changed")]));
    assert_eq!(helpers::read_workdir(&repo, FILE), edited());
}

#[test]
fn test_discard_one_of_two_hunks() {
    let (_dir, repo) = two_hunk_repo();
    let cli = cli_for(&repo);
    let doc = document(&cli, &unstaged(FILE));

    assert!(apply(&cli, &doc.hunks[0].patch, HunkIntent::Discard));

    assert_eq!(
        helpers::read_workdir(&repo, FILE),
        helpers::numbered_lines_with(20, &[(18, "line 18 changed")])
    );
    assert_eq!(helpers::read_index(&repo, FILE).unwrap(), original());
}

#[test]
fn test_stale_patch_is_rejected() {
    let (_dir, repo) = two_hunk_repo();
    let cli = cli_for(&repo);
    let doc = document(&cli, &unstaged(FILE));

    assert!(apply(&cli, &doc.hunks[0].patch, HunkIntent::Stage));
    // The index already holds this change, so the context no longer matches.
    assert!(!apply(&cli, &doc.hunks[0].patch, HunkIntent::Stage));
}

#[test]
fn test_stage_untracked_file() {
    let (_dir, repo) = helpers::create_temp_repo();
    helpers::write_file(&repo, "fresh.txt", "one\ntwo\n");
    let cli = cli_for(&repo);
    let file = ChangedFile::new("fresh.txt", DiffSide::Unstaged, DeltaStatus::Untracked);

    let doc = document(&cli, &file);
    assert_eq!(doc.hunks.len(), 1);
    assert!(apply(&cli, &doc.hunks[0].patch, HunkIntent::Stage));
    assert_eq!(
        helpers::read_index(&repo, "fresh.txt").as_deref(),
        Some("one\ntwo\n")
    );
}

#[test]
fn test_full_context_contains_whole_file() {
    let (_dir, repo) = two_hunk_repo();
    let cli = cli_for(&repo);

    let text = fetch_full_context(&cli, &unstaged(FILE)).unwrap();
    let doc = parse_document(&text);
    assert_eq!(doc.hunks.len(), 1);
    for i in [1, 5, 10, 15, 20] {
        let line = format!(" line {i}");
        assert!(
            doc.lines.iter().any(|l| *l == line),
            "missing {line:?} in full-context diff"
        );
    }
}

#[test]
fn test_full_context_of_clean_file_is_none() {
    let (_dir, repo) = helpers::create_temp_repo();
    helpers::commit_file(&repo, FILE, &original());
    assert_eq!(fetch_full_context(&cli_for(&repo), &unstaged(FILE)), None);
}

#[test]
fn test_list_changed_files_reports_both_sides() {
    let (_dir, repo) = two_hunk_repo();
    let cli = cli_for(&repo);
    let doc = document(&cli, &unstaged(FILE));
    assert!(apply(&cli, &doc.hunks[0].patch, HunkIntent::Stage));
    helpers::write_file(&repo, "fresh.txt", "new\n");

    let files = list_changed_files(&repo).unwrap();
    assert_eq!(
        files,
        vec![
            staged(FILE),
            ChangedFile::new("fresh.txt", DiffSide::Unstaged, DeltaStatus::Untracked),
            unstaged(FILE),
        ]
    );
}

#[test]
fn test_list_changed_files_deleted() {
    let (_dir, repo) = helpers::create_temp_repo();
    helpers::commit_file(&repo, "gone.txt", "bye\n");
    helpers::delete_file(&repo, "gone.txt");

    let files = list_changed_files(&repo).unwrap();
    assert_eq!(
        files,
        vec![ChangedFile::new("gone.txt", DiffSide::Unstaged, DeltaStatus::Deleted)]
    );
}

#[test]
fn test_controller_stage_then_refresh() {
    let (_dir, repo) = two_hunk_repo();
    let backend: Arc<dyn GitBackend> = Arc::new(cli_for(&repo));
    let file = unstaged(FILE);

    let mut view = DiffViewController::default();
    view.show_diff(&backend.diff(&file, 3).unwrap(), file.clone());
    view.next_hunk();

    let request = view.stage_current(&backend).unwrap();
    let token = request.token();
    assert_eq!(request.wait(), Some(true));
    assert!(view.accepts(token));

    view.show_diff(&backend.diff(&file, 3).unwrap(), file);
    assert_eq!(view.status().hunk_count, 1);
    assert!(view.visible_text().contains("+line 2 changed"));
    assert_eq!(
        helpers::read_index(&repo, FILE).unwrap(),
        helpers::numbered_lines_with(20, &[(18, "line 18 changed")])
    );
}

#[test]
fn test_controller_refuses_discard_on_staged_view() {
    let (_dir, repo) = two_hunk_repo();
    helpers::stage_file(&repo, FILE);
    let backend: Arc<dyn GitBackend> = Arc::new(cli_for(&repo));
    let file = staged(FILE);

    let mut view = DiffViewController::default();
    view.show_diff(&backend.diff(&file, 3).unwrap(), file);

    assert!(matches!(
        view.discard_current(&backend),
        Err(HunkCommandError::WrongSide { .. })
    ));
    assert_eq!(helpers::read_workdir(&repo, FILE), edited());
    assert_eq!(helpers::read_index(&repo, FILE).unwrap(), edited());
}
