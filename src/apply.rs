//! Turning a hunk patch plus an intent into a `git apply` call, and fetching
//! full-context diffs.
//!
//! Both operations shell out to git, so they are also offered as background
//! requests that the UI loop polls without blocking.

use anyhow::Result;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::types::{ChangedFile, HunkIntent};

/// Context lines requested for the full-file view. Large enough that no
/// unchanged line is ever collapsed.
pub const FULL_CONTEXT_LINES: u32 = 1_000_000;

/// The version-control operations the engine needs.
pub trait GitBackend: Send + Sync {
    /// Render the diff of a single file with `context` lines of context.
    fn diff(&self, file: &ChangedFile, context: u32) -> Result<String>;

    /// Run `git apply` with `args` on `patch`. `Ok(false)` means git
    /// rejected the patch; `Err` means git could not be run at all.
    fn apply_patch(&self, patch: &str, args: &[&str]) -> Result<bool>;
}

/// `git apply` flags for each intent.
pub fn apply_args(intent: HunkIntent) -> &'static [&'static str] {
    match intent {
        HunkIntent::Stage => &["--cached"],
        HunkIntent::Unstage => &["--cached", "-R"],
        HunkIntent::Discard => &["-R"],
    }
}

/// Apply a single hunk patch. A rejected or unrunnable patch is `false`.
pub fn apply(backend: &dyn GitBackend, patch: &str, intent: HunkIntent) -> bool {
    match backend.apply_patch(patch, apply_args(intent)) {
        Ok(true) => true,
        Ok(false) => {
            log::warn!("git apply rejected the patch to {intent} a hunk");
            false
        }
        Err(e) => {
            log::warn!("could not run git apply to {intent} a hunk: {e:#}");
            false
        }
    }
}

/// Re-render the file's diff with unlimited context. `None` when git fails
/// or there is nothing to show.
pub fn fetch_full_context(backend: &dyn GitBackend, file: &ChangedFile) -> Option<String> {
    match backend.diff(file, FULL_CONTEXT_LINES) {
        Ok(text) if !text.is_empty() => Some(text),
        Ok(_) => {
            log::debug!("full-context diff of {} is empty", file.path.display());
            None
        }
        Err(e) => {
            log::warn!(
                "full-context diff of {} failed: {e:#}",
                file.path.display()
            );
            None
        }
    }
}

/// Identifies one background request. Later requests get larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Issues request tokens and remembers which of them are still wanted.
#[derive(Debug, Clone, Default)]
pub struct RequestTokens {
    next: u64,
    floor: u64,
}

impl RequestTokens {
    pub fn issue(&mut self) -> RequestToken {
        let token = RequestToken(self.next);
        self.next += 1;
        token
    }

    /// Every token issued so far becomes stale.
    pub fn invalidate(&mut self) {
        self.floor = self.next;
    }

    pub fn is_live(&self, token: RequestToken) -> bool {
        token.0 >= self.floor
    }
}

/// Where a background request stands.
#[derive(Debug, PartialEq, Eq)]
pub enum RequestStatus<T> {
    Pending,
    Ready(T),
    /// The worker went away without answering.
    Lost,
}

/// A request running on a worker thread.
#[derive(Debug)]
pub struct PendingRequest<T> {
    token: RequestToken,
    rx: Receiver<T>,
}

impl<T: Send + 'static> PendingRequest<T> {
    /// Run `work` on a new thread.
    pub fn spawn<F>(token: RequestToken, work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            // The receiver is gone when the request was abandoned.
            let _ = tx.send(work());
        });
        Self { token, rx }
    }
}

impl<T> PendingRequest<T> {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    /// Non-blocking check for the result.
    pub fn poll(&self) -> RequestStatus<T> {
        match self.rx.try_recv() {
            Ok(value) => RequestStatus::Ready(value),
            Err(TryRecvError::Empty) => RequestStatus::Pending,
            Err(TryRecvError::Disconnected) => RequestStatus::Lost,
        }
    }

    /// Block until the worker answers.
    pub fn wait(self) -> Option<T> {
        self.rx.recv().ok()
    }
}

/// Apply `patch` in the background.
pub fn spawn_apply(
    backend: Arc<dyn GitBackend>,
    token: RequestToken,
    patch: String,
    intent: HunkIntent,
) -> PendingRequest<bool> {
    PendingRequest::spawn(token, move || apply(backend.as_ref(), &patch, intent))
}

/// Fetch the full-context diff of `file` in the background.
pub fn spawn_full_context(
    backend: Arc<dyn GitBackend>,
    token: RequestToken,
    file: ChangedFile,
) -> PendingRequest<Option<String>> {
    PendingRequest::spawn(token, move || fetch_full_context(backend.as_ref(), &file))
}
