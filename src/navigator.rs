use crate::types::Hunk;

/// Tracks the current hunk and answers where to scroll for hunk jumps.
///
/// Movement is index based: `next_hunk` always lands on the following hunk no
/// matter where the scroll position happens to be.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HunkNavigator {
    /// Header line of each hunk, in order.
    starts: Vec<usize>,
    current: Option<usize>,
}

impl HunkNavigator {
    pub fn new(hunks: &[Hunk]) -> Self {
        Self {
            starts: hunks.iter().map(|h| h.start_line).collect(),
            current: (!hunks.is_empty()).then_some(0),
        }
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn hunk_count(&self) -> usize {
        self.starts.len()
    }

    /// Header line of the current hunk.
    pub fn current_start(&self) -> Option<usize> {
        self.current.map(|i| self.starts[i])
    }

    /// Advance to the next hunk. Returns its header line, or `None` at the
    /// last hunk.
    pub fn next_hunk(&mut self) -> Option<usize> {
        let current = self.current?;
        if current + 1 >= self.starts.len() {
            return None;
        }
        self.current = Some(current + 1);
        self.current_start()
    }

    /// Step back to the previous hunk. Returns its header line, or `None` at
    /// the first hunk.
    pub fn previous_hunk(&mut self) -> Option<usize> {
        let current = self.current?;
        if current == 0 {
            return None;
        }
        self.current = Some(current - 1);
        self.current_start()
    }

    /// Jump to hunk `index`, clamped to the last hunk.
    pub fn select(&mut self, index: usize) -> Option<usize> {
        if self.starts.is_empty() {
            return None;
        }
        self.current = Some(index.min(self.starts.len() - 1));
        self.current_start()
    }

    pub fn go_to_top(&mut self) {
        self.current = (!self.starts.is_empty()).then_some(0);
    }

    pub fn go_to_bottom(&mut self) {
        self.current = self.starts.len().checked_sub(1);
    }

    /// Follow free scrolling: the current hunk becomes the last one whose
    /// header is at or above `line`. Lines in the preamble select the first.
    pub fn sync_to_line(&mut self, line: usize) {
        if self.starts.is_empty() {
            return;
        }
        let after = self.starts.partition_point(|&start| start <= line);
        self.current = Some(after.saturating_sub(1));
    }
}
