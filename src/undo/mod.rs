use serde::Serialize;
use std::collections::VecDeque;

/// Default number of snapshots kept before the oldest is dropped
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Linear undo/redo log of full text snapshots.
///
/// Invariants: there is always at least one snapshot, and
/// `0 <= current_index < entries.len()`. Pushing after an undo discards the
/// redo branch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryStack {
    entries: VecDeque<String>,
    current_index: usize,
    /// Maximum number of snapshots to keep
    max_entries: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl HistoryStack {
    /// Create a history holding only the empty-string baseline
    pub fn new(max_entries: usize) -> Self {
        Self::with_baseline(String::new(), max_entries)
    }

    pub fn with_baseline(text: impl Into<String>, max_entries: usize) -> Self {
        let mut entries = VecDeque::new();
        entries.push_back(text.into());
        Self {
            entries,
            current_index: 0,
            max_entries: max_entries.max(1),
        }
    }

    /// Rebuild a history from persisted parts, clamping a bad index and
    /// substituting the baseline for an empty list
    pub fn from_parts(entries: Vec<String>, index: usize, max_entries: usize) -> Self {
        if entries.is_empty() {
            return Self::new(max_entries);
        }

        let mut entries: VecDeque<String> = entries.into();
        let mut current_index = index.min(entries.len() - 1);
        let max_entries = max_entries.max(1);
        while entries.len() > max_entries {
            entries.pop_front();
            current_index = current_index.saturating_sub(1);
        }

        Self {
            entries,
            current_index,
            max_entries,
        }
    }

    /// Record a new snapshot, truncating any redo entries first
    pub fn push(&mut self, text: impl Into<String>) {
        self.entries.truncate(self.current_index + 1);
        self.entries.push_back(text.into());
        self.current_index = self.entries.len() - 1;

        // Enforce max size
        if self.entries.len() > self.max_entries {
            self.entries.pop_front();
            self.current_index -= 1;
        }
    }

    /// Step back one snapshot; `None` when already at the oldest
    pub fn undo(&mut self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.current_index -= 1;
        Some(&self.entries[self.current_index])
    }

    /// Step forward one snapshot; `None` when already at the newest
    pub fn redo(&mut self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.current_index += 1;
        Some(&self.entries[self.current_index])
    }

    /// Replace the whole history with a single snapshot
    pub fn reset(&mut self, text: impl Into<String>) {
        self.entries.clear();
        self.entries.push_back(text.into());
        self.current_index = 0;
    }

    pub fn current(&self) -> &str {
        &self.entries[self.current_index]
    }

    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: every constructor and mutation keeps at least one
    /// snapshot
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Get the number of available undo steps
    pub fn undo_count(&self) -> usize {
        self.current_index
    }

    /// Get the number of available redo steps
    pub fn redo_count(&self) -> usize {
        self.entries.len() - 1 - self.current_index
    }
}
