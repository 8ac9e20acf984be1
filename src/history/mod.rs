//! Snapshot-based undo/redo for the block editor.
//!
//! Snapshots are full deep copies of the document, not diffs: decks are
//! small and the stacks are capped, so the simple scheme stays cheap.
//!
//! Text edits are coalesced: the first keystroke of a burst captures the
//! pre-burst state as a pending snapshot, and the editor layer pushes it via
//! [`History::flush_pending`] once the typist has been idle for
//! [`TEXT_DEBOUNCE_MS`]. The `History` type itself is synchronous; timers
//! live with the caller.

use crate::models::Document;

pub(crate) const MAX_STACK_SIZE: usize = 50;
pub(crate) const TEXT_DEBOUNCE_MS: i32 = 500;

#[derive(Clone, Debug)]
pub(crate) struct HistoryEntry {
    pub blocks: Document,
    pub label: String,
}

#[derive(Default)]
pub(crate) struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    pending_text_snapshot: Option<Document>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all history, e.g. when a new card enters edit mode.
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pending_text_snapshot = None;
    }

    fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);
        while self.undo_stack.len() > MAX_STACK_SIZE {
            self.undo_stack.remove(0);
        }
    }

    /// Commit the pending text snapshot, if any, as a regular undo entry.
    pub fn flush_pending(&mut self) {
        if let Some(blocks) = self.pending_text_snapshot.take() {
            self.redo_stack.clear();
            self.push_undo(HistoryEntry {
                blocks,
                label: "text edit".to_string(),
            });
        }
    }

    /// Snapshot before a discrete structural operation (insert, delete,
    /// reorder, alignment, resize).
    pub fn save_state(&mut self, blocks: &Document, label: &str) {
        self.flush_pending();
        self.redo_stack.clear();
        self.push_undo(HistoryEntry {
            blocks: blocks.clone(),
            label: label.to_string(),
        });
    }

    /// Record a keystroke-level change. Only the first call of a burst
    /// captures state; the caller restarts its idle timer on every call and
    /// invokes [`flush_pending`](Self::flush_pending) when it fires.
    pub fn save_text_change(&mut self, blocks: &Document) {
        if self.pending_text_snapshot.is_none() {
            self.pending_text_snapshot = Some(blocks.clone());
        }
    }

    /// Pop the latest snapshot, stashing `current` on the redo stack under
    /// the undone operation's label. Returns `None` when there is nothing
    /// to undo.
    pub fn undo(&mut self, current: &Document) -> Option<Document> {
        self.flush_pending();

        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(HistoryEntry {
            blocks: current.clone(),
            label: entry.label,
        });
        Some(entry.blocks)
    }

    /// Inverse of [`undo`](Self::undo); no pending flush here.
    pub fn redo(&mut self, current: &Document) -> Option<Document> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push(HistoryEntry {
            blocks: current.clone(),
            label: entry.label,
        });
        Some(entry.blocks)
    }

    /// True when an undo would change state (a pending text snapshot counts).
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty() || self.pending_text_snapshot.is_some()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, BlockData, BlockKind};

    fn doc(contents: &[&str]) -> Document {
        contents
            .iter()
            .map(|c| {
                let mut b = Block::new(BlockKind::Text);
                if let BlockData::Text { content, .. } = &mut b.data {
                    *content = (*c).to_string();
                }
                b
            })
            .collect()
    }

    #[test]
    fn test_undo_redo_cycle_restores_exact_documents() {
        let mut history = History::new();
        let v1 = doc(&["one"]);
        let v2 = doc(&["one", "two"]);

        history.save_state(&v1, "insert block");
        assert!(history.can_undo());
        assert!(!history.can_redo());

        let restored = history.undo(&v2).expect("one entry to undo");
        assert_eq!(restored, v1);
        assert!(history.can_redo());

        let replayed = history.redo(&restored).expect("one entry to redo");
        assert_eq!(replayed, v2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_underflow_is_a_silent_noop() {
        let mut history = History::new();
        let current = doc(&["x"]);
        assert!(history.undo(&current).is_none());
        assert!(history.redo(&current).is_none());
    }

    #[test]
    fn test_new_save_clears_redo() {
        let mut history = History::new();
        let v1 = doc(&["a"]);
        let v2 = doc(&["b"]);

        history.save_state(&v1, "edit");
        let _ = history.undo(&v2);
        assert!(history.can_redo());

        history.save_state(&v1, "another edit");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_stack_capped_at_50_oldest_evicted() {
        let mut history = History::new();
        for i in 0..60 {
            history.save_state(&doc(&[&format!("v{i}")]), "edit");
        }

        let mut undone = 0;
        let current = doc(&["current"]);
        let mut last = None;
        while let Some(blocks) = history.undo(&current) {
            last = Some(blocks);
            undone += 1;
        }
        assert_eq!(undone, MAX_STACK_SIZE);

        // Oldest surviving snapshot is v10; v0..v9 were evicted.
        let oldest = last.expect("at least one undo");
        match &oldest[0].data {
            BlockData::Text { content, .. } => assert_eq!(content, "v10"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_text_burst_coalesces_into_one_entry() {
        let mut history = History::new();
        let before = doc(&["start"]);

        // N keystrokes within the debounce window: only the first captures.
        history.save_text_change(&before);
        history.save_text_change(&doc(&["s"]));
        history.save_text_change(&doc(&["st"]));
        assert!(history.can_undo());

        history.flush_pending();

        let current = doc(&["stop"]);
        let restored = history.undo(&current).expect("flushed burst entry");
        assert_eq!(restored, before);
        assert!(history.undo(&restored).is_none());
    }

    #[test]
    fn test_two_bursts_produce_two_entries() {
        let mut history = History::new();
        let v1 = doc(&["a"]);
        let v2 = doc(&["ab"]);

        history.save_text_change(&v1);
        history.flush_pending();

        history.save_text_change(&v2);
        history.flush_pending();

        let current = doc(&["abc"]);
        assert_eq!(history.undo(&current), Some(v2));
        assert_eq!(history.undo(&doc(&["ab"])), Some(v1));
    }

    #[test]
    fn test_undo_flushes_pending_first() {
        let mut history = History::new();
        let before = doc(&["before typing"]);

        history.save_text_change(&before);

        // Undo mid-burst: the pending snapshot becomes the undo target.
        let current = doc(&["before typingX"]);
        let restored = history.undo(&current).expect("pending snapshot flushed");
        assert_eq!(restored, before);
    }

    #[test]
    fn test_discrete_save_flushes_pending_as_separate_entry() {
        let mut history = History::new();
        let typed_from = doc(&["a"]);
        let structural_from = doc(&["a", "b"]);

        history.save_text_change(&typed_from);
        history.save_state(&structural_from, "insert block");

        let current = doc(&["a", "b", "c"]);
        assert_eq!(history.undo(&current), Some(structural_from));
        assert_eq!(history.undo(&doc(&["a", "b"])), Some(typed_from));
    }
}
