//! Linear undo/redo history over full layer-stack snapshots.
//!
//! ## Usage
//!
//! ```text
//! 1. pointer-down:  history.begin(&stack)
//! 2. pointer-move:  history.commit(&mut stack, next, false)   // live only
//! 3. pointer-up:    history.commit(&mut stack, next, true)    // one entry
//! ```
//!
//! A drag of any length therefore produces a single undo step, and a drag
//! that ends where it started produces none.

use crate::LayerStack;

/// Default maximum number of snapshots kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Undo/redo stack of layer snapshots with a cursor.
#[derive(Debug, Clone)]
pub struct History {
    /// Snapshots, oldest first. Never empty.
    entries: Vec<LayerStack>,
    /// Index of the snapshot matching the live stack.
    cursor: usize,
    /// Stack captured by [`History::begin`] for the in-flight interaction.
    pending: Option<LayerStack>,
    /// Maximum number of snapshots kept.
    limit: usize,
}

impl History {
    /// Create a history whose first entry is `initial`.
    #[must_use]
    pub fn new(initial: &LayerStack) -> Self {
        Self::with_limit(initial, DEFAULT_HISTORY_LIMIT)
    }

    /// Create a history with a custom entry limit (at least 1).
    #[must_use]
    pub fn with_limit(initial: &LayerStack, limit: usize) -> Self {
        Self {
            entries: vec![initial.clone()],
            cursor: 0,
            pending: None,
            limit: limit.max(1),
        }
    }

    /// Record the current stack as the baseline of an in-flight interaction.
    pub fn begin(&mut self, stack: &LayerStack) {
        self.pending = Some(stack.clone());
    }

    /// Baseline captured by the last [`History::begin`], if still pending.
    #[must_use]
    pub fn baseline(&self) -> Option<&LayerStack> {
        self.pending.as_ref()
    }

    /// Whether an interaction baseline is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Replace the live stack with `next`, recording an entry when final.
    ///
    /// A non-final commit only updates `live`. A final commit compares `next`
    /// against the pending baseline (or the snapshot at the cursor when no
    /// interaction is pending); if they differ the redo branch is discarded
    /// and `next` is appended. Returns `true` if an entry was recorded.
    pub fn commit(&mut self, live: &mut LayerStack, next: LayerStack, is_final: bool) -> bool {
        *live = next;
        if !is_final {
            return false;
        }
        self.record(live)
    }

    /// Final commit of the stack as it currently is.
    ///
    /// Returns `true` if an entry was recorded.
    pub fn record(&mut self, stack: &LayerStack) -> bool {
        let baseline = self
            .pending
            .take()
            .unwrap_or_else(|| self.entries[self.cursor].clone());
        if baseline == *stack {
            tracing::debug!("History commit skipped: stack unchanged");
            return false;
        }

        self.entries.truncate(self.cursor + 1);
        self.entries.push(stack.clone());
        self.cursor = self.entries.len() - 1;

        if self.entries.len() > self.limit {
            self.entries.remove(0);
            self.cursor -= 1;
        }

        tracing::debug!(
            "History entry recorded ({} of {})",
            self.cursor + 1,
            self.entries.len()
        );
        true
    }

    /// Drop a pending baseline without recording anything.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Step back one entry, returning the snapshot to restore.
    pub fn undo(&mut self) -> Option<&LayerStack> {
        if !self.can_undo() {
            return None;
        }
        self.pending = None;
        self.cursor -= 1;
        Some(&self.entries[self.cursor])
    }

    /// Step forward one entry, returning the snapshot to restore.
    pub fn redo(&mut self) -> Option<&LayerStack> {
        if !self.can_redo() {
            return None;
        }
        self.pending = None;
        self.cursor += 1;
        Some(&self.entries[self.cursor])
    }

    /// Whether [`History::undo`] would do anything.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Whether [`History::redo`] would do anything.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Number of snapshots, including the initial one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: the initial snapshot is never dropped below one entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current cursor position.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Forget every entry and start over from `stack`.
    pub fn reset(&mut self, stack: &LayerStack) {
        self.entries = vec![stack.clone()];
        self.cursor = 0;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Layer, ShapeKind};

    fn with_layer(stack: &LayerStack) -> LayerStack {
        let mut next = stack.clone();
        next.push_top(Layer::shape(ShapeKind::Rectangle, "#000"));
        next
    }

    #[test]
    fn undo_redo_roundtrip() {
        let mut live = LayerStack::new();
        let mut history = History::new(&live);

        let s0 = live.clone();
        history.begin(&live);
        let s1 = with_layer(&live);
        assert!(history.commit(&mut live, s1.clone(), true));

        history.begin(&live);
        let s2 = with_layer(&live);
        assert!(history.commit(&mut live, s2.clone(), true));

        live = history.undo().expect("undo").clone();
        assert_eq!(live, s1);
        live = history.undo().expect("undo").clone();
        assert_eq!(live, s0);
        assert!(history.undo().is_none());

        live = history.redo().expect("redo").clone();
        assert_eq!(live, s1);
        live = history.redo().expect("redo").clone();
        assert_eq!(live, s2);
        assert!(history.redo().is_none());
    }

    #[test]
    fn non_final_commits_do_not_record() {
        let mut live = LayerStack::new();
        let mut history = History::new(&live);
        history.begin(&live);
        for _ in 0..25 {
            let next = with_layer(&LayerStack::new());
            assert!(!history.commit(&mut live, next, false));
        }
        assert_eq!(history.len(), 1);
        let last = live.clone();
        assert!(history.commit(&mut live, last, true));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn unchanged_commit_is_skipped() {
        let mut live = with_layer(&LayerStack::new());
        let mut history = History::new(&live);
        history.begin(&live);
        let same = live.clone();
        assert!(!history.commit(&mut live, same, true));
        assert!(!history.can_undo());
        assert!(!history.is_pending());
    }

    #[test]
    fn edit_after_undo_discards_redo_branch() {
        let mut live = LayerStack::new();
        let mut history = History::new(&live);
        let s1 = with_layer(&live);
        history.commit(&mut live, s1, true);
        let s2 = with_layer(&live);
        history.commit(&mut live, s2, true);

        live = history.undo().expect("undo").clone();
        assert!(history.can_redo());

        let branch = with_layer(&LayerStack::new());
        history.commit(&mut live, branch.clone(), true);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(live, branch);
    }

    #[test]
    fn limit_drops_oldest() {
        let mut live = LayerStack::new();
        let mut history = History::with_limit(&live, 3);
        for _ in 0..5 {
            let next = with_layer(&live);
            history.commit(&mut live, next, true);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
        assert!(history.undo().is_some());
        assert!(history.undo().is_some());
        assert!(history.undo().is_none());
    }
}
