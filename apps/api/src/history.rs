// History Manager
// Per-page undo/redo over serialized page snapshots. Callers checkpoint explicitly after
// each mutation. Restoring goes straight through `load_from_serializable`, so the
// clear-and-rebuild is never recorded as a mutation of its own.

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::surface::DrawingSurface;

#[derive(Debug, Clone, Default)]
pub struct HistoryManager {
    /// Past states, newest last. The first entry is the undo floor.
    undo_stack: Vec<Value>,
    redo_stack: Vec<Value>,
}

impl HistoryManager {
    /// Starts a history whose floor is the page's current state.
    pub fn new<S: DrawingSurface + ?Sized>(page: &S) -> Self {
        let mut history = Self::default();
        history.checkpoint(page);
        history
    }

    /// Records the page's current state. Returns false when it equals the latest snapshot.
    pub fn checkpoint<S: DrawingSurface + ?Sized>(&mut self, page: &S) -> bool {
        let snapshot = page.to_serializable();
        if self.undo_stack.last() == Some(&snapshot) {
            debug!("Skipping duplicate history snapshot");
            return false;
        }
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();
        true
    }

    /// Steps back one snapshot. No-op at the floor. The stacks only move once the page
    /// has been restored.
    pub fn undo<S: DrawingSurface + ?Sized>(&mut self, page: &mut S) -> bool {
        let [.., previous, _] = self.undo_stack.as_slice() else {
            warn!("No more undo actions available");
            return false;
        };
        if !restore(page, previous) {
            return false;
        }
        if let Some(current) = self.undo_stack.pop() {
            self.redo_stack.push(current);
        }
        true
    }

    pub fn redo<S: DrawingSurface + ?Sized>(&mut self, page: &mut S) -> bool {
        let Some(next) = self.redo_stack.last() else {
            warn!("No more redo actions available");
            return false;
        };
        if !restore(page, next) {
            return false;
        }
        if let Some(next) = self.redo_stack.pop() {
            self.undo_stack.push(next);
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len().saturating_sub(1)
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}

fn restore<S: DrawingSurface + ?Sized>(page: &mut S, snapshot: &Value) -> bool {
    match page.load_from_serializable(snapshot) {
        Ok(()) => true,
        Err(e) => {
            // Snapshots come from `to_serializable`, so this means the page type changed.
            error!(error = %e, "Failed to restore history snapshot");
            false
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Canvas, Point, TextStyle};

    fn add_text(page: &mut Canvas, text: &str, y: f32) {
        let id = page.create_text(text, TextStyle::default(), 300.0, Point::new(50.0, y));
        page.add(id);
    }

    /// Initial empty snapshot plus `n - 1` mutations.
    fn history_with(n: usize) -> (Canvas, HistoryManager, Vec<Value>) {
        let mut page = Canvas::new(800.0, 1100.0);
        let mut history = HistoryManager::new(&page);
        let mut states = vec![page.to_serializable()];
        for i in 1..n {
            add_text(&mut page, &format!("item {i}"), 50.0 * i as f32);
            assert!(history.checkpoint(&page));
            states.push(page.to_serializable());
        }
        (page, history, states)
    }

    #[test]
    fn test_undo_n_minus_one_restores_initial_snapshot() {
        let (mut page, mut history, states) = history_with(4);
        for _ in 0..3 {
            assert!(history.undo(&mut page));
        }
        assert_eq!(page.to_serializable(), states[0]);
        assert!(!history.can_undo());

        // Floor reached: further undo is a no-op.
        assert!(!history.undo(&mut page));
        assert_eq!(page.to_serializable(), states[0]);
    }

    #[test]
    fn test_redo_n_minus_one_restores_final_state() {
        let (mut page, mut history, states) = history_with(4);
        while history.undo(&mut page) {}
        for _ in 0..3 {
            assert!(history.redo(&mut page));
        }
        assert_eq!(page.to_serializable(), states[3]);
        assert!(!history.redo(&mut page));
    }

    #[test]
    fn test_each_undo_steps_back_one_state() {
        let (mut page, mut history, states) = history_with(3);
        history.undo(&mut page);
        assert_eq!(page.to_serializable(), states[1]);
        history.redo(&mut page);
        assert_eq!(page.to_serializable(), states[2]);
    }

    #[test]
    fn test_duplicate_checkpoint_is_discarded() {
        let (page, mut history, _) = history_with(2);
        assert!(!history.checkpoint(&page));
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn test_new_mutation_clears_redo() {
        let (mut page, mut history, _) = history_with(3);
        history.undo(&mut page);
        assert!(history.can_redo());
        add_text(&mut page, "branch", 500.0);
        history.checkpoint(&page);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_checkpoint_after_restore_keeps_redo() {
        let (mut page, mut history, _) = history_with(3);
        history.undo(&mut page);
        // The restored page equals the top snapshot, so this is not a new mutation.
        assert!(!history.checkpoint(&page));
        assert_eq!(history.redo_depth(), 1);
    }

    fn unloadable() -> Value {
        serde_json::json!({"version": 99, "width": 1.0, "height": 1.0, "objects": []})
    }

    #[test]
    fn test_failed_undo_leaves_history_and_page_untouched() {
        let (mut page, mut history, states) = history_with(3);
        history.undo_stack[1] = unloadable();
        assert!(!history.undo(&mut page));
        assert_eq!(history.undo_depth(), 2);
        assert_eq!(history.redo_depth(), 0);
        assert_eq!(page.to_serializable(), states[2]);
    }

    #[test]
    fn test_failed_redo_leaves_history_untouched() {
        let (mut page, mut history, states) = history_with(3);
        assert!(history.undo(&mut page));
        history.redo_stack[0] = unloadable();
        assert!(!history.redo(&mut page));
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.redo_depth(), 1);
        assert_eq!(page.to_serializable(), states[1]);
    }
}
