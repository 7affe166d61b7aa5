use crate::stroke::StrokeRef;

/// One version of the committed stroke list.
pub type StrokeList = Vec<StrokeRef>;

/// Manages the version log of the committed stroke list for undo/redo
///
/// Every entry is a full snapshot of the list. Entry 0 is always the empty
/// baseline, so undo can never reach past a clear.
#[derive(Debug, Clone)]
pub struct StrokeHistory {
    snapshots: Vec<StrokeList>,
    cursor: usize,
}

impl Default for StrokeHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl StrokeHistory {
    /// Creates a history holding only the empty baseline
    pub fn new() -> Self {
        Self {
            snapshots: vec![StrokeList::new()],
            cursor: 0,
        }
    }

    /// Record a new version, discarding anything that could have been redone
    pub fn push(&mut self, state: StrokeList) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(state);
        self.cursor = self.snapshots.len() - 1;
    }

    /// Step back one version. Returns `None` at the baseline.
    pub fn undo(&mut self) -> Option<&StrokeList> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Step forward one version. Returns `None` at the newest version.
    pub fn redo(&mut self) -> Option<&StrokeList> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Drop every version and return to the empty baseline
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.snapshots.push(StrokeList::new());
        self.cursor = 0;
    }

    pub fn current(&self) -> &StrokeList {
        &self.snapshots[self.cursor]
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Number of stored versions, baseline included
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        // The baseline is always present
        false
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::Stroke;
    use egui::{pos2, Color32};

    fn list_of(n: usize) -> StrokeList {
        (0..n)
            .map(|i| {
                Stroke::new_ref(
                    vec![pos2(i as f32, 0.0), pos2(i as f32, 10.0)],
                    Color32::RED,
                    3,
                    false,
                )
            })
            .collect()
    }

    #[test]
    fn test_new_history_is_baseline() {
        let history = StrokeHistory::new();
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
        assert!(history.current().is_empty());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_at_baseline_is_noop() {
        let mut history = StrokeHistory::new();
        assert!(history.undo().is_none());
        assert_eq!(history.cursor(), 0);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_redo_at_end_is_noop() {
        let mut history = StrokeHistory::new();
        history.push(list_of(1));
        assert!(history.redo().is_none());
        assert_eq!(history.cursor(), 1);
    }

    #[test]
    fn test_push_truncates_forward_history() {
        let mut history = StrokeHistory::new();
        history.push(list_of(1));
        history.push(list_of(2));
        history.push(list_of(3));

        history.undo();
        history.undo();
        assert_eq!(history.current().len(), 1);

        history.push(list_of(4));
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
        assert!(history.redo().is_none());
        assert_eq!(history.current().len(), 4);
    }

    #[test]
    fn test_clear_resets_to_baseline() {
        let mut history = StrokeHistory::new();
        history.push(list_of(1));
        history.push(list_of(2));
        history.clear();

        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
        assert!(history.current().is_empty());
        assert!(history.undo().is_none());
    }
}
