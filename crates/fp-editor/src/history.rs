//! Undo/redo history.
//!
//! A linear list of full document snapshots. `entries[0]` is the state the
//! history was opened on; `index` points at the entry matching the live
//! document. Committing truncates any redo entries, drops the oldest entry
//! beyond the limit, and merges into the previous entry when the same
//! description repeats inside the merge window.

use crate::selection::Selection;
use fp_core::id::EntityId;
use fp_core::model::FloorSet;

/// Labels starting with one of these always open a new entry.
pub const FORCED_PREFIXES: &[&str] = &[
    "Create",
    "Delete",
    "Paste",
    "Duplicate",
    "Edit vertex",
    "Edit segment",
];

pub fn is_forced(description: &str) -> bool {
    FORCED_PREFIXES.iter().any(|p| description.starts_with(p))
}

/// What a history entry restores: floors, the current floor, and selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub floors: FloorSet,
    pub current_floor_id: Option<EntityId>,
    pub selection: Selection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub snapshot: Document,
    pub description: String,
    pub timestamp_ms: u64,
}

pub struct History {
    entries: Vec<HistoryEntry>,
    index: usize,
    limit: usize,
    merge_window_ms: u64,
}

impl History {
    pub fn new(initial: Document, limit: usize, merge_window_ms: u64) -> Self {
        Self {
            entries: vec![HistoryEntry {
                snapshot: initial,
                description: "Open".to_string(),
                timestamp_ms: 0,
            }],
            index: 0,
            limit: limit.max(1),
            merge_window_ms,
        }
    }

    /// Record `doc` as the result of `description` at time `now_ms`.
    pub fn commit(&mut self, doc: Document, description: impl Into<String>, now_ms: u64) {
        let description = description.into();
        let truncated = self.index + 1 < self.entries.len();
        self.entries.truncate(self.index + 1);

        if !truncated && self.index > 0 && !is_forced(&description) {
            let window = self.merge_window_ms;
            if let Some(last) = self.entries.last_mut()
                && last.description == description
                && now_ms.saturating_sub(last.timestamp_ms) < window
            {
                log::debug!("history: merged '{description}'");
                last.snapshot = doc;
                last.timestamp_ms = now_ms;
                return;
            }
        }

        log::debug!("history: commit '{description}'");
        self.entries.push(HistoryEntry {
            snapshot: doc,
            description,
            timestamp_ms: now_ms,
        });
        if self.entries.len() > self.limit {
            self.entries.remove(0);
        }
        self.index = self.entries.len() - 1;
    }

    /// Step back; returns the document to restore, or `None` at the start.
    pub fn undo(&mut self) -> Option<&Document> {
        if self.index == 0 {
            return None;
        }
        log::debug!("history: undo '{}'", self.entries[self.index].description);
        self.index -= 1;
        Some(&self.entries[self.index].snapshot)
    }

    /// Step forward; returns the document to restore, or `None` at the end.
    pub fn redo(&mut self) -> Option<&Document> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        log::debug!("history: redo '{}'", self.entries[self.index].description);
        Some(&self.entries[self.index].snapshot)
    }

    /// Forget everything and start over from `initial`.
    pub fn reset(&mut self, initial: Document) {
        self.entries.clear();
        self.entries.push(HistoryEntry {
            snapshot: initial,
            description: "Open".to_string(),
            timestamp_ms: 0,
        });
        self.index = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Description of the entry undo would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.can_undo()
            .then(|| self.entries[self.index].description.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_core::model::Floor;

    fn doc(name: &str) -> Document {
        let floor = Floor::new(EntityId::intern("hist_floor"), name);
        Document {
            floors: FloorSet {
                floors: vec![floor],
            },
            current_floor_id: Some(EntityId::intern("hist_floor")),
            selection: Selection::new(),
        }
    }

    #[test]
    fn forced_labels() {
        assert!(is_forced("Create room"));
        assert!(is_forced("Edit vertex"));
        assert!(!is_forced("Move room"));
    }

    #[test]
    fn merge_within_window() {
        let mut h = History::new(doc("a"), 50, 500);
        h.commit(doc("b"), "Move room", 1_000);
        h.commit(doc("c"), "Move room", 1_400);
        assert_eq!(h.len(), 2);
        h.commit(doc("d"), "Move room", 2_000);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn forced_labels_never_merge() {
        let mut h = History::new(doc("a"), 50, 500);
        h.commit(doc("b"), "Create room", 1_000);
        h.commit(doc("c"), "Create room", 1_001);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn commit_after_undo_truncates_redo() {
        let mut h = History::new(doc("a"), 50, 500);
        h.commit(doc("b"), "Create room", 0);
        h.commit(doc("c"), "Create room", 0);
        assert_eq!(h.undo().map(|d| d.floors.floors[0].name.clone()), Some("b".into()));
        h.commit(doc("d"), "Create wall", 0);
        assert!(!h.can_redo());
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn boundaries_are_noops() {
        let mut h = History::new(doc("a"), 50, 500);
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        assert_eq!(h.index(), 0);
    }

    #[test]
    fn oldest_entry_dropped_at_limit() {
        let mut h = History::new(doc("a"), 3, 500);
        for i in 0..5 {
            h.commit(doc(&format!("n{i}")), "Create room", i);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.index(), 2);
        assert_eq!(h.entries()[0].snapshot.floors.floors[0].name, "n2");
    }
}
