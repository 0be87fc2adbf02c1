// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Linear undo log with named split points. Undo/redo move a cursor across
//! split boundaries; a tree was deliberately not used (the observable
//! behavior is linear).

/// One reversible mutation, with the point position on both sides so undo
/// restores the cursor exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOp {
    Insert {
        at: usize,
        text: String,
        cursor_before: usize,
        cursor_after: usize,
    },
    Delete {
        at: usize,
        text: String,
        cursor_before: usize,
        cursor_after: usize,
    },
    /// Composite entry recorded by atomic edit groups: the whole buffer
    /// before and after, as one undoable unit.
    Replace {
        old_text: String,
        new_text: String,
        cursor_before: usize,
        cursor_after: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UndoEntry {
    Op(UndoOp),
    Split,
}

/// Append-mostly log of [`UndoOp`]s. `position` counts applied entries; undo
/// walks it backward one split group at a time, redo walks it forward. New
/// edits truncate any redo tail.
#[derive(Debug, Default)]
pub struct UndoLog {
    entries: Vec<UndoEntry>,
    position: usize,
    enabled: bool,
}

impl UndoLog {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: Vec::new(),
            position: 0,
            enabled,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool { self.enabled }

    /// When disabled, nothing is ever appended (the log stays empty).
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.entries.clear();
            self.position = 0;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn record(&mut self, op: UndoOp) {
        if !self.enabled {
            return;
        }
        self.entries.truncate(self.position);
        self.entries.push(UndoEntry::Op(op));
        self.position = self.entries.len();
    }

    /// Marks a logical boundary. Consecutive splits collapse to one.
    pub fn split(&mut self) {
        if !self.enabled {
            return;
        }
        self.entries.truncate(self.position);
        if matches!(self.entries.last(), None | Some(UndoEntry::Split)) {
            return;
        }
        self.entries.push(UndoEntry::Split);
        self.position = self.entries.len();
    }

    /// Pops one split group of ops to be reverted, most recent first.
    /// Returns an empty vec when there is nothing left to undo.
    pub fn start_undo(&mut self) -> Vec<UndoOp> {
        let mut ops = Vec::new();
        // Skip the boundary that closed the group.
        while self.position > 0 && matches!(self.entries[self.position - 1], UndoEntry::Split) {
            self.position -= 1;
        }
        while self.position > 0 {
            match &self.entries[self.position - 1] {
                UndoEntry::Split => break,
                UndoEntry::Op(op) => {
                    ops.push(op.clone());
                    self.position -= 1;
                }
            }
        }
        ops
    }

    /// Replays one split group of ops forward. Returns an empty vec when
    /// there is nothing left to redo.
    pub fn start_redo(&mut self) -> Vec<UndoOp> {
        let mut ops = Vec::new();
        while self.position < self.entries.len()
            && matches!(self.entries[self.position], UndoEntry::Split)
        {
            self.position += 1;
        }
        while self.position < self.entries.len() {
            match &self.entries[self.position] {
                UndoEntry::Split => break,
                UndoEntry::Op(op) => {
                    ops.push(op.clone());
                    self.position += 1;
                }
            }
        }
        ops
    }

    /// Scrubs recorded text with NUL before release (masked sessions).
    pub fn zero_out(&mut self) {
        for entry in &mut self.entries {
            if let UndoEntry::Op(op) = entry {
                match op {
                    UndoOp::Insert { text, .. } | UndoOp::Delete { text, .. } => {
                        *text = "\0".repeat(text.chars().count());
                    }
                    UndoOp::Replace { old_text, new_text, .. } => {
                        *old_text = "\0".repeat(old_text.chars().count());
                        *new_text = "\0".repeat(new_text.chars().count());
                    }
                }
            }
        }
        self.entries.clear();
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_op(at: usize, text: &str) -> UndoOp {
        UndoOp::Insert {
            at,
            text: text.into(),
            cursor_before: at,
            cursor_after: at + text.chars().count(),
        }
    }

    #[test]
    fn test_disabled_log_stays_empty() {
        let mut log = UndoLog::new(false);
        log.record(insert_op(0, "abc"));
        log.split();
        assert!(log.is_empty());
        assert!(log.start_undo().is_empty());
    }

    #[test]
    fn test_undo_groups_by_split() {
        let mut log = UndoLog::new(true);
        log.record(insert_op(0, "a"));
        log.record(insert_op(1, "b"));
        log.split();
        log.record(insert_op(2, "c"));

        // Most recent group first: just "c".
        let group = log.start_undo();
        assert_eq!(group.len(), 1);
        // Next group: "b" then "a" (reverse order).
        let group = log.start_undo();
        assert_eq!(group.len(), 2);
        assert!(matches!(&group[0], UndoOp::Insert { text, .. } if text == "b"));
        assert!(log.start_undo().is_empty());
    }

    #[test]
    fn test_redo_replays_forward() {
        let mut log = UndoLog::new(true);
        log.record(insert_op(0, "a"));
        log.split();
        log.record(insert_op(1, "b"));

        log.start_undo();
        log.start_undo();
        let group = log.start_redo();
        assert!(matches!(&group[0], UndoOp::Insert { text, .. } if text == "a"));
        let group = log.start_redo();
        assert!(matches!(&group[0], UndoOp::Insert { text, .. } if text == "b"));
        assert!(log.start_redo().is_empty());
    }

    #[test]
    fn test_new_edit_truncates_redo_tail() {
        let mut log = UndoLog::new(true);
        log.record(insert_op(0, "a"));
        log.split();
        log.record(insert_op(1, "b"));
        log.start_undo();
        log.record(insert_op(1, "x"));
        // The "b" entry is gone; undo yields "x" then "a".
        let group = log.start_undo();
        assert!(matches!(&group[0], UndoOp::Insert { text, .. } if text == "x"));
    }
}
