// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The edit buffer: an ordered sequence of code points with a cursor, an
//! optional mark, and an undo log. All index arguments are clamped to
//! `[0, len]`; a clamped call is logged and proceeds rather than panicking.

use crate::{UndoLog, UndoOp};
use std::ops::Range;
use tracing::warn;

/// Kind of region between cursor and mark.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RegionType {
    #[default]
    None,
    Char,
    Line,
    Paste,
}

#[derive(Debug)]
pub struct Buffer {
    chars: Vec<char>,
    cursor: usize,
    mark: Option<usize>,
    region_type: RegionType,
    overwrite: bool,
    undo: UndoLog,
    atomic_depth: usize,
}

impl Buffer {
    #[must_use]
    pub fn new(undo_enabled: bool) -> Self {
        Self {
            chars: Vec::new(),
            cursor: 0,
            mark: None,
            region_type: RegionType::None,
            overwrite: false,
            undo: UndoLog::new(undo_enabled),
            atomic_depth: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize { self.chars.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.chars.is_empty() }

    #[must_use]
    pub fn cursor(&self) -> usize { self.cursor }

    #[must_use]
    pub fn chars(&self) -> &[char] { &self.chars }

    #[must_use]
    pub fn char_at(&self, idx: usize) -> Option<char> { self.chars.get(idx).copied() }

    #[must_use]
    pub fn as_string(&self) -> String { self.chars.iter().collect() }

    #[must_use]
    pub fn mark(&self) -> Option<usize> { self.mark }

    #[must_use]
    pub fn region_type(&self) -> RegionType { self.region_type }

    #[must_use]
    pub fn is_overwrite(&self) -> bool { self.overwrite }

    pub fn set_overwrite(&mut self, overwrite: bool) { self.overwrite = overwrite; }

    pub fn set_region_type(&mut self, region_type: RegionType) {
        self.region_type = region_type;
    }

    pub fn undo_log(&mut self) -> &mut UndoLog { &mut self.undo }

    fn clamp(&self, idx: usize, what: &str) -> usize {
        if idx > self.chars.len() {
            warn!(index = idx, len = self.chars.len(), op = what, "buffer index clamped");
            self.chars.len()
        } else {
            idx
        }
    }

    fn clamp_range(&self, range: Range<usize>, what: &str) -> Range<usize> {
        let start = self.clamp(range.start, what);
        let end = self.clamp(range.end.max(start), what);
        start..end
    }

    /// Moves the cursor. Movement is not undoable on its own; the positions
    /// around mutations are captured by the ops themselves.
    pub fn move_to(&mut self, to: usize) {
        self.cursor = self.clamp(to, "move_to");
    }

    pub fn set_mark(&mut self) {
        self.mark = Some(self.cursor);
        if self.region_type == RegionType::None {
            self.region_type = RegionType::Char;
        }
    }

    pub fn clear_mark(&mut self) {
        self.mark = None;
        self.region_type = RegionType::None;
    }

    /// Returns false when no mark is set.
    pub fn swap_point_and_mark(&mut self) -> bool {
        match self.mark {
            Some(mark) => {
                self.mark = Some(self.cursor);
                self.cursor = self.clamp(mark, "swap_point_and_mark");
                true
            }
            None => false,
        }
    }

    /// Inserts at the cursor. In overwrite mode, replaces as many code
    /// points as it writes (except at end of line, where it appends).
    pub fn insert(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.overwrite {
            let count = text.chars().count();
            let end = (self.cursor + count).min(self.chars.len());
            self.replace(self.cursor..end, text);
            return;
        }
        let at = self.cursor;
        let cursor_before = self.cursor;
        let incoming: Vec<char> = text.chars().collect();
        self.chars.splice(at..at, incoming.iter().copied());
        self.cursor = at + incoming.len();
        self.record(UndoOp::Insert {
            at,
            text: text.to_string(),
            cursor_before,
            cursor_after: self.cursor,
        });
    }

    /// Deletes `len` code points starting at `i`; returns the removed text.
    pub fn delete_at(&mut self, i: usize, len: usize) -> String {
        let range = self.clamp_range(i..i.saturating_add(len), "delete_at");
        if range.is_empty() {
            return String::new();
        }
        let cursor_before = self.cursor;
        let removed: String = self.chars.splice(range.clone(), std::iter::empty()).collect();
        self.cursor = if self.cursor > range.start {
            range.start.max(self.cursor.saturating_sub(removed.chars().count()))
        } else {
            self.cursor
        };
        // Deleting before the cursor lands the cursor at the cut point.
        if cursor_before >= range.start && cursor_before <= range.start + removed.chars().count() {
            self.cursor = range.start;
        }
        self.record(UndoOp::Delete {
            at: range.start,
            text: removed.clone(),
            cursor_before,
            cursor_after: self.cursor,
        });
        removed
    }

    /// Non-destructive read of a range.
    #[must_use]
    pub fn substring(&self, range: Range<usize>) -> String {
        let range = self.clamp_range(range, "substring");
        self.chars[range].iter().collect()
    }

    /// Alias for [`Self::substring`]; named for the copy-to-kill path.
    #[must_use]
    pub fn copy(&self, range: Range<usize>) -> String { self.substring(range) }

    /// Removes and returns a range.
    pub fn cut(&mut self, range: Range<usize>) -> String {
        let range = self.clamp_range(range, "cut");
        self.delete_at(range.start, range.end - range.start)
    }

    /// Replaces a range with new text, cursor left after the insertion.
    pub fn replace(&mut self, range: Range<usize>, text: &str) {
        let range = self.clamp_range(range, "replace");
        let cursor_before = self.cursor;
        let removed: String = self.chars[range.clone()].iter().collect();
        let incoming: Vec<char> = text.chars().collect();
        let new_cursor = range.start + incoming.len();
        self.chars.splice(range.clone(), incoming.iter().copied());
        self.cursor = self.clamp(new_cursor, "replace");
        self.record(UndoOp::Replace {
            old_text: removed,
            new_text: text.to_string(),
            cursor_before,
            cursor_after: self.cursor,
        });
    }

    fn record(&mut self, op: UndoOp) {
        if self.atomic_depth == 0 {
            self.undo.record(op);
        }
    }

    /// Runs `f` as one undoable unit: individual ops inside are not logged;
    /// a single composite entry covering the whole change is.
    pub fn edit_atomically<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let old_text = self.as_string();
        let cursor_before = self.cursor;
        self.atomic_depth += 1;
        let result = f(self);
        self.atomic_depth -= 1;
        if self.atomic_depth == 0 {
            let new_text = self.as_string();
            if new_text != old_text {
                self.undo.split();
                self.undo.record(UndoOp::Replace {
                    old_text,
                    new_text,
                    cursor_before,
                    cursor_after: self.cursor,
                });
                self.undo.split();
            }
        }
        result
    }

    /// Marks an undo boundary.
    pub fn split_undo(&mut self) { self.undo.split(); }

    /// Reverts one undo group. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let ops = self.undo.start_undo();
        if ops.is_empty() {
            return false;
        }
        for op in ops {
            self.apply_inverse(&op);
        }
        true
    }

    /// Replays one undone group. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let ops = self.undo.start_redo();
        if ops.is_empty() {
            return false;
        }
        for op in ops {
            self.apply_forward(&op);
        }
        true
    }

    fn apply_inverse(&mut self, op: &UndoOp) {
        match op {
            UndoOp::Insert { at, text, cursor_before, .. } => {
                let count = text.chars().count();
                self.chars.drain(*at..(*at + count).min(self.chars.len()));
                self.cursor = (*cursor_before).min(self.chars.len());
            }
            UndoOp::Delete { at, text, cursor_before, .. } => {
                let incoming: Vec<char> = text.chars().collect();
                let at = (*at).min(self.chars.len());
                self.chars.splice(at..at, incoming);
                self.cursor = (*cursor_before).min(self.chars.len());
            }
            UndoOp::Replace { old_text, cursor_before, .. } => {
                self.chars = old_text.chars().collect();
                self.cursor = (*cursor_before).min(self.chars.len());
            }
        }
    }

    fn apply_forward(&mut self, op: &UndoOp) {
        match op {
            UndoOp::Insert { at, text, cursor_after, .. } => {
                let incoming: Vec<char> = text.chars().collect();
                let at = (*at).min(self.chars.len());
                self.chars.splice(at..at, incoming);
                self.cursor = (*cursor_after).min(self.chars.len());
            }
            UndoOp::Delete { at, text, cursor_after, .. } => {
                let count = text.chars().count();
                let at = (*at).min(self.chars.len());
                self.chars.drain(at..(at + count).min(self.chars.len()));
                self.cursor = (*cursor_after).min(self.chars.len());
            }
            UndoOp::Replace { new_text, cursor_after, .. } => {
                self.chars = new_text.chars().collect();
                self.cursor = (*cursor_after).min(self.chars.len());
            }
        }
    }

    /// Start of the logical line containing `idx` (after the previous `\n`).
    #[must_use]
    pub fn line_start(&self, idx: usize) -> usize {
        let idx = idx.min(self.chars.len());
        self.chars[..idx]
            .iter()
            .rposition(|&c| c == '\n')
            .map_or(0, |p| p + 1)
    }

    /// End of the logical line containing `idx` (index of the next `\n`, or
    /// the buffer length).
    #[must_use]
    pub fn line_end(&self, idx: usize) -> usize {
        let idx = idx.min(self.chars.len());
        self.chars[idx..]
            .iter()
            .position(|&c| c == '\n')
            .map_or(self.chars.len(), |p| idx + p)
    }

    /// Replaces the whole content, recording a single composite op.
    pub fn set_text(&mut self, text: &str) {
        let len = self.chars.len();
        self.replace(0..len, text);
    }

    /// Overwrites content with NUL then clears (masked sessions).
    pub fn zero_out(&mut self) {
        for ch in &mut self.chars {
            *ch = '\0';
        }
        self.chars.clear();
        self.cursor = 0;
        self.mark = None;
        self.undo.zero_out();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn buffer_with(text: &str) -> Buffer {
        let mut buf = Buffer::new(true);
        buf.insert(text);
        buf
    }

    #[test]
    fn test_insert_moves_cursor() {
        let mut buf = Buffer::new(true);
        buf.insert("hello");
        assert_eq!(buf.as_string(), "hello");
        assert_eq!(buf.cursor(), 5);
        buf.move_to(0);
        buf.insert("ab");
        assert_eq!(buf.as_string(), "abhello");
        assert_eq!(buf.cursor(), 2);
    }

    #[test]
    fn test_overwrite_mode_replaces() {
        let mut buf = buffer_with("abcdef");
        buf.move_to(1);
        buf.set_overwrite(true);
        buf.insert("XY");
        assert_eq!(buf.as_string(), "aXYdef");
        assert_eq!(buf.cursor(), 3);
    }

    #[test]
    fn test_delete_at_adjusts_cursor() {
        let mut buf = buffer_with("hello world");
        buf.move_to(11);
        let removed = buf.delete_at(5, 6);
        assert_eq!(removed, " world");
        assert_eq!(buf.as_string(), "hello");
        assert_eq!(buf.cursor(), 5);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let mut buf = buffer_with("abc");
        buf.move_to(999);
        assert_eq!(buf.cursor(), 3);
        assert_eq!(buf.substring(1..999), "bc");
        let removed = buf.delete_at(2, 999);
        assert_eq!(removed, "c");
    }

    #[test]
    fn test_cut_and_replace() {
        let mut buf = buffer_with("one two three");
        let cut = buf.cut(4..8);
        assert_eq!(cut, "two ");
        assert_eq!(buf.as_string(), "one three");
        buf.replace(0..3, "ONE");
        assert_eq!(buf.as_string(), "ONE three");
        assert_eq!(buf.cursor(), 3);
    }

    #[test]
    fn test_mark_and_swap() {
        let mut buf = buffer_with("hello");
        buf.move_to(1);
        buf.set_mark();
        buf.move_to(4);
        assert!(buf.swap_point_and_mark());
        assert_eq!(buf.cursor(), 1);
        assert_eq!(buf.mark(), Some(4));
        buf.clear_mark();
        assert!(!buf.swap_point_and_mark());
    }

    #[test]
    fn test_undo_redo_exact_inverse() {
        let mut buf = Buffer::new(true);
        buf.insert("hello world");
        buf.split_undo();
        buf.move_to(6);
        buf.delete_at(6, 5);
        assert_eq!(buf.as_string(), "hello ");

        assert!(buf.undo());
        assert_eq!(buf.as_string(), "hello world");
        assert_eq!(buf.cursor(), 6);

        assert!(buf.redo());
        assert_eq!(buf.as_string(), "hello ");
        assert_eq!(buf.cursor(), 6);
    }

    #[test]
    fn test_undo_disabled_keeps_log_empty() {
        let mut buf = Buffer::new(false);
        buf.insert("abc");
        buf.split_undo();
        assert!(buf.undo_log().is_empty());
        assert!(!buf.undo());
    }

    #[test]
    fn test_edit_atomically_is_one_undo_unit() {
        let mut buf = buffer_with("abc");
        buf.split_undo();
        buf.edit_atomically(|buf| {
            buf.move_to(3);
            buf.insert("d");
            buf.insert("e");
            buf.insert("f");
        });
        assert_eq!(buf.as_string(), "abcdef");
        assert!(buf.undo());
        assert_eq!(buf.as_string(), "abc");
        assert!(buf.redo());
        assert_eq!(buf.as_string(), "abcdef");
    }

    #[test]
    fn test_line_start_end_multiline() {
        let buf = buffer_with("one\ntwo\nthree");
        assert_eq!(buf.line_start(5), 4);
        assert_eq!(buf.line_end(5), 7);
        assert_eq!(buf.line_start(2), 0);
        assert_eq!(buf.line_end(10), 13);
    }

    #[test]
    fn test_cursor_bounds_invariant() {
        let mut buf = buffer_with("hello");
        buf.delete_at(0, 5);
        assert!(buf.cursor() <= buf.len());
        buf.insert("x");
        assert!(buf.cursor() <= buf.len());
    }

    #[test]
    fn test_zero_out_clears_everything() {
        let mut buf = buffer_with("s3cret");
        buf.set_mark();
        buf.zero_out();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.cursor(), 0);
        assert_eq!(buf.mark(), None);
        assert!(buf.undo_log().is_empty());
    }
}
