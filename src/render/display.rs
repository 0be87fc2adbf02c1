// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Differential redraw. The display owns the previously drawn rows; each
//! update diffs them against the desired rows and emits the cheaper of
//! in-place overwrite, erase-to-eol + rewrite, or insert/delete-line block
//! shifts. Two identical updates in a row emit zero bytes.

use crate::{AttrChar, AttributedString, CellPos, CsiSequence};
use std::io::{self, Write};

/// What the terminal under us can do. Everything degrades to relative
/// cursor moves and rewrites when a capability is missing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TermCaps {
    pub cursor_address: bool,
    pub insert_delete_lines: bool,
    pub change_scroll_region: bool,
}

impl Default for TermCaps {
    fn default() -> Self {
        Self {
            cursor_address: true,
            insert_delete_lines: true,
            change_scroll_region: true,
        }
    }
}

#[derive(Debug)]
pub struct Display {
    old_rows: Vec<AttributedString>,
    /// Cursor position within the managed region, tracked across updates.
    cursor: CellPos,
    caps: TermCaps,
    /// Set when a write failed; the next update repaints everything.
    dirty: bool,
}

impl Display {
    #[must_use]
    pub fn new(caps: TermCaps) -> Self {
        Self {
            old_rows: Vec::new(),
            cursor: CellPos { row: 0, col: 0 },
            caps,
            dirty: false,
        }
    }

    #[must_use]
    pub fn caps(&self) -> TermCaps { self.caps }

    #[must_use]
    pub fn row_count(&self) -> usize { self.old_rows.len() }

    /// Forgets drawn state; the next update repaints from scratch without
    /// moving through stale coordinates.
    pub fn reset(&mut self) {
        self.old_rows.clear();
        self.cursor = CellPos { row: 0, col: 0 };
    }

    /// Marks the display dirty (failed flush): full repaint next tick.
    pub fn mark_dirty(&mut self) { self.dirty = true; }

    /// Moves the cursor just past the drawn region and forgets drawn state.
    /// Used when a line is accepted and the caller's output takes over.
    pub fn park_below(&mut self, term: &mut dyn Write) -> io::Result<()> {
        let last = self.old_rows.len().saturating_sub(1);
        if self.cursor.row < last {
            write!(term, "\u{1b}[{}B", last - self.cursor.row)?;
        }
        term.write_all(b"\r\n")?;
        self.reset();
        Ok(())
    }

    /// Moves to region origin and erases everything below, leaving a clean
    /// slate (used before printing foreign text above the prompt).
    pub fn clear_region(&mut self, term: &mut dyn Write) -> io::Result<()> {
        self.move_cursor_to(term, CellPos { row: 0, col: 0 })?;
        write!(term, "{}", CsiSequence::EraseToEndOfScreen)?;
        self.old_rows.clear();
        Ok(())
    }

    /// Reconciles the screen with `new_rows`, then parks the cursor at
    /// `target`. Emits nothing when nothing changed.
    pub fn update(
        &mut self,
        new_rows: &[AttributedString],
        target: CellPos,
        term: &mut dyn Write,
        flush: bool,
    ) -> io::Result<()> {
        if self.dirty {
            self.dirty = false;
            self.clear_region(term)?;
        }

        if self.old_rows.as_slice() != new_rows {
            self.try_block_shift(new_rows, term)?;
            let row_count = self.old_rows.len().max(new_rows.len());
            for row in 0..row_count {
                let empty = AttributedString::new();
                let old = self.old_rows.get(row).unwrap_or(&empty).clone();
                let new = new_rows.get(row).unwrap_or(&empty);
                if &old != new {
                    self.update_row(row, &old, new, term)?;
                }
            }
            self.old_rows = new_rows.to_vec();
        }

        if self.cursor != target {
            self.move_cursor_to(term, target)?;
        }
        if flush {
            term.flush()?;
        }
        Ok(())
    }

    /// Detects rows inserted at or removed from the top of the region (the
    /// shape scrolling produces) and shifts them with IL/DL instead of
    /// rewriting every row.
    fn try_block_shift(
        &mut self,
        new_rows: &[AttributedString],
        term: &mut dyn Write,
    ) -> io::Result<()> {
        if !self.caps.insert_delete_lines || self.old_rows.is_empty() || new_rows.is_empty() {
            return Ok(());
        }
        // Old rows reappear lower: insert blank lines at the top.
        let max_shift = new_rows.len().saturating_sub(self.old_rows.len()).min(4);
        for shift in 1..=max_shift {
            if new_rows[shift..shift + self.old_rows.len()] == self.old_rows[..] {
                self.move_cursor_to(term, CellPos { row: 0, col: 0 })?;
                write!(term, "{}", CsiSequence::InsertLines(shift as u16))?;
                let mut shifted = vec![AttributedString::new(); shift];
                shifted.extend(self.old_rows.drain(..));
                self.old_rows = shifted;
                return Ok(());
            }
        }
        // Old rows reappear higher: delete lines at the top.
        let max_shift = self.old_rows.len().saturating_sub(new_rows.len()).min(4);
        for shift in 1..=max_shift {
            if self.old_rows[shift..] == new_rows[..self.old_rows.len() - shift] {
                self.move_cursor_to(term, CellPos { row: 0, col: 0 })?;
                write!(term, "{}", CsiSequence::DeleteLines(shift as u16))?;
                self.old_rows.drain(..shift);
                return Ok(());
            }
        }
        Ok(())
    }

    /// Rewrites only the changed middle of a row: common prefix and suffix
    /// cells are left alone; a shrinking row is erased to end of line.
    fn update_row(
        &mut self,
        row: usize,
        old: &AttributedString,
        new: &AttributedString,
        term: &mut dyn Write,
    ) -> io::Result<()> {
        let old_cells = old.cells();
        let new_cells = new.cells();

        let prefix = common_prefix(old_cells, new_cells);
        let suffix = common_suffix(&old_cells[prefix..], &new_cells[prefix..]);

        let old_middle_end = old_cells.len() - suffix;
        let new_middle_end = new_cells.len() - suffix;

        let start_col: u16 = new_cells[..prefix].iter().map(|cell| cell.width).sum();
        self.move_cursor_to(term, CellPos { row, col: start_col })?;

        let middle = new.slice(prefix, new_middle_end);
        middle.emit(term)?;
        self.cursor.col = start_col + middle.width();

        let old_tail_width: u16 = old_cells[prefix..old_middle_end].iter().map(|c| c.width).sum();
        if suffix > 0 {
            // The shared suffix sits at a different column when the middle
            // width changed; rewrite it in place after the middle.
            if middle.width() != old_tail_width {
                let tail = new.slice(new_middle_end, new_cells.len());
                tail.emit(term)?;
                self.cursor.col += tail.width();
                if old.width() > new.width() {
                    write!(term, "{}", CsiSequence::EraseToEndOfLine)?;
                }
            }
        } else if old_tail_width > middle.width() {
            write!(term, "{}", CsiSequence::EraseToEndOfLine)?;
        }
        Ok(())
    }

    /// Relative cursor movement (CUU/CUD + CHA); the prompt region's
    /// absolute screen row is unknown, so `cursor_address` is reserved for
    /// the status region.
    fn move_cursor_to(&mut self, term: &mut dyn Write, target: CellPos) -> io::Result<()> {
        if self.cursor == target {
            return Ok(());
        }
        if target.row < self.cursor.row {
            write!(term, "\u{1b}[{}A", self.cursor.row - target.row)?;
        } else if target.row > self.cursor.row {
            // CUD does not scroll; emit newlines when moving beyond drawn
            // rows so the terminal allocates them.
            if target.row >= self.old_rows.len().max(1) {
                write!(term, "\r{}", "\n".repeat(target.row - self.cursor.row))?;
                self.cursor.col = 0;
            } else {
                write!(term, "\u{1b}[{}B", target.row - self.cursor.row)?;
            }
        }
        if target.col != self.cursor.col {
            write!(term, "\u{1b}[{}G", target.col + 1)?;
        } else if target.row != self.cursor.row && self.cursor.col != 0 && target.col == 0 {
            write!(term, "\r")?;
        }
        self.cursor = target;
        Ok(())
    }
}

fn common_prefix(a: &[AttrChar], b: &[AttrChar]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[AttrChar], b: &[AttrChar]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rows(texts: &[&str]) -> Vec<AttributedString> {
        texts.iter().map(|t| AttributedString::plain(t)).collect()
    }

    #[test]
    fn test_first_update_draws_everything() {
        let mut display = Display::new(TermCaps::default());
        let mut out: Vec<u8> = Vec::new();
        display
            .update(&rows(&["> hello"]), CellPos { row: 0, col: 7 }, &mut out, false)
            .unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("> hello"));
    }

    #[test]
    fn test_identical_update_emits_nothing() {
        let mut display = Display::new(TermCaps::default());
        let mut out: Vec<u8> = Vec::new();
        let target = CellPos { row: 0, col: 7 };
        display.update(&rows(&["> hello"]), target, &mut out, false).unwrap();
        out.clear();
        display.update(&rows(&["> hello"]), target, &mut out, false).unwrap();
        assert_eq!(out, b"");
    }

    #[test]
    fn test_append_rewrites_only_tail() {
        let mut display = Display::new(TermCaps::default());
        let mut out: Vec<u8> = Vec::new();
        display
            .update(&rows(&["> hell"]), CellPos { row: 0, col: 6 }, &mut out, false)
            .unwrap();
        out.clear();
        display
            .update(&rows(&["> hello"]), CellPos { row: 0, col: 7 }, &mut out, false)
            .unwrap();
        let rendered = String::from_utf8(out).unwrap();
        // Only the new character is written, no full-line rewrite.
        assert!(rendered.contains('o'));
        assert!(!rendered.contains("hello"));
    }

    #[test]
    fn test_shrinking_row_erases_tail() {
        let mut display = Display::new(TermCaps::default());
        let mut out: Vec<u8> = Vec::new();
        display
            .update(&rows(&["> hello"]), CellPos { row: 0, col: 7 }, &mut out, false)
            .unwrap();
        out.clear();
        display
            .update(&rows(&["> he"]), CellPos { row: 0, col: 4 }, &mut out, false)
            .unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains(&CsiSequence::EraseToEndOfLine.to_string()));
    }

    #[test]
    fn test_row_removed_at_top_uses_delete_lines() {
        let mut display = Display::new(TermCaps::default());
        let mut out: Vec<u8> = Vec::new();
        display
            .update(&rows(&["a", "b", "c"]), CellPos { row: 2, col: 1 }, &mut out, false)
            .unwrap();
        out.clear();
        display
            .update(&rows(&["b", "c"]), CellPos { row: 1, col: 1 }, &mut out, false)
            .unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains(&CsiSequence::DeleteLines(1).to_string()));
    }

    #[test]
    fn test_cursor_only_move() {
        let mut display = Display::new(TermCaps::default());
        let mut out: Vec<u8> = Vec::new();
        display
            .update(&rows(&["> hello"]), CellPos { row: 0, col: 7 }, &mut out, false)
            .unwrap();
        out.clear();
        display
            .update(&rows(&["> hello"]), CellPos { row: 0, col: 2 }, &mut out, false)
            .unwrap();
        let rendered = String::from_utf8(out).unwrap();
        // A column move only (CHA to column 3).
        assert_eq!(rendered, "\u{1b}[3G");
    }
}
