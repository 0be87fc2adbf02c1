// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Raw escape sequences crossterm has no command for: DECSTBM scroll
//! regions, insert/delete line, and DECSC/DECRC cursor save. Each variant
//! renders through `Display`, so call sites can `write!` them directly.

use crate::ok;
use std::fmt;
use std::io::{self, Write};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CsiSequence {
    /// DECSTBM: rows are 1-based and inclusive.
    ChangeScrollRegion { top: u16, bottom: u16 },
    /// DECSTBM with no params: full screen.
    ResetScrollRegion,
    /// IL: insert blank lines at the cursor row.
    InsertLines(u16),
    /// DL: delete lines at the cursor row.
    DeleteLines(u16),
    /// CUP: 1-based row/column.
    CursorPosition { row: u16, col: u16 },
    /// EL 0: erase from cursor to end of line.
    EraseToEndOfLine,
    /// ED 0: erase from cursor to end of screen.
    EraseToEndOfScreen,
}

impl fmt::Display for CsiSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChangeScrollRegion { top, bottom } => {
                write!(f, "\u{1b}[{};{}r", top + 1, bottom + 1)
            }
            Self::ResetScrollRegion => write!(f, "\u{1b}[r"),
            Self::InsertLines(n) => write!(f, "\u{1b}[{n}L"),
            Self::DeleteLines(n) => write!(f, "\u{1b}[{n}M"),
            Self::CursorPosition { row, col } => write!(f, "\u{1b}[{};{}H", row + 1, col + 1),
            Self::EraseToEndOfLine => write!(f, "\u{1b}[K"),
            Self::EraseToEndOfScreen => write!(f, "\u{1b}[J"),
        }
    }
}

pub const SAVE_CURSOR: &str = "\u{1b}7";
pub const RESTORE_CURSOR: &str = "\u{1b}8";

/// DECSC does not nest on real terminals: a second save overwrites the
/// first. This counter emits the sequence only on the outermost
/// save/restore pair; inner requests are counted and elided.
#[derive(Debug, Default)]
pub struct CursorSaveCounter {
    depth: usize,
}

impl CursorSaveCounter {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub fn save(&mut self, term: &mut dyn Write) -> io::Result<()> {
        if self.depth == 0 {
            term.write_all(SAVE_CURSOR.as_bytes())?;
        }
        self.depth += 1;
        ok!()
    }

    pub fn restore(&mut self, term: &mut dyn Write) -> io::Result<()> {
        if self.depth == 0 {
            return Ok(());
        }
        self.depth -= 1;
        if self.depth == 0 {
            term.write_all(RESTORE_CURSOR.as_bytes())?;
        }
        ok!()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences_render() {
        assert_eq!(
            CsiSequence::ChangeScrollRegion { top: 0, bottom: 21 }.to_string(),
            "\u{1b}[1;22r"
        );
        assert_eq!(CsiSequence::ResetScrollRegion.to_string(), "\u{1b}[r");
        assert_eq!(CsiSequence::InsertLines(2).to_string(), "\u{1b}[2L");
        assert_eq!(
            CsiSequence::CursorPosition { row: 3, col: 0 }.to_string(),
            "\u{1b}[4;1H"
        );
    }

    #[test]
    fn test_save_counter_emits_outermost_only() {
        let mut counter = CursorSaveCounter::new();
        let mut out: Vec<u8> = Vec::new();
        counter.save(&mut out).unwrap();
        counter.save(&mut out).unwrap();
        counter.restore(&mut out).unwrap();
        counter.restore(&mut out).unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert_eq!(rendered, format!("{SAVE_CURSOR}{RESTORE_CURSOR}"));
    }
}
