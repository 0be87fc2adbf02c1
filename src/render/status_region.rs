// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Reserved bottom rows for status lines, carved off with a DECSTBM scroll
//! region so the prompt and scrollback never run into them. Lifecycle:
//! closed → shown ⇄ hidden, with suspend/restore freezing updates.

use crate::{ok, AttrChar, AttributedString, CsiSequence, CursorSaveCounter, Size, Style};
use std::io::{self, Write};

const ELLIPSIS: char = '…';

/// Geometry outside this range disables the region silently.
const MAX_SANE_ROWS: u16 = 1_000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StatusState {
    Closed,
    Hidden,
    Shown,
    Suspended,
}

#[derive(Debug)]
pub struct StatusRegion {
    /// Desired lines, already sanitized to the terminal width.
    lines: Vec<AttributedString>,
    /// Snapshot of what is actually on screen.
    visible: Vec<AttributedString>,
    state: StatusState,
    border: bool,
    supported: bool,
    size: Size,
    save_counter: CursorSaveCounter,
    /// Lines recorded while suspended, replayed by restore.
    pending: Option<Vec<AttributedString>>,
}

impl StatusRegion {
    #[must_use]
    pub fn new(size: Size, border: bool) -> Self {
        let supported = Self::geometry_ok(size);
        Self {
            lines: Vec::new(),
            visible: Vec::new(),
            state: StatusState::Closed,
            border,
            supported,
            size,
            save_counter: CursorSaveCounter::new(),
            pending: None,
        }
    }

    fn geometry_ok(size: Size) -> bool {
        size.rows > 0 && size.rows < MAX_SANE_ROWS && size.cols > 0
    }

    #[must_use]
    pub fn state(&self) -> StatusState { self.state }

    #[must_use]
    pub fn is_supported(&self) -> bool { self.supported }

    /// Rows the region occupies, border included.
    #[must_use]
    pub fn reserved_rows(&self) -> u16 {
        if !self.supported || matches!(self.state, StatusState::Closed | StatusState::Hidden) {
            return 0;
        }
        let rows = self.lines.len() as u16;
        if rows == 0 {
            0
        } else {
            rows + u16::from(self.border)
        }
    }

    /// First row of the scrollable area's exclusive bottom bound, i.e. the
    /// scroll region is `[0, scroll_bottom())` half-open.
    #[must_use]
    pub fn scroll_bottom(&self) -> u16 {
        self.size.rows.saturating_sub(self.reserved_rows())
    }

    /// Truncates with a trailing ellipsis, or right-pads with spaces so a
    /// shrinking line always erases its predecessor.
    fn sanitize(&self, line: &AttributedString) -> AttributedString {
        let cols = self.size.cols;
        let first_line_cells: Vec<AttrChar> = line
            .cells()
            .iter()
            .take_while(|cell| cell.ch != '\n')
            .copied()
            .collect();
        let total: u16 = first_line_cells.iter().map(|cell| cell.width).sum();

        let mut out = AttributedString::new();
        let mut width: u16 = 0;
        if total > cols {
            let limit = cols.saturating_sub(1);
            for cell in &first_line_cells {
                if width + cell.width > limit {
                    break;
                }
                out.push(*cell);
                width += cell.width;
            }
            out.push(AttrChar {
                ch: ELLIPSIS,
                style: Style::default(),
                width: 1,
            });
            width += 1;
        } else {
            for cell in &first_line_cells {
                out.push(*cell);
                width += cell.width;
            }
        }
        while width < cols {
            out.push_char(' ', Style::default());
            width += 1;
        }
        out
    }

    /// Replaces the status lines. Non-empty content shows the region;
    /// while suspended the lines are recorded and replayed on restore.
    pub fn update(
        &mut self,
        lines: &[AttributedString],
        term: &mut dyn Write,
    ) -> io::Result<()> {
        if !self.supported {
            return Ok(());
        }
        if self.state == StatusState::Suspended {
            self.pending = Some(lines.to_vec());
            return Ok(());
        }

        let sanitized: Vec<AttributedString> =
            lines.iter().map(|line| self.sanitize(line)).collect();
        let grew_or_shrunk = sanitized.len() != self.lines.len();
        self.lines = sanitized;

        if self.lines.is_empty() {
            return self.hide(term);
        }
        self.state = StatusState::Shown;
        if grew_or_shrunk {
            self.apply_scroll_region(term)?;
        }
        self.draw(term)
    }

    fn apply_scroll_region(&mut self, term: &mut dyn Write) -> io::Result<()> {
        let bottom = self.scroll_bottom();
        if bottom == 0 {
            return Ok(());
        }
        self.save_counter.save(term)?;
        write!(
            term,
            "{}",
            CsiSequence::ChangeScrollRegion {
                top: 0,
                bottom: bottom - 1,
            }
        )?;
        self.save_counter.restore(term)?;
        ok!()
    }

    fn draw(&mut self, term: &mut dyn Write) -> io::Result<()> {
        let first_row = self.scroll_bottom();
        self.save_counter.save(term)?;
        let mut row = first_row;
        if self.border {
            write!(term, "{}", CsiSequence::CursorPosition { row, col: 0 })?;
            let border: String =
                std::iter::repeat('─').take(self.size.cols as usize).collect();
            term.write_all(border.as_bytes())?;
            row += 1;
        }
        for line in &self.lines {
            write!(term, "{}", CsiSequence::CursorPosition { row, col: 0 })?;
            line.emit(term)?;
            row += 1;
        }
        self.save_counter.restore(term)?;
        term.flush()?;
        self.visible = self.lines.clone();
        ok!()
    }

    /// Erases the region and gives the rows back to the scroll area. The
    /// erase runs against the captured prior lines *before* the state flag
    /// flips, so it cannot no-op on its own guard.
    pub fn hide(&mut self, term: &mut dyn Write) -> io::Result<()> {
        if !self.supported || self.state == StatusState::Hidden {
            return Ok(());
        }
        let prior = std::mem::take(&mut self.visible);
        if !prior.is_empty() {
            let first_row = self.size.rows.saturating_sub(
                prior.len() as u16 + u16::from(self.border),
            );
            self.save_counter.save(term)?;
            for (i, _) in prior.iter().enumerate() {
                let row = first_row + u16::from(self.border) + i as u16;
                write!(term, "{}", CsiSequence::CursorPosition { row, col: 0 })?;
                write!(term, "{}", CsiSequence::EraseToEndOfLine)?;
            }
            if self.border {
                write!(
                    term,
                    "{}{}",
                    CsiSequence::CursorPosition {
                        row: first_row,
                        col: 0
                    },
                    CsiSequence::EraseToEndOfLine
                )?;
            }
            self.save_counter.restore(term)?;
        }
        self.state = StatusState::Hidden;
        self.reset_scroll_region(term)?;
        term.flush()
    }

    /// Re-shows the current lines after a hide.
    pub fn show(&mut self, term: &mut dyn Write) -> io::Result<()> {
        if !self.supported || self.lines.is_empty() {
            return Ok(());
        }
        self.state = StatusState::Shown;
        self.apply_scroll_region(term)?;
        self.draw(term)
    }

    /// Freezes updates; subsequent `update` calls are recorded.
    pub fn suspend(&mut self) {
        if self.state == StatusState::Shown {
            self.pending = Some(self.lines.clone());
        }
        self.state = StatusState::Suspended;
    }

    /// Replays the lines recorded while suspended.
    pub fn restore(&mut self, term: &mut dyn Write) -> io::Result<()> {
        self.state = StatusState::Hidden;
        if let Some(pending) = self.pending.take() {
            self.update(&pending, term)?;
        }
        ok!()
    }

    /// Recomputes layout for a new terminal size. Invalid geometry disables
    /// the region silently.
    pub fn resize(&mut self, size: Size, term: &mut dyn Write) -> io::Result<()> {
        self.size = size;
        self.supported = Self::geometry_ok(size);
        if !self.supported {
            self.state = StatusState::Closed;
            return Ok(());
        }
        if self.state == StatusState::Shown {
            let lines = self.lines.clone();
            // Re-sanitize against the new width and redraw.
            self.visible.clear();
            self.update(&lines, term)?;
        }
        ok!()
    }

    fn reset_scroll_region(&mut self, term: &mut dyn Write) -> io::Result<()> {
        self.save_counter.save(term)?;
        write!(term, "{}", CsiSequence::ResetScrollRegion)?;
        self.save_counter.restore(term)?;
        ok!()
    }

    /// Restores the terminal on session exit. Idempotent.
    pub fn close(&mut self, term: &mut dyn Write) -> io::Result<()> {
        if self.state == StatusState::Closed {
            return Ok(());
        }
        self.hide(term)?;
        self.state = StatusState::Closed;
        ok!()
    }
}
