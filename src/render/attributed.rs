// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Attributed text: per-cell style carried alongside each code point. This
//! is the unit the wrap model splits and the display diffs.

use crate::cell_width;
use crossterm::style::Color;
use smallvec::SmallVec;
use std::io::{self, Write};

/// Per-cell style: foreground, background, and the attribute bits the
/// renderer knows how to diff.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub underline: bool,
    pub inverse: bool,
}

impl Style {
    #[must_use]
    pub fn is_plain(&self) -> bool { *self == Style::default() }

    #[must_use]
    pub fn inverse() -> Self {
        Self {
            inverse: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    /// SGR sequence selecting this style from a reset state.
    #[must_use]
    pub fn sgr(&self) -> String {
        let mut params: Vec<String> = vec!["0".to_string()];
        if self.bold {
            params.push("1".to_string());
        }
        if self.underline {
            params.push("4".to_string());
        }
        if self.inverse {
            params.push("7".to_string());
        }
        if let Some(fg) = self.fg {
            params.push(color_params(fg, 38, 30));
        }
        if let Some(bg) = self.bg {
            params.push(color_params(bg, 48, 40));
        }
        format!("\u{1b}[{}m", params.join(";"))
    }
}

fn color_params(color: Color, extended_base: u8, ansi_base: u8) -> String {
    match color {
        Color::Black => ansi_base.to_string(),
        Color::DarkRed => (ansi_base + 1).to_string(),
        Color::DarkGreen => (ansi_base + 2).to_string(),
        Color::DarkYellow => (ansi_base + 3).to_string(),
        Color::DarkBlue => (ansi_base + 4).to_string(),
        Color::DarkMagenta => (ansi_base + 5).to_string(),
        Color::DarkCyan => (ansi_base + 6).to_string(),
        Color::Grey => (ansi_base + 7).to_string(),
        Color::AnsiValue(n) => format!("{extended_base};5;{n}"),
        Color::Rgb { r, g, b } => format!("{extended_base};2;{r};{g};{b}"),
        other => {
            // Bright variants map onto the aixterm range.
            let bright = ansi_base + 60;
            match other {
                Color::DarkGrey => bright.to_string(),
                Color::Red => (bright + 1).to_string(),
                Color::Green => (bright + 2).to_string(),
                Color::Yellow => (bright + 3).to_string(),
                Color::Blue => (bright + 4).to_string(),
                Color::Magenta => (bright + 5).to_string(),
                Color::Cyan => (bright + 6).to_string(),
                Color::White => (bright + 7).to_string(),
                _ => ansi_base.to_string(),
            }
        }
    }
}

/// One code point plus its style and cell width. Width 0 marks zero-width
/// content (combining marks, and prompt `%{…%}` regions whose escapes pass
/// through without advancing the column).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttrChar {
    pub ch: char,
    pub style: Style,
    pub width: u16,
}

/// Most rows fit inline; long buffer lines spill to the heap.
type Cells = SmallVec<[AttrChar; 32]>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributedString {
    cells: Cells,
}

impl AttributedString {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn plain(text: &str) -> Self {
        let mut out = Self::new();
        out.push_str(text, Style::default());
        out
    }

    #[must_use]
    pub fn styled(text: &str, style: Style) -> Self {
        let mut out = Self::new();
        out.push_str(text, style);
        out
    }

    pub fn push(&mut self, cell: AttrChar) { self.cells.push(cell); }

    pub fn push_char(&mut self, ch: char, style: Style) {
        self.cells.push(AttrChar {
            ch,
            style,
            width: cell_width(ch),
        });
    }

    /// Appends text with natural cell widths.
    pub fn push_str(&mut self, text: &str, style: Style) {
        for ch in text.chars() {
            self.push_char(ch, style);
        }
    }

    /// Appends text whose screen advance is treated as zero.
    pub fn push_zero_width(&mut self, text: &str, style: Style) {
        for ch in text.chars() {
            self.cells.push(AttrChar { ch, style, width: 0 });
        }
    }

    pub fn extend(&mut self, other: &AttributedString) {
        self.cells.extend_from_slice(&other.cells);
    }

    #[must_use]
    pub fn cells(&self) -> &[AttrChar] { &self.cells }

    #[must_use]
    pub fn len(&self) -> usize { self.cells.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.cells.is_empty() }

    /// Visible width in terminal cells.
    #[must_use]
    pub fn width(&self) -> u16 { self.cells.iter().map(|cell| cell.width).sum() }

    #[must_use]
    pub fn to_plain_string(&self) -> String { self.cells.iter().map(|cell| cell.ch).collect() }

    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> AttributedString {
        AttributedString {
            cells: SmallVec::from_slice(
                &self.cells[start.min(self.cells.len())..end.min(self.cells.len())],
            ),
        }
    }

    /// Writes the cells, emitting SGR changes only at style boundaries and
    /// a reset at the end when any style was active.
    pub fn emit(&self, term: &mut dyn Write) -> io::Result<()> {
        let mut current: Option<Style> = None;
        for cell in &self.cells {
            if current != Some(cell.style) {
                if cell.style.is_plain() {
                    term.write_all(b"\x1b[0m")?;
                } else {
                    term.write_all(cell.style.sgr().as_bytes())?;
                }
                current = Some(cell.style);
            }
            let mut utf8 = [0u8; 4];
            term.write_all(cell.ch.encode_utf8(&mut utf8).as_bytes())?;
        }
        if matches!(current, Some(style) if !style.is_plain()) {
            term.write_all(b"\x1b[0m")?;
        }
        Ok(())
    }
}

impl From<&str> for AttributedString {
    fn from(text: &str) -> Self { Self::plain(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_counts_cells_not_chars() {
        let mut text = AttributedString::plain("a世");
        text.push_zero_width("\u{1b}[1m", Style::default());
        assert_eq!(text.width(), 3);
        assert_eq!(text.len(), 6);
    }

    #[test]
    fn test_emit_plain_has_no_escapes() {
        let text = AttributedString::plain("abc");
        let mut out = Vec::new();
        text.emit(&mut out).unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_emit_styled_resets_at_end() {
        let mut text = AttributedString::plain("a");
        text.push_str("b", Style::bold());
        let mut out = Vec::new();
        text.emit(&mut out).unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("\u{1b}[0;1m"));
        assert!(rendered.ends_with("\u{1b}[0m"));
    }

    #[test]
    fn test_style_sgr() {
        let style = Style {
            fg: Some(Color::DarkRed),
            inverse: true,
            ..Style::default()
        };
        assert_eq!(style.sgr(), "\u{1b}[0;7;31m");
    }
}
