// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Terminal dimensions in cells: `cols` across, `rows` down.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self { Self { cols, rows } }
}

impl From<(u16, u16)> for Size {
    /// Accepts the `(width_cols, height_rows)` tuple shape returned by
    /// [`crossterm::terminal::size`].
    fn from((cols, rows): (u16, u16)) -> Self { Self { cols, rows } }
}

/// Number of terminal cells one code point occupies: 0 for zero-width
/// (combining marks), 2 for wide East-Asian, 1 otherwise. Control characters
/// report 0; the caller decides how to render them.
#[must_use]
pub fn cell_width(ch: char) -> u16 {
    UnicodeWidthChar::width(ch).unwrap_or(0) as u16
}

/// Visible width of a string in terminal cells, measured per grapheme
/// cluster so combining sequences count once.
#[must_use]
pub fn str_width(text: &str) -> u16 {
    text.graphemes(true)
        .map(|grapheme| UnicodeWidthStr::width(grapheme) as u16)
        .sum()
}

/// Wraps an expression in `Ok`, or produces `Ok(())` with no argument. Lets
/// fallible functions end in `ok!()` instead of a bare `Ok(())`.
#[macro_export]
macro_rules! ok {
    () => {
        Ok(())
    };
    ($expr:expr) => {
        Ok($expr)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_width() {
        assert_eq!(cell_width('a'), 1);
        assert_eq!(cell_width('世'), 2);
        assert_eq!(cell_width('\u{0301}'), 0); // combining acute accent
    }

    #[test]
    fn test_str_width_mixed() {
        assert_eq!(str_width("abc"), 3);
        assert_eq!(str_width("a世b"), 4);
        assert_eq!(str_width(""), 0);
    }
}
