// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Word boundary scans over the code-point buffer. The `word_chars` set
//! (the `wordchars` variable) extends the alphanumeric word class the way
//! zsh's `WORDCHARS` does.

/// Returns true if `ch` belongs to the word class.
#[must_use]
pub fn is_word_char(ch: char, word_chars: &str) -> bool {
    ch.is_alphanumeric() || word_chars.contains(ch)
}

/// Index of the start of the previous word, scanning backward from `cursor`.
///
/// Skips boundary characters first, then word characters, mirroring
/// Emacs `backward-word`. Returns 0 when no word precedes the cursor.
#[must_use]
pub fn find_prev_word_start(chars: &[char], cursor: usize, word_chars: &str) -> usize {
    let mut idx = cursor.min(chars.len());
    while idx > 0 && !is_word_char(chars[idx - 1], word_chars) {
        idx -= 1;
    }
    while idx > 0 && is_word_char(chars[idx - 1], word_chars) {
        idx -= 1;
    }
    idx
}

/// Index just past the end of the next word, scanning forward from `cursor`.
///
/// Mirrors Emacs `forward-word`: skip boundaries, then skip the word.
#[must_use]
pub fn find_next_word_end(chars: &[char], cursor: usize, word_chars: &str) -> usize {
    let len = chars.len();
    let mut idx = cursor.min(len);
    while idx < len && !is_word_char(chars[idx], word_chars) {
        idx += 1;
    }
    while idx < len && is_word_char(chars[idx], word_chars) {
        idx += 1;
    }
    idx
}

/// Index of the start of the next word, scanning forward from `cursor`.
/// Mirrors vi `w`: leave the current word, then skip boundaries.
#[must_use]
pub fn find_next_word_start(chars: &[char], cursor: usize, word_chars: &str) -> usize {
    let len = chars.len();
    let mut idx = cursor.min(len);
    while idx < len && is_word_char(chars[idx], word_chars) {
        idx += 1;
    }
    while idx < len && !is_word_char(chars[idx], word_chars) {
        idx += 1;
    }
    idx
}

/// `[start, end)` bounds of the word under (or immediately before) `cursor`.
/// Returns `None` when the cursor touches no word.
#[must_use]
pub fn word_at(chars: &[char], cursor: usize, word_chars: &str) -> Option<(usize, usize)> {
    let len = chars.len();
    let mut idx = cursor.min(len);
    if idx == len || !is_word_char(chars[idx], word_chars) {
        if idx == 0 || !is_word_char(chars[idx - 1], word_chars) {
            return None;
        }
        idx -= 1;
    }
    let mut start = idx;
    while start > 0 && is_word_char(chars[start - 1], word_chars) {
        start -= 1;
    }
    let mut end = idx + 1;
    while end < len && is_word_char(chars[end], word_chars) {
        end += 1;
    }
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> { s.chars().collect() }

    #[test]
    fn test_find_prev_word_start() {
        let text = chars("hello world");
        assert_eq!(find_prev_word_start(&text, 11, ""), 6);
        assert_eq!(find_prev_word_start(&text, 6, ""), 0);
        assert_eq!(find_prev_word_start(&text, 0, ""), 0);
        assert_eq!(find_prev_word_start(&chars(""), 0, ""), 0);
    }

    #[test]
    fn test_find_next_word_end() {
        let text = chars("hello world");
        assert_eq!(find_next_word_end(&text, 0, ""), 5);
        assert_eq!(find_next_word_end(&text, 5, ""), 11);
        assert_eq!(find_next_word_end(&text, 11, ""), 11);
    }

    #[test]
    fn test_find_next_word_start() {
        let text = chars("one two three");
        assert_eq!(find_next_word_start(&text, 0, ""), 4);
        assert_eq!(find_next_word_start(&text, 4, ""), 8);
        assert_eq!(find_next_word_start(&text, 8, ""), 13);
    }

    #[test]
    fn test_word_chars_extends_class() {
        let text = chars("foo-bar baz");
        // Without '-' in the word class, "bar" is its own word.
        assert_eq!(find_prev_word_start(&text, 7, ""), 4);
        // With '-', "foo-bar" is one word.
        assert_eq!(find_prev_word_start(&text, 7, "-"), 0);
    }

    #[test]
    fn test_word_at() {
        let text = chars("git status");
        assert_eq!(word_at(&text, 1, ""), Some((0, 3)));
        assert_eq!(word_at(&text, 3, ""), Some((0, 3))); // just past "git"
        assert_eq!(word_at(&text, 4, ""), Some((4, 10)));
        assert_eq!(word_at(&chars("   "), 1, ""), None);
    }
}
