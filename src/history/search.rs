// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! History search: the navigation cursor used by up/down widgets (which
//! remembers the in-progress line), plus the match primitives behind
//! prefix, substring, and regex (pattern) search. The search cursor is
//! independent of the navigation cursor.

use crate::History;
use regex::Regex;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

/// Navigation state for `up-history` / `down-history` and friends. Position
/// `None` is the in-progress line ("last"), which is restored verbatim when
/// cycling returns to it.
#[derive(Debug, Default)]
pub struct HistoryCursor {
    position: Option<u64>,
    saved_line: Option<String>,
}

impl HistoryCursor {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn position(&self) -> Option<u64> { self.position }

    #[must_use]
    pub fn is_at_last(&self) -> bool { self.position.is_none() }

    pub fn reset(&mut self) {
        self.position = None;
        self.saved_line = None;
    }

    /// Moves one entry older. Saves the in-progress buffer on first entry.
    /// Returns the text to show, or `None` at the top (bell).
    pub fn up(&mut self, history: &History, current_buffer: &str) -> Option<String> {
        let target = match self.position {
            None => history.last_index()?,
            Some(pos) => {
                if pos == history.first_index()? {
                    return None;
                }
                pos - 1
            }
        };
        if self.position.is_none() {
            self.saved_line = Some(current_buffer.to_string());
        }
        self.position = Some(target);
        history.get(target).map(|entry| entry.text.clone())
    }

    /// Moves one entry newer; returning past the newest entry restores the
    /// saved in-progress line verbatim.
    pub fn down(&mut self, history: &History) -> Option<String> {
        let pos = self.position?;
        if Some(pos) == history.last_index() {
            self.position = None;
            return Some(self.saved_line.take().unwrap_or_default());
        }
        let target = pos + 1;
        self.position = Some(target);
        history.get(target).map(|entry| entry.text.clone())
    }

    /// Jumps to the oldest entry.
    pub fn to_first(&mut self, history: &History, current_buffer: &str) -> Option<String> {
        let first = history.first_index()?;
        if self.position.is_none() {
            self.saved_line = Some(current_buffer.to_string());
        }
        self.position = Some(first);
        history.get(first).map(|entry| entry.text.clone())
    }

    /// Jumps back to the in-progress line.
    pub fn to_last(&mut self) -> Option<String> {
        self.position = None;
        Some(self.saved_line.take().unwrap_or_default())
    }

    /// Moves to the entry at `index` (used when a search accepts).
    pub fn move_to(&mut self, index: u64, history: &History, current_buffer: &str) {
        if self.position.is_none() {
            self.saved_line = Some(current_buffer.to_string());
        }
        self.position = Some(index);
    }

    /// Prefix search (`history-search-backward`/`-forward`): the pattern is
    /// the buffer up to the cursor; matching starts one past the current
    /// position.
    pub fn search_prefix(
        &mut self,
        history: &History,
        prefix: &str,
        direction: SearchDirection,
        current_buffer: &str,
    ) -> Option<String> {
        let found = match direction {
            SearchDirection::Backward => {
                let from = match self.position {
                    None => history.last_index()?,
                    Some(pos) => pos.checked_sub(1)?,
                };
                find_backward(history, from, |text| text.starts_with(prefix))
            }
            SearchDirection::Forward => {
                let from = self.position? + 1;
                find_forward(history, from, |text| text.starts_with(prefix))
            }
        }?;
        self.move_to(found, history, current_buffer);
        history.get(found).map(|entry| entry.text.clone())
    }
}

fn find_backward(history: &History, from: u64, pred: impl Fn(&str) -> bool) -> Option<u64> {
    let first = history.first_index()?;
    let mut idx = from;
    loop {
        if let Some(entry) = history.get(idx) {
            if pred(&entry.text) {
                return Some(idx);
            }
        }
        if idx == first {
            return None;
        }
        idx -= 1;
    }
}

fn find_forward(history: &History, from: u64, pred: impl Fn(&str) -> bool) -> Option<u64> {
    let last = history.last_index()?;
    let mut idx = from.max(history.first_index()?);
    while idx <= last {
        if let Some(entry) = history.get(idx) {
            if pred(&entry.text) {
                return Some(idx);
            }
        }
        idx += 1;
    }
    None
}

/// Substring match for incremental search. Returns `(entry index, char
/// offset of the match)` so the cursor can land on the first match char.
#[must_use]
pub fn search_substring(
    history: &History,
    pattern: &str,
    from: Option<u64>,
    direction: SearchDirection,
) -> Option<(u64, usize)> {
    let matcher = |text: &str| {
        text.find(pattern)
            .map(|byte| text[..byte].chars().count())
    };
    search_with(history, from, direction, matcher)
}

/// Regex match for incremental *pattern* search.
#[must_use]
pub fn search_regex(
    history: &History,
    pattern: &Regex,
    from: Option<u64>,
    direction: SearchDirection,
) -> Option<(u64, usize)> {
    let matcher = |text: &str| {
        pattern
            .find(text)
            .map(|m| text[..m.start()].chars().count())
    };
    search_with(history, from, direction, matcher)
}

fn search_with(
    history: &History,
    from: Option<u64>,
    direction: SearchDirection,
    matcher: impl Fn(&str) -> Option<usize>,
) -> Option<(u64, usize)> {
    let first = history.first_index()?;
    let last = history.last_index()?;
    match direction {
        SearchDirection::Backward => {
            let mut idx = from.unwrap_or(last).min(last);
            loop {
                if let Some(entry) = history.get(idx) {
                    if let Some(offset) = matcher(&entry.text) {
                        return Some((idx, offset));
                    }
                }
                if idx == first {
                    return None;
                }
                idx -= 1;
            }
        }
        SearchDirection::Forward => {
            let mut idx = from.unwrap_or(first).max(first);
            while idx <= last {
                if let Some(entry) = history.get(idx) {
                    if let Some(offset) = matcher(&entry.text) {
                        return Some((idx, offset));
                    }
                }
                idx += 1;
            }
            None
        }
    }
}
