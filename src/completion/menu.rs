// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Menu completion state and candidate list layout: grouping, column math,
//! row-major vs column-major fill, packed columns, and the highlighted
//! current pick.

use crate::{str_width, AttributedString, Style};
use crate::Candidate;

/// State of the menu sub-loop. The original word is kept so `C-g` can
/// restore it; `current` is what currently sits in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub candidates: Vec<Candidate>,
    /// Word text the completion started from.
    pub original_word: String,
    /// Selected candidate, `None` until the first cycle (the buffer then
    /// holds the common prefix, if any).
    pub selected: Option<usize>,
    /// Text currently substituted for the word.
    pub current: String,
}

impl MenuState {
    #[must_use]
    pub fn new(candidates: Vec<Candidate>, word: String, initial_prefix: Option<String>) -> Self {
        let current = match &initial_prefix {
            Some(prefix) if prefix.chars().count() > word.chars().count() => prefix.clone(),
            _ => word.clone(),
        };
        Self {
            candidates,
            original_word: word,
            selected: None,
            current,
        }
    }

    #[must_use]
    pub fn selected_candidate(&self) -> Option<&Candidate> {
        self.candidates.get(self.selected?)
    }

    /// Advances the highlight; wraps. Returns the newly selected value.
    pub fn next(&mut self) -> &Candidate {
        let next = match self.selected {
            None => 0,
            Some(idx) => (idx + 1) % self.candidates.len(),
        };
        self.selected = Some(next);
        self.current = self.candidates[next].value.clone();
        &self.candidates[next]
    }

    /// Moves the highlight backward; wraps.
    pub fn previous(&mut self) -> &Candidate {
        let prev = match self.selected {
            None => self.candidates.len() - 1,
            Some(0) => self.candidates.len() - 1,
            Some(idx) => idx - 1,
        };
        self.selected = Some(prev);
        self.current = self.candidates[prev].value.clone();
        &self.candidates[prev]
    }
}

/// Layout knobs, mirrored from the reader options.
#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions {
    pub width: u16,
    /// Column-major by default; `LIST_ROWS_FIRST` flips to row-major.
    pub rows_first: bool,
    /// `LIST_PACKED`: per-column widths instead of one global width.
    pub packed: bool,
    pub group: bool,
}

const COLUMN_GAP: u16 = 2;

/// One display item: a candidate (by index) or a group heading.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Heading(String),
    Candidate(usize),
}

/// Renders the candidate list into attributed rows, with the `selected`
/// candidate shown inverse (menu highlight).
#[must_use]
pub fn layout_candidates(
    candidates: &[Candidate],
    options: LayoutOptions,
    others_group_name: &str,
    selected: Option<usize>,
) -> Vec<AttributedString> {
    let mut rows = Vec::new();
    for (heading, members) in group_candidates(candidates, options.group, others_group_name) {
        if let Some(heading) = heading {
            rows.push(AttributedString::styled(&heading, Style::bold()));
        }
        rows.extend(layout_block(candidates, &members, options, selected));
    }
    rows
}

/// Clusters candidate indices by group, preserving first-appearance order.
/// Ungrouped candidates fall under `others_group_name` (heading shown only
/// when real groups exist).
fn group_candidates(
    candidates: &[Candidate],
    group: bool,
    others_group_name: &str,
) -> Vec<(Option<String>, Vec<usize>)> {
    if !group {
        return vec![(None, (0..candidates.len()).collect())];
    }
    let mut order: Vec<String> = Vec::new();
    let mut buckets: std::collections::HashMap<String, Vec<usize>> =
        std::collections::HashMap::new();
    let mut ungrouped: Vec<usize> = Vec::new();

    for (idx, candidate) in candidates.iter().enumerate() {
        match &candidate.group {
            Some(name) => {
                if !buckets.contains_key(name) {
                    order.push(name.clone());
                }
                buckets.entry(name.clone()).or_default().push(idx);
            }
            None => ungrouped.push(idx),
        }
    }

    let mut out: Vec<(Option<String>, Vec<usize>)> = Vec::new();
    let has_groups = !order.is_empty();
    for name in order {
        let members = buckets.remove(&name).unwrap_or_default();
        out.push((Some(name), members));
    }
    if !ungrouped.is_empty() {
        let heading = has_groups.then(|| others_group_name.to_string());
        out.push((heading, ungrouped));
    }
    out
}

fn display_width(candidate: &Candidate) -> u16 {
    let mut width = str_width(&candidate.display);
    if let Some(descr) = &candidate.description {
        width += 2 + str_width(descr);
    }
    width
}

fn layout_block(
    candidates: &[Candidate],
    members: &[usize],
    options: LayoutOptions,
    selected: Option<usize>,
) -> Vec<AttributedString> {
    if members.is_empty() {
        return Vec::new();
    }
    let width = options.width.max(1);
    let max_item: u16 = members
        .iter()
        .map(|&idx| display_width(&candidates[idx]))
        .max()
        .unwrap_or(1)
        .max(1);
    let columns = ((width + COLUMN_GAP) / (max_item + COLUMN_GAP)).max(1) as usize;
    let row_count = members.len().div_ceil(columns);

    // Cell at (row, col) -> member index.
    let member_at = |row: usize, col: usize| -> Option<usize> {
        let slot = if options.rows_first {
            row * columns + col
        } else {
            col * row_count + row
        };
        members.get(slot).copied()
    };

    // Packed layout sizes each column to its own widest member.
    let column_width = |col: usize| -> u16 {
        if !options.packed {
            return max_item;
        }
        (0..row_count)
            .filter_map(|row| member_at(row, col))
            .map(|idx| display_width(&candidates[idx]))
            .max()
            .unwrap_or(1)
    };

    let mut rows = Vec::with_capacity(row_count);
    for row in 0..row_count {
        let mut line = AttributedString::new();
        for col in 0..columns {
            let Some(idx) = member_at(row, col) else {
                continue;
            };
            let candidate = &candidates[idx];
            let style = if selected == Some(idx) {
                Style::inverse()
            } else {
                Style::default()
            };
            line.push_str(&candidate.display, style);
            if let Some(descr) = &candidate.description {
                line.push_str("  ", Style::default());
                line.push_str(descr, Style::default());
            }
            // Pad to the column boundary unless this is the last column
            // with content on the row.
            let is_last = (col + 1..columns).all(|c| member_at(row, c).is_none());
            if !is_last {
                let pad = column_width(col).saturating_sub(display_width(candidate)) + COLUMN_GAP;
                for _ in 0..pad {
                    line.push_char(' ', Style::default());
                }
            }
        }
        rows.push(line);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pool(values: &[&str]) -> Vec<Candidate> {
        values.iter().map(|v| Candidate::new(v)).collect()
    }

    fn options(width: u16) -> LayoutOptions {
        LayoutOptions {
            width,
            rows_first: false,
            packed: false,
            group: true,
        }
    }

    fn plain_rows(rows: &[AttributedString]) -> Vec<String> {
        rows.iter().map(AttributedString::to_plain_string).collect()
    }

    #[test]
    fn test_menu_cycling() {
        let mut menu = MenuState::new(pool(&["commit", "checkout", "clone"]), "c".into(), None);
        assert_eq!(menu.selected, None);
        assert_eq!(menu.next().value, "commit");
        assert_eq!(menu.next().value, "checkout");
        assert_eq!(menu.next().value, "clone");
        assert_eq!(menu.next().value, "commit"); // wraps
        assert_eq!(menu.previous().value, "clone");
        assert_eq!(menu.original_word, "c");
    }

    #[test]
    fn test_menu_initial_prefix() {
        let menu = MenuState::new(pool(&["checkout", "cherry"]), "c".into(), Some("ch".into()));
        assert_eq!(menu.current, "ch");
        let menu = MenuState::new(pool(&["a", "b"]), "x".into(), None);
        assert_eq!(menu.current, "x");
    }

    #[test]
    fn test_layout_column_major_default() {
        // Width 5 fits 2 one-cell columns: a c / b d (column-major).
        let rows = layout_candidates(&pool(&["a", "b", "c", "d"]), options(5), "others", None);
        let rows = plain_rows(&rows);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("a"));
        assert!(rows[0].contains('c'));
        assert!(rows[1].contains('b'));
        assert!(rows[1].contains('d'));
    }

    #[test]
    fn test_layout_rows_first() {
        let mut opts = options(5);
        opts.rows_first = true;
        let rows = layout_candidates(&pool(&["a", "b", "c", "d"]), opts, "others", None);
        let rows = plain_rows(&rows);
        assert!(rows[0].contains('a') && rows[0].contains('b'));
        assert!(rows[1].contains('c') && rows[1].contains('d'));
    }

    #[test]
    fn test_grouping_with_headings() {
        let candidates = vec![
            Candidate::new("commit").with_group("porcelain"),
            Candidate::new("cat-file"),
            Candidate::new("checkout").with_group("porcelain"),
        ];
        let rows = layout_candidates(&candidates, options(80), "others", None);
        let rows = plain_rows(&rows);
        assert_eq!(rows[0], "porcelain");
        assert!(rows[1].contains("commit") && rows[1].contains("checkout"));
        assert_eq!(rows[2], "others");
        assert!(rows[3].contains("cat-file"));
    }

    #[test]
    fn test_no_heading_when_all_ungrouped() {
        let rows = layout_candidates(&pool(&["x", "y"]), options(80), "others", None);
        let rows = plain_rows(&rows);
        assert!(!rows.iter().any(|r| r.contains("others")));
    }

    #[test]
    fn test_selected_is_inverse() {
        let candidates = pool(&["one", "two"]);
        let rows = layout_candidates(&candidates, options(80), "others", Some(1));
        let cells = rows[0].cells();
        let two_start = rows[0].to_plain_string().find("two").unwrap();
        assert!(cells[two_start].style.inverse);
        assert!(!cells[0].style.inverse);
    }
}
