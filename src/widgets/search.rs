// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Incremental history search, plain and pattern (regex). A sub-loop on
//! top of the main loop: printable keys extend the pattern, `C-r`/`C-s`
//! step through matches, `C-g` aborts restoring the pre-search buffer, and
//! any terminator exits at the matched entry with the cursor on the first
//! match character; the terminating key then replays normally.

use crate::{search_regex, search_substring, DecodedInput, EditSession, SearchDirection,
            SessionState, Style, WidgetRegistry};
use regex::Regex;

pub(crate) fn register_search_widgets(registry: &mut WidgetRegistry) {
    registry.register("history-incremental-search-backward", |session| {
        start_search(session, SearchDirection::Backward, false)
    });
    registry.register("history-incremental-search-forward", |session| {
        start_search(session, SearchDirection::Forward, false)
    });
    registry.register("history-incremental-pattern-search-backward", |session| {
        start_search(session, SearchDirection::Backward, true)
    });
    registry.register("history-incremental-pattern-search-forward", |session| {
        start_search(session, SearchDirection::Forward, true)
    });
    registry.register("vi-repeat-search", vi_repeat_search);
    registry.register("vi-rev-repeat-search", vi_rev_repeat_search);
}

/// State of the incremental search sub-loop.
#[derive(Debug)]
pub struct SearchState {
    pub direction: SearchDirection,
    pub pattern: String,
    /// Regex (pattern search) vs literal substring.
    pub regex: bool,
    /// Buffer and cursor to restore on abort.
    pub saved_buffer: String,
    pub saved_cursor: usize,
    /// Current hit: history entry index and match char offset.
    pub current: Option<(u64, usize)>,
    pub failed: bool,
}

fn start_search(
    session: &mut EditSession<'_>,
    direction: SearchDirection,
    regex: bool,
) -> bool {
    session.numeric_arg.take();
    if session.search.is_some() {
        // Already searching: step to the next match in this direction.
        if let Some(search) = &mut session.search {
            search.direction = direction;
        }
        let _ = step_search(session, true);
        return true;
    }
    session.search = Some(SearchState {
        direction,
        pattern: String::new(),
        regex,
        saved_buffer: session.buf.as_string(),
        saved_cursor: session.buf.cursor(),
        current: None,
        failed: false,
    });
    true
}

/// The last pattern survives the sub-loop so vi `n`/`N` can repeat it.
fn vi_repeat_search(session: &mut EditSession<'_>) -> bool {
    repeat_last_search(session, false)
}

fn vi_rev_repeat_search(session: &mut EditSession<'_>) -> bool {
    repeat_last_search(session, true)
}

fn repeat_last_search(session: &mut EditSession<'_>, reverse: bool) -> bool {
    let (pattern, mut direction) = match &session.vi.last_search {
        Some((pattern, direction)) => (pattern.clone(), *direction),
        None => return false,
    };
    if reverse {
        direction = match direction {
            SearchDirection::Backward => SearchDirection::Forward,
            SearchDirection::Forward => SearchDirection::Backward,
        };
    }
    let from = session.hist_cursor.position().map(|pos| match direction {
        SearchDirection::Backward => pos.saturating_sub(1),
        SearchDirection::Forward => pos + 1,
    });
    let found = search_substring(session.history, &pattern, from, direction);
    match found {
        Some((index, offset)) => {
            apply_match(session, index, offset);
            true
        }
        None => false,
    }
}

fn apply_match(session: &mut EditSession<'_>, index: u64, offset: usize) {
    let Some(text) = session.history.get(index).map(|entry| entry.text.clone()) else {
        return;
    };
    let current = session.buf.as_string();
    session.hist_cursor.move_to(index, session.history, &current);
    session.buf.split_undo();
    session.buf.set_text(&text);
    session.buf.move_to(offset);
    session.buf.split_undo();
}

/// Runs the search for the current pattern. `advance` steps past the
/// current hit (repeat); otherwise the current position is re-checked
/// first (pattern grew).
fn step_search(session: &mut EditSession<'_>, advance: bool) -> bool {
    let Some(search) = &mut session.search else {
        return false;
    };
    if search.pattern.is_empty() {
        search.failed = false;
        return true;
    }
    let from = match (search.current, advance) {
        (Some((index, _)), true) => Some(match search.direction {
            SearchDirection::Backward => {
                if index == 0 {
                    search.failed = true;
                    return false;
                }
                index - 1
            }
            SearchDirection::Forward => index + 1,
        }),
        (Some((index, _)), false) => Some(index),
        (None, _) => None,
    };

    let hit = if search.regex {
        match Regex::new(&search.pattern) {
            Ok(regex) => search_regex(session.history, &regex, from, search.direction),
            Err(_) => None,
        }
    } else {
        search_substring(session.history, &search.pattern, from, search.direction)
    };

    match hit {
        Some((index, offset)) => {
            search.current = Some((index, offset));
            search.failed = false;
            true
        }
        None => {
            search.failed = true;
            false
        }
    }
}

/// What handling one key in the sub-loop means for the main loop.
pub(crate) enum SearchOutcome {
    Consumed,
    /// Search exited; re-dispatch this input normally.
    Replay,
}

pub(crate) fn handle_search_input(
    session: &mut EditSession<'_>,
    input: &DecodedInput,
) -> SearchOutcome {
    match input {
        DecodedInput::SelfInsert(ch) => {
            if let Some(search) = &mut session.search {
                search.pattern.push(*ch);
            }
            if !step_search(session, false) {
                session.beep_pending = true;
            }
            SearchOutcome::Consumed
        }
        DecodedInput::Bound { seq, binding } => {
            let widget = match session.keymaps.resolve(binding) {
                Some(crate::Binding::Widget(name)) => name.clone(),
                _ => String::new(),
            };
            match widget.as_str() {
                "history-incremental-search-backward"
                | "history-incremental-pattern-search-backward" => {
                    if let Some(search) = &mut session.search {
                        search.direction = SearchDirection::Backward;
                    }
                    if !step_search(session, true) {
                        session.beep_pending = true;
                    }
                    SearchOutcome::Consumed
                }
                "history-incremental-search-forward"
                | "history-incremental-pattern-search-forward" => {
                    if let Some(search) = &mut session.search {
                        search.direction = SearchDirection::Forward;
                    }
                    if !step_search(session, true) {
                        session.beep_pending = true;
                    }
                    SearchOutcome::Consumed
                }
                "backward-delete-char" => {
                    let mut popped = false;
                    if let Some(search) = &mut session.search {
                        popped = search.pattern.pop().is_some();
                        if popped {
                            // Re-search from scratch with the shorter
                            // pattern.
                            search.current = None;
                        }
                    }
                    if popped {
                        let _ = step_search(session, false);
                    } else {
                        session.beep_pending = true;
                    }
                    SearchOutcome::Consumed
                }
                "abort" => {
                    abort_search(session);
                    SearchOutcome::Consumed
                }
                "send-break" => {
                    abort_search(session);
                    session.state = SessionState::Aborted;
                    SearchOutcome::Consumed
                }
                _ => {
                    // Terminator (search-terminators, Enter, any other
                    // widget): accept the match, replay the key.
                    let is_terminator = seq
                        .chars()
                        .next()
                        .is_some_and(|ch| session.config.search_terminators().contains(ch));
                    accept_search(session);
                    if is_terminator && widget != "accept-line" {
                        SearchOutcome::Consumed
                    } else {
                        SearchOutcome::Replay
                    }
                }
            }
        }
        DecodedInput::Undefined(_) => {
            accept_search(session);
            SearchOutcome::Consumed
        }
        DecodedInput::Paste(_) | DecodedInput::Resize(_) => {
            accept_search(session);
            SearchOutcome::Replay
        }
    }
}

/// `C-g`: restore the pre-search buffer verbatim.
fn abort_search(session: &mut EditSession<'_>) {
    let Some(search) = session.search.take() else {
        return;
    };
    session.buf.split_undo();
    session.buf.set_text(&search.saved_buffer);
    session.buf.move_to(search.saved_cursor);
}

/// Accept: buffer becomes the matched entry, cursor on the first match
/// character; the pattern is remembered for vi repeat.
fn accept_search(session: &mut EditSession<'_>) {
    let Some(search) = session.search.take() else {
        return;
    };
    session.vi.last_search = Some((search.pattern.clone(), search.direction));
    if let Some((index, offset)) = search.current {
        apply_match(session, index, offset);
    }
}

/// The prompt line shown while searching:
/// `(reverse-i-search)\`pattern': matched-text`.
pub(crate) fn search_prompt_line(
    session: &EditSession<'_>,
    search: &SearchState,
) -> crate::AttributedString {
    let label = match (search.direction, search.regex, search.failed) {
        (SearchDirection::Backward, false, false) => "(reverse-i-search)",
        (SearchDirection::Forward, false, false) => "(i-search)",
        (SearchDirection::Backward, true, false) => "(reverse-p-search)",
        (SearchDirection::Forward, true, false) => "(p-search)",
        (SearchDirection::Backward, _, true) => "(failed reverse-i-search)",
        (SearchDirection::Forward, _, true) => "(failed i-search)",
    };
    let matched = search
        .current
        .and_then(|(index, _)| session.history.get(index))
        .map(|entry| entry.text.as_str())
        .unwrap_or(&search.saved_buffer);
    let mut line = crate::AttributedString::new();
    line.push_str(label, Style::default());
    line.push_str("`", Style::default());
    line.push_str(&search.pattern, Style::bold());
    line.push_str("': ", Style::default());
    line.push_str(matched, Style::default());
    line
}
