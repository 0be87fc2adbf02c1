// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Completion widgets and the menu sub-state. The engine decides the
//! behavior; this module applies it to the buffer, renders the candidate
//! rows under the edit region, and interprets keys while a menu or a
//! display confirmation is active.

use crate::{decide, layout_candidates, AttributedString, Candidate, CompleteOutcome,
            CompletionConfig, DecodedInput, EditSession, EditorOption, LayoutOptions,
            MatcherOptions, MenuState, ParseContext, ParsedLine, PendingSuffix, WidgetRegistry};

pub(crate) fn register_completion_widgets(registry: &mut WidgetRegistry) {
    registry.register("complete-word", complete_word);
    registry.register("expand-or-complete", expand_or_complete);
    registry.register("menu-complete", menu_complete);
    registry.register("menu-expand-or-complete", menu_complete);
    registry.register("reverse-menu-complete", reverse_menu_complete);
    registry.register("menu-select", menu_complete);
    registry.register("list-choices", list_choices);
}

/// Menu sub-state: the engine's cycling state plus the buffer span the
/// current pick replaces.
#[derive(Debug)]
pub struct MenuSession {
    pub state: MenuState,
    pub word_start: usize,
    /// Length (in code points) of the text currently substituted in.
    pub word_len: usize,
}

fn completion_config(session: &EditSession<'_>) -> CompletionConfig {
    CompletionConfig {
        auto_menu: session.config.is_set(EditorOption::AutoMenu),
        auto_list: session.config.is_set(EditorOption::AutoList),
        complete_in_word: session.config.is_set(EditorOption::CompleteInWord),
        auto_param_slash: session.config.is_set(EditorOption::AutoParamSlash),
        empty_word: session.config.is_set(EditorOption::EmptyWordOptions),
        group: session.config.is_set(EditorOption::Group),
        auto_group: session.config.is_set(EditorOption::AutoGroup),
        others_group_name: session.config.others_group_name(),
        list_rows_first: session.config.is_set(EditorOption::ListRowsFirst),
        list_packed: session.config.is_set(EditorOption::ListPacked),
        list_max: session.config.list_max(),
        menu_list_max: session.config.menu_list_max(),
        matcher: MatcherOptions {
            case_insensitive: session.config.is_set(EditorOption::CaseInsensitive),
            typo_errors: if session.config.is_set(EditorOption::CompleteMatcherTypo) {
                session.config.errors()
            } else {
                0
            },
        },
    }
}

fn parse_for_completion(session: &EditSession<'_>) -> Option<ParsedLine> {
    session
        .parser
        .parse(
            &session.buf.as_string(),
            session.buf.cursor(),
            ParseContext::Complete,
        )
        .ok()
}

fn gather(session: &EditSession<'_>, parsed: &ParsedLine) -> Vec<Candidate> {
    let mut out = Vec::new();
    for completer in session.completers {
        completer.complete(parsed, &mut out);
    }
    out
}

/// Char span of the word being completed, from the parsed word cursor.
fn word_span(session: &EditSession<'_>, parsed: &ParsedLine) -> (usize, usize) {
    let start = session.buf.cursor().saturating_sub(parsed.word_cursor);
    let end = start + parsed.word().chars().count();
    (start, end.min(session.buf.len()))
}

pub(crate) fn complete_word(session: &mut EditSession<'_>) -> bool {
    run_completion(session, false)
}

/// Expansion first (variables via the expander), completion otherwise.
/// With `INSERT_TAB`, a tab on a blank word inserts a literal tab.
fn expand_or_complete(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    if session.config.is_set(EditorOption::InsertTab) {
        let cursor = session.buf.cursor();
        let at_blank = cursor == 0
            || session
                .buf
                .char_at(cursor - 1)
                .is_some_and(char::is_whitespace);
        if at_blank {
            session.current_key = "\t".to_string();
            return crate::widgets::emacs::self_insert(session);
        }
    }

    let line = session.buf.as_string();
    let expanded = session.expander.expand_var(&line);
    if expanded != line {
        session.buf.split_undo();
        session.buf.set_text(&expanded);
        return true;
    }
    run_completion(session, false)
}

fn menu_complete(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    if session.menu.is_some() {
        return cycle_menu(session, true);
    }
    run_completion(session, true)
}

fn reverse_menu_complete(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    if session.menu.is_some() {
        return cycle_menu(session, false);
    }
    // Entering the menu backwards selects the last candidate.
    if !run_completion(session, true) {
        return false;
    }
    if session.menu.is_some() {
        return cycle_menu(session, false);
    }
    true
}

fn list_choices(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let Some(parsed) = parse_for_completion(session) else {
        return false;
    };
    let raw = gather(session, &parsed);
    let config = completion_config(session);
    match decide(raw, &parsed, &config, false) {
        CompleteOutcome::NoMatches => false,
        CompleteOutcome::ConfirmList(candidates) => {
            show_confirm(session, candidates);
            true
        }
        CompleteOutcome::Insert(candidate) => {
            show_list(session, &[candidate], None);
            true
        }
        CompleteOutcome::ExtendPrefix { survivors, .. }
        | CompleteOutcome::List(survivors) => {
            show_list(session, &survivors, None);
            true
        }
        CompleteOutcome::Menu(menu) => {
            show_list(session, &menu.candidates, None);
            true
        }
    }
}

fn run_completion(session: &mut EditSession<'_>, force_menu: bool) -> bool {
    session.numeric_arg.take();
    let Some(parsed) = parse_for_completion(session) else {
        return false;
    };
    let raw = gather(session, &parsed);
    if raw.is_empty() {
        return false;
    }
    let config = completion_config(session);
    let (word_start, word_end) = word_span(session, &parsed);

    match decide(raw, &parsed, &config, force_menu) {
        CompleteOutcome::NoMatches => false,
        CompleteOutcome::Insert(candidate) => {
            insert_candidate(session, word_start, word_end, &candidate);
            session.dismiss_completion();
            true
        }
        CompleteOutcome::ExtendPrefix { prefix, survivors } => {
            session.buf.edit_atomically(|buf| {
                buf.replace(word_start..word_end, &prefix);
            });
            show_list(session, &survivors, None);
            true
        }
        CompleteOutcome::List(survivors) => {
            show_list(session, &survivors, None);
            // Nothing extended: list (when enabled) and ring.
            false
        }
        CompleteOutcome::ConfirmList(candidates) => {
            show_confirm(session, candidates);
            true
        }
        CompleteOutcome::Menu(menu) => {
            let current = menu.current.clone();
            let word_len = current.chars().count();
            if current != menu.original_word {
                session.buf.edit_atomically(|buf| {
                    buf.replace(word_start..word_end, &current);
                });
            }
            session.menu = Some(MenuSession {
                state: menu,
                word_start,
                word_len,
            });
            if force_menu {
                // menu-complete starts on the first candidate right away.
                cycle_menu(session, true);
            } else {
                render_menu_rows(session);
            }
            true
        }
    }
}

/// Replaces the completed word and applies the suffix policy: complete
/// candidates get a trailing space, partial ones keep their suffix with
/// removal tracking (`auto-remove-slash`).
fn insert_candidate(
    session: &mut EditSession<'_>,
    word_start: usize,
    word_end: usize,
    candidate: &Candidate,
) {
    let mut replacement = candidate.value.clone();
    let mut suffix_len = 0usize;
    if let Some(suffix) = &candidate.suffix {
        if session.config.is_set(EditorOption::AutoParamSlash) {
            replacement.push_str(suffix);
            suffix_len = suffix.chars().count();
        }
    } else if candidate.complete {
        replacement.push(' ');
    }
    session.buf.edit_atomically(|buf| {
        buf.replace(word_start..word_end, &replacement);
    });
    if suffix_len > 0 && session.config.is_set(EditorOption::AutoRemoveSlash) {
        session.pending_suffix = Some(PendingSuffix {
            len: suffix_len,
            remove_chars: session.config.remove_suffix_chars(),
        });
    }
}

fn show_list(session: &mut EditSession<'_>, candidates: &[Candidate], selected: Option<usize>) {
    let options = LayoutOptions {
        width: session.term_size.cols,
        rows_first: session.config.is_set(EditorOption::ListRowsFirst),
        packed: session.config.is_set(EditorOption::ListPacked),
        group: session.config.is_set(EditorOption::Group)
            && session.config.is_set(EditorOption::AutoGroup),
    };
    session.list_rows = layout_candidates(
        candidates,
        options,
        &session.config.others_group_name(),
        selected,
    );
}

fn show_confirm(session: &mut EditSession<'_>, candidates: Vec<Candidate>) {
    let count = candidates.len();
    session.pending_confirm = Some(candidates);
    session.list_rows = vec![AttributedString::plain(&format!(
        "display all {count} possibilities? (y or n)"
    ))];
}

fn render_menu_rows(session: &mut EditSession<'_>) {
    let Some(menu) = &session.menu else {
        return;
    };
    let candidates = menu.state.candidates.clone();
    let selected = menu.state.selected;
    show_list(session, &candidates, selected);
}

fn cycle_menu(session: &mut EditSession<'_>, forward: bool) -> bool {
    let Some(menu) = &mut session.menu else {
        return false;
    };
    let value = if forward {
        menu.state.next().value.clone()
    } else {
        menu.state.previous().value.clone()
    };
    let word_start = menu.word_start;
    let word_len = menu.word_len;
    session.buf.edit_atomically(|buf| {
        buf.replace(word_start..word_start + word_len, &value);
    });
    if let Some(menu) = &mut session.menu {
        menu.word_len = value.chars().count();
    }
    render_menu_rows(session);
    true
}

/// Commits the currently highlighted pick (suffix policy applied) and
/// leaves the menu.
fn commit_menu(session: &mut EditSession<'_>) {
    let Some(menu) = session.menu.take() else {
        return;
    };
    if let Some(candidate) = menu.state.selected_candidate().cloned() {
        let word_end = menu.word_start + menu.word_len;
        insert_candidate(session, menu.word_start, word_end, &candidate);
    }
    session.list_rows.clear();
}

/// Restores the original word and leaves the menu (`C-g`).
fn cancel_menu(session: &mut EditSession<'_>) {
    let Some(menu) = session.menu.take() else {
        return;
    };
    let original = menu.state.original_word.clone();
    session.buf.edit_atomically(|buf| {
        buf.replace(menu.word_start..menu.word_start + menu.word_len, &original);
    });
    session.list_rows.clear();
}

/// Interprets keys while the menu is active. Returns true when the input
/// was consumed; false falls through to normal dispatch (after the menu
/// committed).
pub(crate) fn handle_menu_input(
    session: &mut EditSession<'_>,
    _widgets: &WidgetRegistry,
    input: &DecodedInput,
) -> bool {
    match input {
        DecodedInput::Bound { binding, .. } => {
            let name = match session.keymaps.resolve(binding) {
                Some(crate::Binding::Widget(name)) => name.clone(),
                _ => {
                    commit_menu(session);
                    return false;
                }
            };
            match name.as_str() {
                "menu-complete" | "menu-expand-or-complete" | "menu-select"
                | "complete-word" | "expand-or-complete" => {
                    cycle_menu(session, true);
                    session.last_widget = Some("menu-complete".to_string());
                    true
                }
                "reverse-menu-complete" => {
                    cycle_menu(session, false);
                    session.last_widget = Some("reverse-menu-complete".to_string());
                    true
                }
                "accept-line" => {
                    // Enter commits the pick; it does not accept the line.
                    commit_menu(session);
                    true
                }
                "abort" => {
                    cancel_menu(session);
                    true
                }
                _ => {
                    // Any other widget accepts the pick and runs normally.
                    commit_menu(session);
                    false
                }
            }
        }
        DecodedInput::SelfInsert(_) | DecodedInput::Undefined(_) => {
            // A printable key accepts the pick and is then processed
            // normally (forwarded).
            commit_menu(session);
            false
        }
        DecodedInput::Paste(_) | DecodedInput::Resize(_) => {
            commit_menu(session);
            false
        }
    }
}

/// y/n gate before displaying an over-`list-max` candidate list.
pub(crate) fn handle_confirm_input(session: &mut EditSession<'_>, input: &DecodedInput) {
    let confirmed = matches!(input, DecodedInput::SelfInsert('y' | 'Y'));
    let candidates = session.pending_confirm.take().unwrap_or_default();
    session.list_rows.clear();
    if confirmed {
        show_list(session, &candidates, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_fixtures::{key_event, key_events_for, StdoutMock, TestVecKeyEventReader};
    use crate::{LineEditor, SafeRawTerminal, StdMutex, StringsCompleter};
    use crossterm::event::{Event, KeyCode, KeyModifiers};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn editor(events: Vec<Event>) -> (LineEditor, StdoutMock) {
        let stdout_mock = StdoutMock::default();
        let terminal: SafeRawTerminal = Arc::new(StdMutex::new(stdout_mock.clone()));
        let mut editor = LineEditor::new(
            terminal,
            Box::new(TestVecKeyEventReader::new(events)),
            (80, 24),
        );
        editor
            .config_mut()
            .set_option(EditorOption::HistoryIncremental, false);
        editor.add_completer(Box::new(StringsCompleter::new([
            "commit", "checkout", "clone",
        ])));
        (editor, stdout_mock)
    }

    fn tab() -> Event { key_event(KeyCode::Tab, KeyModifiers::NONE) }

    fn enter() -> Event { key_event(KeyCode::Enter, KeyModifiers::NONE) }

    #[test]
    fn test_sole_candidate_inserts_with_space() {
        let mut events = key_events_for("com");
        events.push(tab());
        events.push(enter());
        let (mut editor, _) = editor(events);
        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "commit ");
    }

    #[test]
    fn test_menu_cycle_and_commit() {
        // With AUTO_MENU: Tab lists, Tab cycles to "checkout"
        // (sorted order), Enter commits the pick, Enter accepts.
        let mut events = key_events_for("c");
        events.push(tab()); // enter menu (no selection yet)
        events.push(tab()); // select first (checkout, sorted)
        events.push(enter()); // commit pick
        events.push(enter()); // accept line
        let (mut editor, stdout_mock) = editor(events);
        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "checkout ");
        let output = stdout_mock.get_copy_of_buffer_as_stripped_string();
        // The menu listed all three candidates.
        assert!(output.contains("commit"));
        assert!(output.contains("clone"));
    }

    #[test]
    fn test_menu_printable_accepts_and_forwards() {
        let mut events = key_events_for("c");
        events.push(tab());
        events.push(tab()); // select "checkout"
        events.extend(key_events_for("x")); // accept + forward 'x'
        events.push(enter());
        let (mut editor, _) = editor(events);
        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "checkout x");
    }

    #[test]
    fn test_menu_abort_restores_word() {
        let mut events = key_events_for("c");
        events.push(tab());
        events.push(tab());
        events.push(key_event(KeyCode::Char('g'), KeyModifiers::CONTROL));
        events.push(enter());
        let (mut editor, _) = editor(events);
        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "c");
    }

    #[test]
    fn test_auto_menu_off_extends_prefix_then_lists() {
        let mut events = key_events_for("c");
        events.push(tab()); // no extension (prefix == "c"): lists + rings
        events.push(tab()); // lists again
        events.push(enter());
        let (mut editor, stdout_mock) = editor(events);
        editor.config_mut().set_option(EditorOption::AutoMenu, false);
        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "c");
        let output = stdout_mock.get_copy_of_buffer_as_string();
        // Bell rang (nothing extended).
        assert!(output.contains('\u{7}'));
        let stripped = stdout_mock.get_copy_of_buffer_as_stripped_string();
        assert!(stripped.contains("commit"));
        assert!(stripped.contains("checkout"));
        assert!(stripped.contains("clone"));
    }

    #[test]
    fn test_prefix_extension() {
        let mut events = key_events_for("ch");
        events.push(tab());
        events.push(enter());
        let (mut editor, _) = editor(events);
        editor.config_mut().set_option(EditorOption::AutoMenu, false);
        // "ch" -> sole match "checkout".
        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "checkout ");
    }

    #[test]
    fn test_confirm_list_gate() {
        let mut events = key_events_for("c");
        events.push(tab());
        events.extend(key_events_for("y"));
        events.push(enter());
        let (mut editor, stdout_mock) = editor(events);
        editor.config_mut().set_option(EditorOption::AutoMenu, false);
        editor.config_mut().set_var(crate::LIST_MAX, "2");
        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "c");
        let output = stdout_mock.get_copy_of_buffer_as_stripped_string();
        assert!(output.contains("display all 3 possibilities? (y or n)"));
        assert!(output.contains("commit"));
    }
}
