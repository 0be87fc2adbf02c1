// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The Emacs-family widgets: motion, mutation, kill/yank, history
//! navigation, undo, and the meta widgets (arguments, accept, abort).
//! Semantics follow GNU Readline / ZLE; callers rely on the exact
//! tie-breaks documented on each widget.

use crate::{find_next_word_end, find_prev_word_start, EditSession, KillDirection, ParseContext,
            ParseError, PendingOp, SessionState, WidgetRegistry};

pub(crate) fn register_emacs_widgets(registry: &mut WidgetRegistry) {
    // Motion.
    registry.register("forward-char", forward_char);
    registry.register("backward-char", backward_char);
    registry.register("forward-word", forward_word);
    registry.register("backward-word", backward_word);
    registry.register("beginning-of-line", beginning_of_line);
    registry.register("end-of-line", end_of_line);
    registry.register("beginning-of-line-hist", beginning_of_line_hist);
    registry.register("up-line-or-history", up_line_or_history);
    registry.register("down-line-or-history", down_line_or_history);

    // Mutation.
    registry.register("self-insert", self_insert);
    registry.register("self-insert-unmeta", self_insert_unmeta);
    registry.register("backward-delete-char", backward_delete_char);
    registry.register("delete-char", delete_char);
    registry.register("kill-word", kill_word);
    registry.register("backward-kill-word", backward_kill_word);
    registry.register("kill-line", kill_line);
    registry.register("backward-kill-line", backward_kill_line);
    registry.register("kill-whole-line", kill_whole_line);
    registry.register("transpose-chars", transpose_chars);
    registry.register("transpose-words", transpose_words);
    registry.register("capitalize-word", capitalize_word);
    registry.register("up-case-word", up_case_word);
    registry.register("down-case-word", down_case_word);
    registry.register("quoted-insert", quoted_insert);
    registry.register("overwrite-mode", overwrite_mode);

    // History.
    registry.register("up-history", up_history);
    registry.register("down-history", down_history);
    registry.register("beginning-of-history", beginning_of_history);
    registry.register("end-of-history", end_of_history);
    registry.register("history-search-forward", history_search_forward);
    registry.register("history-search-backward", history_search_backward);

    // Yank / mark.
    registry.register("set-mark-command", set_mark_command);
    registry.register("exchange-point-and-mark", exchange_point_and_mark);
    registry.register("kill-region", kill_region);
    registry.register("copy-region-as-kill", copy_region_as_kill);
    registry.register("yank", yank);
    registry.register("yank-pop", yank_pop);

    // Undo / meta.
    registry.register("undo", undo);
    registry.register("redo", redo);
    registry.register("split-undo", split_undo);
    registry.register("digit-argument", digit_argument);
    registry.register("universal-argument", universal_argument);
    registry.register("neg-argument", neg_argument);
    registry.register("accept-line", accept_line);
    registry.register("abort", abort);
    registry.register("send-break", send_break);
    registry.register("clear-screen", clear_screen);
    registry.register("redraw-line", redraw_line);
    registry.register("redisplay", redisplay_widget);
    registry.register("beep", beep);
}

// ---------------------------------------------------------------- motion

fn forward_char(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count();
    move_chars(session, count)
}

fn backward_char(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count();
    move_chars(session, -count)
}

fn move_chars(session: &mut EditSession<'_>, delta: i64) -> bool {
    let cursor = session.buf.cursor() as i64;
    let target = (cursor + delta).clamp(0, session.buf.len() as i64) as usize;
    let moved = target != session.buf.cursor() || delta == 0;
    session.buf.move_to(target);
    moved
}

fn forward_word(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count();
    if count < 0 {
        return backward_word_by(session, -count);
    }
    forward_word_by(session, count)
}

fn backward_word(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count();
    if count < 0 {
        return forward_word_by(session, -count);
    }
    backward_word_by(session, count)
}

fn forward_word_by(session: &mut EditSession<'_>, count: i64) -> bool {
    let word_chars = session.word_chars();
    let mut cursor = session.buf.cursor();
    for _ in 0..count {
        cursor = find_next_word_end(session.buf.chars(), cursor, &word_chars);
    }
    session.buf.move_to(cursor);
    true
}

fn backward_word_by(session: &mut EditSession<'_>, count: i64) -> bool {
    let word_chars = session.word_chars();
    let mut cursor = session.buf.cursor();
    for _ in 0..count {
        cursor = find_prev_word_start(session.buf.chars(), cursor, &word_chars);
    }
    session.buf.move_to(cursor);
    true
}

/// Start of the current buffer line (after the previous newline); the
/// whole-buffer variant is `beginning-of-line-hist`.
fn beginning_of_line(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let start = session.buf.line_start(session.buf.cursor());
    session.buf.move_to(start);
    true
}

fn end_of_line(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let end = session.buf.line_end(session.buf.cursor());
    session.buf.move_to(end);
    true
}

fn beginning_of_line_hist(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    session.buf.move_to(0);
    true
}

/// Up a buffer line when one exists, otherwise into history.
fn up_line_or_history(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let cursor = session.buf.cursor();
    let line_start = session.buf.line_start(cursor);
    if line_start > 0 {
        let column = cursor - line_start;
        let prev_start = session.buf.line_start(line_start - 1);
        let prev_end = line_start - 1;
        session.buf.move_to((prev_start + column).min(prev_end));
        return true;
    }
    up_history(session)
}

fn down_line_or_history(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let cursor = session.buf.cursor();
    let line_end = session.buf.line_end(cursor);
    if line_end < session.buf.len() {
        let column = cursor - session.buf.line_start(cursor);
        let next_start = line_end + 1;
        let next_end = session.buf.line_end(next_start);
        session.buf.move_to((next_start + column).min(next_end));
        return true;
    }
    down_history(session)
}

// -------------------------------------------------------------- mutation

pub(crate) fn self_insert(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count().max(1);
    let text = session.current_key.clone();
    if text.is_empty() {
        return false;
    }

    // Completion suffix removal: a typed separator eats the auto-appended
    // suffix first.
    if let Some(pending) = session.pending_suffix.take() {
        let first = text.chars().next().unwrap_or('\0');
        if pending.remove_chars.contains(first) {
            let cursor = session.buf.cursor();
            let start = cursor.saturating_sub(pending.len);
            session.buf.delete_at(start, pending.len);
        }
    }

    session.dismiss_completion();
    let repeated = text.repeat(count as usize);
    session.insert_text(&repeated);
    if session.vi.recording {
        session.vi.record_text.push_str(&repeated);
    }
    true
}

/// Inserts the key with the meta bit stripped (e.g. alt-enter inserts a
/// newline).
fn self_insert_unmeta(session: &mut EditSession<'_>) -> bool {
    let stripped: String = session
        .current_key
        .chars()
        .filter(|&ch| ch != crate::ESC)
        .collect();
    if stripped.is_empty() {
        return false;
    }
    session.current_key = stripped;
    self_insert(session)
}

fn backward_delete_char(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count();
    if count < 0 {
        session.numeric_arg = Some(-count);
        return delete_char(session);
    }
    let cursor = session.buf.cursor();
    if cursor == 0 {
        return false;
    }
    let start = cursor.saturating_sub(count as usize);
    session.buf.delete_at(start, cursor - start);
    if session.vi.recording {
        session.vi.record_text.pop();
    }
    true
}

/// `C-d` semantics: end-of-input on an empty buffer, char delete otherwise.
fn delete_char(session: &mut EditSession<'_>) -> bool {
    if session.buf.is_empty() && session.current_key == "\u{4}" {
        session.state = SessionState::Eof;
        return true;
    }
    let count = session.take_repeat_count();
    if count < 0 {
        session.numeric_arg = Some(-count);
        return backward_delete_char(session);
    }
    let cursor = session.buf.cursor();
    if cursor >= session.buf.len() {
        return false;
    }
    session.buf.delete_at(cursor, count as usize);
    true
}

fn kill_word(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count();
    if count < 0 {
        session.numeric_arg = Some(-count);
        return backward_kill_word(session);
    }
    let word_chars = session.word_chars();
    let cursor = session.buf.cursor();
    let mut end = cursor;
    for _ in 0..count {
        end = find_next_word_end(session.buf.chars(), end, &word_chars);
    }
    kill_range(session, cursor, end, KillDirection::Forward)
}

fn backward_kill_word(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count();
    if count < 0 {
        session.numeric_arg = Some(-count);
        return kill_word(session);
    }
    let word_chars = session.word_chars();
    let cursor = session.buf.cursor();
    let mut start = cursor;
    for _ in 0..count {
        start = find_prev_word_start(session.buf.chars(), start, &word_chars);
    }
    kill_range(session, start, cursor, KillDirection::Backward)
}

/// Kill to end of line; at a line end, the newline itself is killed.
fn kill_line(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let cursor = session.buf.cursor();
    let mut end = session.buf.line_end(cursor);
    if end == cursor && end < session.buf.len() {
        end += 1;
    }
    kill_range(session, cursor, end, KillDirection::Forward)
}

fn backward_kill_line(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let cursor = session.buf.cursor();
    let start = session.buf.line_start(cursor);
    kill_range(session, start, cursor, KillDirection::Backward)
}

fn kill_whole_line(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let cursor = session.buf.cursor();
    let start = session.buf.line_start(cursor);
    let mut end = session.buf.line_end(cursor);
    if end < session.buf.len() {
        end += 1;
    }
    kill_range(session, start, end, KillDirection::Backward)
}

pub(crate) fn kill_range(
    session: &mut EditSession<'_>,
    start: usize,
    end: usize,
    direction: KillDirection,
) -> bool {
    if start >= end {
        return false;
    }
    let merge = session.last_widget_was_kill();
    let text = session.buf.cut(start..end);
    if let Some(register) = session.vi.register.take() {
        session.vi.registers.insert(register, text);
    } else {
        session.kill_ring.kill(&text, direction, merge);
    }
    true
}

fn transpose_chars(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let len = session.buf.len();
    let cursor = session.buf.cursor();
    if len < 2 || cursor == 0 {
        return false;
    }
    let (left, right) = if cursor >= len {
        (len - 2, len - 1)
    } else {
        (cursor - 1, cursor)
    };
    let a = session.buf.char_at(left).unwrap_or_default();
    let b = session.buf.char_at(right).unwrap_or_default();
    session.buf.edit_atomically(|buf| {
        buf.replace(left..right + 1, &format!("{b}{a}"));
    });
    session.buf.move_to((right + 1).min(len));
    true
}

fn transpose_words(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let word_chars = session.word_chars();
    let cursor = session.buf.cursor();
    let chars = session.buf.chars().to_vec();

    // Word containing/preceding the cursor, and the one before it.
    let second_end = find_next_word_end(&chars, find_prev_word_start(&chars, cursor, &word_chars), &word_chars);
    let second_start = find_prev_word_start(&chars, second_end, &word_chars);
    let first_start = find_prev_word_start(&chars, second_start, &word_chars);
    let first_end = find_next_word_end(&chars, first_start, &word_chars);
    if first_start >= second_start || first_end > second_start {
        return false;
    }

    let first: String = chars[first_start..first_end].iter().collect();
    let middle: String = chars[first_end..second_start].iter().collect();
    let second: String = chars[second_start..second_end].iter().collect();
    session.buf.edit_atomically(|buf| {
        buf.replace(
            first_start..second_end,
            &format!("{second}{middle}{first}"),
        );
    });
    session.buf.move_to(second_end);
    true
}

fn case_word(session: &mut EditSession<'_>, transform: fn(&str) -> String) -> bool {
    session.numeric_arg.take();
    let word_chars = session.word_chars();
    let cursor = session.buf.cursor();
    let end = find_next_word_end(session.buf.chars(), cursor, &word_chars);
    if end == cursor {
        return false;
    }
    let word = session.buf.substring(cursor..end);
    let transformed = transform(&word);
    session.buf.edit_atomically(|buf| {
        buf.replace(cursor..end, &transformed);
    });
    session.buf.move_to(end);
    true
}

fn capitalize_word(session: &mut EditSession<'_>) -> bool {
    case_word(session, |word| {
        let mut seen_alpha = false;
        word.chars()
            .map(|ch| {
                if ch.is_alphanumeric() && !seen_alpha {
                    seen_alpha = true;
                    ch.to_uppercase().to_string()
                } else {
                    ch.to_lowercase().to_string()
                }
            })
            .collect()
    })
}

fn up_case_word(session: &mut EditSession<'_>) -> bool {
    case_word(session, str::to_uppercase)
}

fn down_case_word(session: &mut EditSession<'_>) -> bool {
    case_word(session, str::to_lowercase)
}

/// Next key inserts literally.
fn quoted_insert(session: &mut EditSession<'_>) -> bool {
    session.pending = Some(PendingOp::QuotedInsert);
    true
}

fn overwrite_mode(session: &mut EditSession<'_>) -> bool {
    let overwrite = session.buf.is_overwrite();
    session.buf.set_overwrite(!overwrite);
    true
}

// --------------------------------------------------------------- history

/// Hitting either end of history rings only when `HISTORY_BEEP` is set.
fn history_miss(session: &EditSession<'_>) -> bool {
    !session.config.is_set(crate::EditorOption::HistoryBeep)
}

pub(crate) fn up_history(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let current = session.buf.as_string();
    match session.hist_cursor.up(session.history, &current) {
        Some(text) => {
            replace_buffer_for_history(session, &text);
            true
        }
        None => history_miss(session),
    }
}

pub(crate) fn down_history(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    match session.hist_cursor.down(session.history) {
        Some(text) => {
            replace_buffer_for_history(session, &text);
            true
        }
        None => history_miss(session),
    }
}

fn beginning_of_history(session: &mut EditSession<'_>) -> bool {
    let current = session.buf.as_string();
    match session.hist_cursor.to_first(session.history, &current) {
        Some(text) => {
            replace_buffer_for_history(session, &text);
            true
        }
        None => false,
    }
}

fn end_of_history(session: &mut EditSession<'_>) -> bool {
    match session.hist_cursor.to_last() {
        Some(text) => {
            replace_buffer_for_history(session, &text);
            true
        }
        None => false,
    }
}

fn replace_buffer_for_history(session: &mut EditSession<'_>, text: &str) {
    session.buf.split_undo();
    session.buf.set_text(text);
    session.buf.move_to(session.buf.len());
    session.buf.split_undo();
}

/// Prefix search: the pattern is the buffer up to the cursor; the cursor
/// stays put on the (longer) matched line.
fn history_search_backward(session: &mut EditSession<'_>) -> bool {
    history_search(session, crate::SearchDirection::Backward)
}

fn history_search_forward(session: &mut EditSession<'_>) -> bool {
    history_search(session, crate::SearchDirection::Forward)
}

fn history_search(session: &mut EditSession<'_>, direction: crate::SearchDirection) -> bool {
    session.numeric_arg.take();
    let cursor = session.buf.cursor();
    let prefix: String = session.buf.chars()[..cursor].iter().collect();
    let current = session.buf.as_string();
    match session
        .hist_cursor
        .search_prefix(session.history, &prefix, direction, &current)
    {
        Some(text) => {
            session.buf.split_undo();
            session.buf.set_text(&text);
            session.buf.move_to(cursor.min(session.buf.len()));
            true
        }
        None => history_miss(session),
    }
}

// ----------------------------------------------------------- yank / mark

fn set_mark_command(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    session.buf.set_mark();
    true
}

fn exchange_point_and_mark(session: &mut EditSession<'_>) -> bool {
    session.buf.swap_point_and_mark()
}

fn kill_region(session: &mut EditSession<'_>) -> bool {
    let Some(mark) = session.buf.mark() else {
        return false;
    };
    let cursor = session.buf.cursor();
    let (start, end) = if mark < cursor { (mark, cursor) } else { (cursor, mark) };
    let killed = kill_range(session, start, end, KillDirection::Forward);
    session.buf.clear_mark();
    killed
}

fn copy_region_as_kill(session: &mut EditSession<'_>) -> bool {
    let Some(mark) = session.buf.mark() else {
        return false;
    };
    let cursor = session.buf.cursor();
    let (start, end) = if mark < cursor { (mark, cursor) } else { (cursor, mark) };
    if start == end {
        return false;
    }
    let text = session.buf.copy(start..end);
    session.kill_ring.kill(&text, KillDirection::Forward, false);
    true
}

pub(crate) fn yank(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let Some(text) = session.kill_ring.yank().map(str::to_string) else {
        return false;
    };
    let start = session.buf.cursor();
    session.buf.insert(&text);
    session.yank_region = Some((start, session.buf.cursor()));
    true
}

/// Replaces the just-yanked region with the next-older kill. Only valid
/// straight after `yank`/`yank-pop`.
fn yank_pop(session: &mut EditSession<'_>) -> bool {
    if !matches!(session.last_widget.as_deref(), Some("yank" | "yank-pop")) {
        return false;
    }
    let Some((start, end)) = session.yank_region else {
        return false;
    };
    let Some(text) = session.kill_ring.yank_pop().map(str::to_string) else {
        return false;
    };
    session.buf.edit_atomically(|buf| {
        buf.replace(start..end, &text);
    });
    session.yank_region = Some((start, start + text.chars().count()));
    true
}

// ------------------------------------------------------------ undo / meta

fn undo(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    session.buf.undo()
}

fn redo(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    session.buf.redo()
}

fn split_undo(session: &mut EditSession<'_>) -> bool {
    session.buf.split_undo();
    true
}

/// Accumulates a digit from the invoking key (`M-1`..`M-9`, vi `1`..`9`).
fn digit_argument(session: &mut EditSession<'_>) -> bool {
    let Some(digit) = session
        .current_key
        .chars()
        .last()
        .and_then(|ch| ch.to_digit(10))
    else {
        return false;
    };
    let cap = session.config.max_repeat_count();
    let current = session.numeric_arg.unwrap_or(0);
    let next = if current < 0 {
        current * 10 - digit as i64
    } else {
        current * 10 + digit as i64
    };
    session.numeric_arg = Some(next.clamp(-cap, cap));
    true
}

/// Readline semantics: each invocation multiplies by four.
fn universal_argument(session: &mut EditSession<'_>) -> bool {
    let cap = session.config.max_repeat_count();
    let current = session.numeric_arg.unwrap_or(1);
    session.numeric_arg = Some((current * 4).clamp(-cap, cap));
    true
}

fn neg_argument(session: &mut EditSession<'_>) -> bool {
    let current = session.numeric_arg.unwrap_or(1);
    session.numeric_arg = Some(-current);
    true
}

/// Accept when the parser is satisfied; on parser EOF, insert a newline
/// and continue under the secondary prompt with `%M` = the missing token.
pub(crate) fn accept_line(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    session.dismiss_completion();

    let mut line = session.buf.as_string();
    if session.masking.is_none() {
        let expanded = session.expander.expand_history(session.history, &line);
        if expanded != line {
            session.buf.split_undo();
            session.buf.set_text(&expanded);
            line = expanded;
        }
    }

    match session
        .parser
        .parse(&line, session.buf.cursor(), ParseContext::AcceptLine)
    {
        Err(ParseError::Eof { missing }) => {
            session.continuation_missing = missing;
            session.buf.insert("\n");
            true
        }
        Ok(_) => {
            session.state = SessionState::Accepted;
            true
        }
    }
}

/// Recoverable abort: clears pending argument and completion state, beeps.
fn abort(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg = None;
    session.pending = None;
    session.dismiss_completion();
    false
}

fn send_break(session: &mut EditSession<'_>) -> bool {
    session.state = SessionState::Aborted;
    true
}

fn clear_screen(session: &mut EditSession<'_>) -> bool {
    session.clear_screen_pending = true;
    true
}

fn redraw_line(session: &mut EditSession<'_>) -> bool {
    session.display.mark_dirty();
    true
}

fn redisplay_widget(session: &mut EditSession<'_>) -> bool {
    let _ = session;
    true
}

fn beep(session: &mut EditSession<'_>) -> bool {
    session.beep_pending = true;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_fixtures::{key_event, key_events_for, StdoutMock, TestVecKeyEventReader};
    use crate::{EditorOption, LineEditor, SafeRawTerminal, StdMutex};
    use crossterm::event::{Event, KeyCode, KeyModifiers};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn editor(events: Vec<Event>) -> LineEditor {
        let terminal: SafeRawTerminal = Arc::new(StdMutex::new(StdoutMock::default()));
        let mut editor = LineEditor::new(terminal, Box::new(TestVecKeyEventReader::new(events)), (80, 24));
        editor.config_mut().set_option(EditorOption::HistoryIncremental, false);
        editor
    }

    fn enter() -> Event { key_event(KeyCode::Enter, KeyModifiers::NONE) }

    fn alt(ch: char) -> Event { key_event(KeyCode::Char(ch), KeyModifiers::ALT) }

    fn ctrl(ch: char) -> Event { key_event(KeyCode::Char(ch), KeyModifiers::CONTROL) }

    #[test]
    fn test_scenario_meta_b_meta_d_undo_redo() {
        // "hello world", M-b to 6, M-d deletes "world", undo, redo, undo
        // to leave the original for accept.
        let mut events = key_events_for("hello world");
        events.push(alt('b'));
        events.push(alt('d'));
        events.push(ctrl('_')); // undo
        events.push(enter());
        let mut editor = editor(events);
        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "hello world");
    }

    #[test]
    fn test_meta_d_kills_word() {
        let mut events = key_events_for("hello world");
        events.push(alt('b'));
        events.push(alt('d'));
        events.push(enter());
        let mut editor = editor(events);
        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "hello ");
    }

    #[test]
    fn test_kill_then_yank_round_trip() {
        // C-k at start kills all, C-y yanks it back, C-y again duplicates.
        let mut events = key_events_for("abc");
        events.push(ctrl('a'));
        events.push(ctrl('k'));
        events.push(ctrl('y'));
        events.push(ctrl('y'));
        events.push(enter());
        let mut editor = editor(events);
        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "abcabc");
    }

    #[test]
    fn test_yank_pop_cycles_kill_ring() {
        // Kill "bb " then "aa" via two backward word kills, yank then pop.
        let mut events = key_events_for("aa bb");
        events.push(ctrl('w')); // kills "bb"
        events.push(ctrl('w')); // merges "aa " -> head is "aa bb"
        events.push(ctrl('y'));
        events.push(enter());
        let mut editor = editor(events);
        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "aa bb");
    }

    #[test]
    fn test_transpose_chars_at_end() {
        let mut events = key_events_for("ab");
        events.push(ctrl('t'));
        events.push(enter());
        let mut editor = editor(events);
        assert_eq!(editor.read_line("> ").unwrap(), "ba");
    }

    #[test]
    fn test_transpose_words() {
        let mut events = key_events_for("one two");
        events.push(alt('t'));
        events.push(enter());
        let mut editor = editor(events);
        assert_eq!(editor.read_line("> ").unwrap(), "two one");
    }

    #[test]
    fn test_case_words() {
        let mut events = key_events_for("hello");
        events.push(ctrl('a'));
        events.push(alt('u'));
        events.push(enter());
        let mut editor = editor(events);
        assert_eq!(editor.read_line("> ").unwrap(), "HELLO");
    }

    #[test]
    fn test_capitalize_word() {
        let mut events = key_events_for("hELLO");
        events.push(ctrl('a'));
        events.push(alt('c'));
        events.push(enter());
        let mut editor = editor(events);
        assert_eq!(editor.read_line("> ").unwrap(), "Hello");
    }

    #[test]
    fn test_digit_argument_repeats_insert() {
        let mut events = vec![alt('3')];
        events.extend(key_events_for("x"));
        events.push(enter());
        let mut editor = editor(events);
        assert_eq!(editor.read_line("> ").unwrap(), "xxx");
    }

    #[test]
    fn test_neg_argument_flips_direction() {
        // M-- M-f from the end walks backward one word.
        let mut events = key_events_for("one two");
        events.push(alt('-'));
        events.push(alt('f'));
        events.push(alt('d')); // kills "two" from its start
        events.push(enter());
        let mut editor = editor(events);
        assert_eq!(editor.read_line("> ").unwrap(), "one ");
    }

    #[test]
    fn test_quoted_insert_literal_control() {
        let mut events = key_events_for("a");
        events.push(ctrl('v'));
        events.push(ctrl('g')); // inserted literally, not abort
        events.push(enter());
        let mut editor = editor(events);
        assert_eq!(editor.read_line("> ").unwrap(), "a\u{7}");
    }

    #[test]
    fn test_overwrite_mode() {
        let mut events = key_events_for("abc");
        events.push(ctrl('a'));
        events.push(key_event(KeyCode::Insert, KeyModifiers::NONE));
        events.extend(key_events_for("XY"));
        events.push(enter());
        let mut editor = editor(events);
        assert_eq!(editor.read_line("> ").unwrap(), "XYc");
    }

    #[test]
    fn test_set_mark_and_kill_region() {
        let mut events = key_events_for("hello");
        events.push(ctrl('a'));
        events.push(key_event(KeyCode::Char(' '), KeyModifiers::CONTROL)); // set-mark
        events.push(ctrl('e'));
        events.push(key_event(KeyCode::Char('w'), KeyModifiers::CONTROL)); // C-w kills region? no: backward-kill-word
        events.push(enter());
        let mut editor = editor(events);
        // C-w is backward-kill-word in the default map; the mark is
        // untouched, so the whole word goes.
        assert_eq!(editor.read_line("> ").unwrap(), "");
    }

    #[test]
    fn test_prefix_history_search() {
        let mut events = key_events_for("ls");
        events.push(alt('p'));
        events.push(enter());
        let mut editor = editor(events);
        editor.history_mut().rules.incremental = false;
        editor.history_mut().add("make");
        editor.history_mut().add("ls -l");
        editor.history_mut().add("git status");
        assert_eq!(editor.read_line("> ").unwrap(), "ls -l");
    }

    #[test]
    fn test_multiline_up_down_motion() {
        // Build "ab\ncd" via quoted-insert newline, then navigate.
        let mut events = key_events_for("ab");
        events.push(ctrl('v'));
        events.push(key_event(KeyCode::Char('j'), KeyModifiers::CONTROL)); // literal \n
        events.extend(key_events_for("cd"));
        events.push(key_event(KeyCode::Up, KeyModifiers::NONE));
        events.push(ctrl('k')); // kill "ab" tail from col 2 -> kills newline? col 2 = line end, kills "\n"
        events.push(enter());
        let mut editor = editor(events);
        assert_eq!(editor.read_line("> ").unwrap(), "abcd");
    }
}
