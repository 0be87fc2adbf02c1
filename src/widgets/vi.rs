// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Vi command/insert/visual editing: motions, operators with pending
//! state, find-char with repeat, named registers, and `.` repeat of the
//! last change. Mode is the active keymap; operators ride `ViState`
//! between keys.

use crate::{find_next_word_end, find_next_word_start, find_prev_word_start, DecodedInput,
            EditSession, KeyMaps, KillDirection, PendingOp, RegionType, SearchDirection,
            WidgetRegistry};
use std::collections::HashMap;

/// Character search kinds (`f`, `F`, `t`, `T`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FindKind {
    Next,
    Prev,
    NextSkip,
    PrevSkip,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViOperator {
    Delete,
    Change,
    Yank,
}

/// The last buffer-changing command, replayed by `.`.
#[derive(Debug, Clone)]
pub enum LastChange {
    InsertText { text: String },
    DeleteChars { count: usize },
    BackDeleteChars { count: usize },
    ReplaceChars { count: usize, ch: char },
    SwapCase { count: usize },
    Put { after: bool, text: String },
    Operator {
        op: ViOperator,
        span: usize,
        forward: bool,
        insert_text: String,
    },
}

/// Cross-key vi state carried on the session.
#[derive(Debug, Default)]
pub struct ViState {
    /// Register selected by `"x`, consumed by the next kill/put.
    pub register: Option<char>,
    pub registers: HashMap<char, String>,
    /// Operator awaiting its motion (`d`, `c`, `y`).
    pub pending_op: Option<ViOperator>,
    pub last_find: Option<(FindKind, char)>,
    pub last_change: Option<LastChange>,
    /// Insert-mode keystroke recording for `.`.
    pub recording: bool,
    pub record_text: String,
    /// Last incremental search, for `n`/`N`.
    pub last_search: Option<(String, SearchDirection)>,
}

pub(crate) fn register_vi_widgets(registry: &mut WidgetRegistry) {
    registry.register("vi-cmd-mode", vi_cmd_mode);
    registry.register("vi-insert", vi_insert);
    registry.register("vi-insert-bol", vi_insert_bol);
    registry.register("vi-add-next", vi_add_next);
    registry.register("vi-add-eol", vi_add_eol);

    registry.register("vi-first-non-blank", vi_first_non_blank);
    registry.register("vi-digit-or-beginning-of-line", vi_digit_or_beginning_of_line);
    registry.register("vi-goto-column", vi_goto_column);
    registry.register("vi-forward-word", vi_forward_word);
    registry.register("vi-backward-word", vi_backward_word);
    registry.register("vi-forward-word-end", vi_forward_word_end);
    registry.register("vi-forward-blank-word", vi_forward_blank_word);
    registry.register("vi-backward-blank-word", vi_backward_blank_word);
    registry.register("vi-forward-blank-word-end", vi_forward_blank_word_end);
    registry.register("vi-find-next-char", |s| start_find(s, FindKind::Next));
    registry.register("vi-find-prev-char", |s| start_find(s, FindKind::Prev));
    registry.register("vi-find-next-char-skip", |s| start_find(s, FindKind::NextSkip));
    registry.register("vi-find-prev-char-skip", |s| start_find(s, FindKind::PrevSkip));
    registry.register("vi-repeat-find", vi_repeat_find);
    registry.register("vi-rev-repeat-find", vi_rev_repeat_find);

    registry.register("vi-delete", |s| start_operator(s, ViOperator::Delete));
    registry.register("vi-change", |s| start_operator(s, ViOperator::Change));
    registry.register("vi-yank", |s| start_operator(s, ViOperator::Yank));
    registry.register("vi-delete-char", vi_delete_char);
    registry.register("vi-backward-delete-char", vi_backward_delete_char);
    registry.register("vi-replace-chars", vi_replace_chars);
    registry.register("vi-replace", vi_replace);
    registry.register("vi-substitute", vi_substitute);
    registry.register("vi-swap-case", vi_swap_case);
    registry.register("vi-change-eol", vi_change_eol);
    registry.register("vi-change-whole-line", vi_change_whole_line);
    registry.register("vi-yank-whole-line", vi_yank_whole_line);
    registry.register("vi-put-after", |s| vi_put(s, true));
    registry.register("vi-put-before", |s| vi_put(s, false));
    registry.register("vi-set-buffer", vi_set_buffer);
    registry.register("vi-repeat-change", vi_repeat_change);

    registry.register("visual-mode", visual_mode);
    registry.register("visual-line-mode", visual_line_mode);
    registry.register("vi-visual-delete", |s| visual_operate(s, ViOperator::Delete));
    registry.register("vi-visual-yank", |s| visual_operate(s, ViOperator::Yank));
    registry.register("vi-visual-change", |s| visual_operate(s, ViOperator::Change));
}

// ----------------------------------------------------------------- modes

/// Leave insert/visual for command mode. From insert the cursor steps
/// left (vi convention) and any change recording is finalized.
fn vi_cmd_mode(session: &mut EditSession<'_>) -> bool {
    let from_insert = session.keymaps.active_name() == KeyMaps::VI_INSERT
        || session.keymaps.active_name() == KeyMaps::EMACS;
    if session.keymaps.active_name() == KeyMaps::VISUAL {
        session.buf.clear_mark();
    }
    finish_recording(session);
    session.vi.pending_op = None;
    let _ = session.keymaps.select(KeyMaps::VI_CMD);
    if from_insert {
        let cursor = session.buf.cursor();
        let line_start = session.buf.line_start(cursor);
        if cursor > line_start {
            session.buf.move_to(cursor - 1);
        }
    }
    true
}

fn enter_insert(session: &mut EditSession<'_>, record: Option<LastChange>) {
    if let Some(change) = record {
        session.vi.last_change = Some(change);
    }
    session.vi.recording = true;
    session.vi.record_text.clear();
    let _ = session.keymaps.select(KeyMaps::VI_INSERT);
}

fn finish_recording(session: &mut EditSession<'_>) {
    if !session.vi.recording {
        return;
    }
    session.vi.recording = false;
    let text = std::mem::take(&mut session.vi.record_text);
    match &mut session.vi.last_change {
        Some(LastChange::InsertText { text: slot })
        | Some(LastChange::Operator { insert_text: slot, .. }) => {
            *slot = text;
        }
        _ => {
            if !text.is_empty() {
                session.vi.last_change = Some(LastChange::InsertText { text });
            }
        }
    }
}

fn vi_insert(session: &mut EditSession<'_>) -> bool {
    // With an operator pending, `i` prefixes an inner text object (diw).
    if session.vi.pending_op.is_some() {
        session.pending = Some(PendingOp::ViTextObject { around: false });
        return true;
    }
    session.numeric_arg.take();
    enter_insert(session, Some(LastChange::InsertText { text: String::new() }));
    true
}

fn vi_insert_bol(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let _ = vi_first_non_blank(session);
    enter_insert(session, Some(LastChange::InsertText { text: String::new() }));
    true
}

fn vi_add_next(session: &mut EditSession<'_>) -> bool {
    // With an operator pending, `a` prefixes an around text object (daw).
    if session.vi.pending_op.is_some() {
        session.pending = Some(PendingOp::ViTextObject { around: true });
        return true;
    }
    session.numeric_arg.take();
    let cursor = session.buf.cursor();
    let line_end = session.buf.line_end(cursor);
    session.buf.move_to((cursor + 1).min(line_end));
    enter_insert(session, Some(LastChange::InsertText { text: String::new() }));
    true
}

fn vi_add_eol(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let end = session.buf.line_end(session.buf.cursor());
    session.buf.move_to(end);
    enter_insert(session, Some(LastChange::InsertText { text: String::new() }));
    true
}

// --------------------------------------------------------------- motions

/// Routes a motion target: move the cursor, or feed the pending operator.
/// `inclusive` motions take the target character too.
fn apply_motion(session: &mut EditSession<'_>, target: usize, inclusive: bool) -> bool {
    let cursor = session.buf.cursor();
    let Some(op) = session.vi.pending_op.take() else {
        session.buf.move_to(target);
        return true;
    };
    let (start, end) = if target >= cursor {
        (cursor, (target + usize::from(inclusive)).min(session.buf.len()))
    } else {
        (target, cursor)
    };
    if start == end {
        return false;
    }
    operate(session, op, start, end, target >= cursor)
}

fn operate(
    session: &mut EditSession<'_>,
    op: ViOperator,
    start: usize,
    end: usize,
    forward: bool,
) -> bool {
    let span = end - start;
    match op {
        ViOperator::Yank => {
            let text = session.buf.copy(start..end);
            store_kill(session, &text, KillDirection::Forward, false);
            session.buf.move_to(start);
            true
        }
        ViOperator::Delete => {
            let merge = session.last_widget_was_kill();
            let text = session.buf.cut(start..end);
            store_kill(session, &text, KillDirection::Forward, merge);
            session.vi.last_change = Some(LastChange::Operator {
                op,
                span,
                forward,
                insert_text: String::new(),
            });
            true
        }
        ViOperator::Change => {
            let text = session.buf.cut(start..end);
            store_kill(session, &text, KillDirection::Forward, false);
            session.vi.last_change = Some(LastChange::Operator {
                op,
                span,
                forward,
                insert_text: String::new(),
            });
            enter_insert(session, None);
            true
        }
    }
}

fn store_kill(session: &mut EditSession<'_>, text: &str, direction: KillDirection, merge: bool) {
    if text.is_empty() {
        return;
    }
    if let Some(register) = session.vi.register.take() {
        session.vi.registers.insert(register, text.to_string());
    } else {
        session.kill_ring.kill(text, direction, merge);
    }
}

fn vi_first_non_blank(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let start = session.buf.line_start(session.buf.cursor());
    let end = session.buf.line_end(session.buf.cursor());
    let mut idx = start;
    while idx < end
        && session
            .buf
            .char_at(idx)
            .is_some_and(char::is_whitespace)
    {
        idx += 1;
    }
    apply_motion(session, idx, false)
}

/// `0` is a digit when an argument is pending, line start otherwise.
fn vi_digit_or_beginning_of_line(session: &mut EditSession<'_>) -> bool {
    if let Some(arg) = session.numeric_arg {
        let cap = session.config.max_repeat_count();
        session.numeric_arg = Some((arg * 10).clamp(-cap, cap));
        return true;
    }
    let start = session.buf.line_start(session.buf.cursor());
    apply_motion(session, start, false)
}

fn vi_goto_column(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count().max(1) as usize;
    let start = session.buf.line_start(session.buf.cursor());
    let end = session.buf.line_end(session.buf.cursor());
    apply_motion(session, (start + count - 1).min(end), false)
}

fn vi_forward_word(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count().max(1);
    let word_chars = session.word_chars();
    let mut target = session.buf.cursor();
    // `cw` acts to the end of the word, not onto the next one.
    if session.vi.pending_op == Some(ViOperator::Change) {
        for _ in 0..count {
            target = find_next_word_end(session.buf.chars(), target, &word_chars);
        }
        return apply_motion(session, target, false);
    }
    for _ in 0..count {
        target = find_next_word_start(session.buf.chars(), target, &word_chars);
    }
    apply_motion(session, target, false)
}

fn vi_backward_word(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count().max(1);
    let word_chars = session.word_chars();
    let mut target = session.buf.cursor();
    for _ in 0..count {
        target = find_prev_word_start(session.buf.chars(), target, &word_chars);
    }
    apply_motion(session, target, false)
}

fn vi_forward_word_end(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count().max(1);
    let word_chars = session.word_chars();
    let mut end = session.buf.cursor();
    for _ in 0..count {
        end = find_next_word_end(session.buf.chars(), end, &word_chars);
    }
    let target = end.saturating_sub(1).max(session.buf.cursor());
    apply_motion(session, target, true)
}

fn vi_forward_blank_word(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count().max(1);
    let chars = session.buf.chars().to_vec();
    let mut target = session.buf.cursor();
    for _ in 0..count {
        while target < chars.len() && !chars[target].is_whitespace() {
            target += 1;
        }
        while target < chars.len() && chars[target].is_whitespace() {
            target += 1;
        }
    }
    apply_motion(session, target, false)
}

fn vi_backward_blank_word(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count().max(1);
    let chars = session.buf.chars().to_vec();
    let mut target = session.buf.cursor();
    for _ in 0..count {
        while target > 0 && chars[target - 1].is_whitespace() {
            target -= 1;
        }
        while target > 0 && !chars[target - 1].is_whitespace() {
            target -= 1;
        }
    }
    apply_motion(session, target, false)
}

fn vi_forward_blank_word_end(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count().max(1);
    let chars = session.buf.chars().to_vec();
    let mut target = session.buf.cursor();
    for _ in 0..count {
        target += 1;
        while target < chars.len() && chars[target].is_whitespace() {
            target += 1;
        }
        while target + 1 < chars.len() && !chars[target + 1].is_whitespace() {
            target += 1;
        }
    }
    apply_motion(session, target.min(chars.len().saturating_sub(1)), true)
}

// ----------------------------------------------------------- char search

fn start_find(session: &mut EditSession<'_>, kind: FindKind) -> bool {
    session.pending = Some(PendingOp::ViFind(kind));
    true
}

fn run_find(session: &mut EditSession<'_>, kind: FindKind, ch: char, remember: bool) -> bool {
    if remember {
        session.vi.last_find = Some((kind, ch));
    }
    let count = session.take_repeat_count().max(1) as usize;
    let chars = session.buf.chars().to_vec();
    let cursor = session.buf.cursor();
    let line_start = session.buf.line_start(cursor);
    let line_end = session.buf.line_end(cursor);

    match kind {
        FindKind::Next | FindKind::NextSkip => {
            let mut found = cursor;
            let mut remaining = count;
            let mut idx = cursor + 1;
            while idx < line_end {
                if chars[idx] == ch {
                    remaining -= 1;
                    if remaining == 0 {
                        found = idx;
                        break;
                    }
                }
                idx += 1;
            }
            if found == cursor {
                return false;
            }
            let target = if kind == FindKind::NextSkip { found - 1 } else { found };
            apply_motion(session, target, true)
        }
        FindKind::Prev | FindKind::PrevSkip => {
            let mut found = cursor;
            let mut remaining = count;
            let mut idx = cursor;
            while idx > line_start {
                idx -= 1;
                if chars[idx] == ch {
                    remaining -= 1;
                    if remaining == 0 {
                        found = idx;
                        break;
                    }
                }
            }
            if found == cursor {
                return false;
            }
            let target = if kind == FindKind::PrevSkip { found + 1 } else { found };
            apply_motion(session, target, false)
        }
    }
}

fn vi_repeat_find(session: &mut EditSession<'_>) -> bool {
    match session.vi.last_find {
        Some((kind, ch)) => run_find(session, kind, ch, false),
        None => false,
    }
}

fn vi_rev_repeat_find(session: &mut EditSession<'_>) -> bool {
    let Some((kind, ch)) = session.vi.last_find else {
        return false;
    };
    let reversed = match kind {
        FindKind::Next => FindKind::Prev,
        FindKind::Prev => FindKind::Next,
        FindKind::NextSkip => FindKind::PrevSkip,
        FindKind::PrevSkip => FindKind::NextSkip,
    };
    run_find(session, reversed, ch, false)
}

// -------------------------------------------------------------- operators

fn start_operator(session: &mut EditSession<'_>, op: ViOperator) -> bool {
    // Doubled operator (dd/cc/yy) works the whole line.
    if session.vi.pending_op == Some(op) {
        session.vi.pending_op = None;
        return operate_whole_line(session, op);
    }
    session.vi.pending_op = Some(op);
    true
}

fn operate_whole_line(session: &mut EditSession<'_>, op: ViOperator) -> bool {
    session.numeric_arg.take();
    let cursor = session.buf.cursor();
    let start = session.buf.line_start(cursor);
    let mut end = session.buf.line_end(cursor);
    if op != ViOperator::Change && end < session.buf.len() {
        end += 1; // take the newline with the line
    }
    if start == end && op != ViOperator::Change {
        return false;
    }
    operate(session, op, start, end, true)
}

fn vi_delete_char(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count().max(1) as usize;
    let cursor = session.buf.cursor();
    let end = (cursor + count).min(session.buf.line_end(cursor));
    if end == cursor {
        return false;
    }
    let merge = session.last_widget_was_kill();
    let text = session.buf.cut(cursor..end);
    store_kill(session, &text, KillDirection::Forward, merge);
    session.vi.last_change = Some(LastChange::DeleteChars { count });
    true
}

fn vi_backward_delete_char(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count().max(1) as usize;
    let cursor = session.buf.cursor();
    let start = cursor
        .saturating_sub(count)
        .max(session.buf.line_start(cursor));
    if start == cursor {
        return false;
    }
    let text = session.buf.cut(start..cursor);
    store_kill(session, &text, KillDirection::Backward, false);
    session.vi.last_change = Some(LastChange::BackDeleteChars { count });
    true
}

fn vi_replace_chars(session: &mut EditSession<'_>) -> bool {
    session.pending = Some(PendingOp::ViReplace);
    true
}

fn run_replace_chars(session: &mut EditSession<'_>, ch: char) -> bool {
    let count = session.take_repeat_count().max(1) as usize;
    let cursor = session.buf.cursor();
    let end = cursor + count;
    if end > session.buf.line_end(cursor) {
        return false;
    }
    let replacement = ch.to_string().repeat(count);
    session.buf.edit_atomically(|buf| {
        buf.replace(cursor..end, &replacement);
    });
    session.buf.move_to(end - 1);
    session.vi.last_change = Some(LastChange::ReplaceChars { count, ch });
    true
}

/// `R`: overwrite until mode exit.
fn vi_replace(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    session.buf.set_overwrite(true);
    enter_insert(session, Some(LastChange::InsertText { text: String::new() }));
    true
}

fn vi_substitute(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count().max(1) as usize;
    let cursor = session.buf.cursor();
    let end = (cursor + count).min(session.buf.line_end(cursor));
    if end > cursor {
        let text = session.buf.cut(cursor..end);
        store_kill(session, &text, KillDirection::Forward, false);
    }
    session.vi.last_change = Some(LastChange::Operator {
        op: ViOperator::Change,
        span: end - cursor,
        forward: true,
        insert_text: String::new(),
    });
    enter_insert(session, None);
    true
}

fn vi_swap_case(session: &mut EditSession<'_>) -> bool {
    let count = session.take_repeat_count().max(1) as usize;
    let cursor = session.buf.cursor();
    let end = (cursor + count).min(session.buf.line_end(cursor));
    if end == cursor {
        return false;
    }
    let swapped: String = session
        .buf
        .substring(cursor..end)
        .chars()
        .map(|ch| {
            if ch.is_uppercase() {
                ch.to_lowercase().to_string()
            } else {
                ch.to_uppercase().to_string()
            }
        })
        .collect();
    session.buf.edit_atomically(|buf| {
        buf.replace(cursor..end, &swapped);
    });
    session.buf.move_to(end.min(session.buf.len()));
    session.vi.last_change = Some(LastChange::SwapCase { count });
    true
}

fn vi_change_eol(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let cursor = session.buf.cursor();
    let end = session.buf.line_end(cursor);
    if end > cursor {
        let text = session.buf.cut(cursor..end);
        store_kill(session, &text, KillDirection::Forward, false);
    }
    session.vi.last_change = Some(LastChange::Operator {
        op: ViOperator::Change,
        span: 0,
        forward: true,
        insert_text: String::new(),
    });
    enter_insert(session, None);
    true
}

fn vi_change_whole_line(session: &mut EditSession<'_>) -> bool {
    session.vi.pending_op = None;
    let cursor = session.buf.cursor();
    let start = session.buf.line_start(cursor);
    let end = session.buf.line_end(cursor);
    if end > start {
        let text = session.buf.cut(start..end);
        store_kill(session, &text, KillDirection::Forward, false);
    }
    enter_insert(session, None);
    true
}

fn vi_yank_whole_line(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let cursor = session.buf.cursor();
    let start = session.buf.line_start(cursor);
    let mut end = session.buf.line_end(cursor);
    if end < session.buf.len() {
        end += 1;
    }
    let text = session.buf.copy(start..end);
    store_kill(session, &text, KillDirection::Forward, false);
    true
}

fn vi_put(session: &mut EditSession<'_>, after: bool) -> bool {
    session.numeric_arg.take();
    let text = match session.vi.register.take() {
        Some(register) => session.vi.registers.get(&register).cloned(),
        None => session.kill_ring.yank().map(str::to_string),
    };
    let Some(text) = text else {
        return false;
    };
    if after {
        let cursor = session.buf.cursor();
        let line_end = session.buf.line_end(cursor);
        session.buf.move_to((cursor + 1).min(line_end));
    }
    session.buf.insert(&text);
    session.vi.last_change = Some(LastChange::Put {
        after,
        text: text.clone(),
    });
    true
}

fn vi_set_buffer(session: &mut EditSession<'_>) -> bool {
    session.pending = Some(PendingOp::ViRegister);
    true
}

/// `.`: replays the recorded change at the current cursor.
fn vi_repeat_change(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let Some(change) = session.vi.last_change.clone() else {
        return false;
    };
    match change {
        LastChange::InsertText { text } => {
            if text.is_empty() {
                return false;
            }
            session.buf.split_undo();
            session.buf.insert(&text);
            true
        }
        LastChange::DeleteChars { count } => {
            session.numeric_arg = Some(count as i64);
            vi_delete_char(session)
        }
        LastChange::BackDeleteChars { count } => {
            session.numeric_arg = Some(count as i64);
            vi_backward_delete_char(session)
        }
        LastChange::ReplaceChars { count, ch } => {
            session.numeric_arg = Some(count as i64);
            run_replace_chars(session, ch)
        }
        LastChange::SwapCase { count } => {
            session.numeric_arg = Some(count as i64);
            vi_swap_case(session)
        }
        LastChange::Put { after, text } => {
            if after {
                let cursor = session.buf.cursor();
                let line_end = session.buf.line_end(cursor);
                session.buf.move_to((cursor + 1).min(line_end));
            }
            session.buf.split_undo();
            session.buf.insert(&text);
            true
        }
        LastChange::Operator {
            op,
            span,
            forward,
            insert_text,
        } => {
            let cursor = session.buf.cursor();
            let (start, end) = if forward {
                (cursor, (cursor + span).min(session.buf.len()))
            } else {
                (cursor.saturating_sub(span), cursor)
            };
            if span > 0 && start == end {
                return false;
            }
            session.buf.split_undo();
            match op {
                ViOperator::Delete => {
                    let text = session.buf.cut(start..end);
                    store_kill(session, &text, KillDirection::Forward, false);
                }
                ViOperator::Change => {
                    if end > start {
                        let text = session.buf.cut(start..end);
                        store_kill(session, &text, KillDirection::Forward, false);
                    }
                    session.buf.insert(&insert_text);
                }
                ViOperator::Yank => {
                    let text = session.buf.copy(start..end);
                    store_kill(session, &text, KillDirection::Forward, false);
                }
            }
            true
        }
    }
}

// ----------------------------------------------------------------- visual

fn visual_mode(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    session.buf.set_mark();
    session.buf.set_region_type(RegionType::Char);
    let _ = session.keymaps.select(KeyMaps::VISUAL);
    true
}

fn visual_line_mode(session: &mut EditSession<'_>) -> bool {
    session.numeric_arg.take();
    let start = session.buf.line_start(session.buf.cursor());
    let cursor = session.buf.cursor();
    session.buf.move_to(start);
    session.buf.set_mark();
    session.buf.set_region_type(RegionType::Line);
    session.buf.move_to(cursor);
    let _ = session.keymaps.select(KeyMaps::VISUAL);
    true
}

fn visual_operate(session: &mut EditSession<'_>, op: ViOperator) -> bool {
    let Some(mark) = session.buf.mark() else {
        let _ = session.keymaps.select(KeyMaps::VI_CMD);
        return false;
    };
    let cursor = session.buf.cursor();
    let (mut start, mut end) = if mark <= cursor { (mark, cursor + 1) } else { (cursor, mark + 1) };
    end = end.min(session.buf.len());
    if session.buf.region_type() == RegionType::Line {
        start = session.buf.line_start(start);
        end = session.buf.line_end(end.min(session.buf.len()));
        if end < session.buf.len() {
            end += 1;
        }
    }
    session.buf.clear_mark();
    let _ = session.keymaps.select(KeyMaps::VI_CMD);
    if start >= end {
        return false;
    }
    operate(session, op, start, end, true)
}

// ---------------------------------------------------- pending-key routing

fn raw_char_of(input: &DecodedInput) -> Option<char> {
    match input {
        DecodedInput::SelfInsert(ch) => Some(*ch),
        DecodedInput::Bound { seq, .. } => seq.chars().next(),
        DecodedInput::Undefined(seq) => seq.chars().next(),
        DecodedInput::Paste(_) | DecodedInput::Resize(_) => None,
    }
}

/// Feeds the next literal key to the widget that asked for it
/// (`quoted-insert`, `f`/`F`/`t`/`T`, `"`, `r`).
pub(crate) fn handle_pending_op(session: &mut EditSession<'_>, input: &DecodedInput) {
    let Some(op) = session.pending.take() else {
        return;
    };
    let Some(ch) = raw_char_of(input) else {
        session.beep_pending = true;
        return;
    };
    let ok = match op {
        PendingOp::QuotedInsert => {
            let count = session.take_repeat_count().max(1) as usize;
            session.insert_text(&ch.to_string().repeat(count));
            if session.vi.recording {
                session.vi.record_text.push(ch);
            }
            true
        }
        PendingOp::ViFind(kind) => run_find(session, kind, ch, true),
        PendingOp::ViRegister => {
            if ch.is_ascii_alphanumeric() {
                session.vi.register = Some(ch);
                true
            } else {
                false
            }
        }
        PendingOp::ViReplace => run_replace_chars(session, ch),
        PendingOp::ViTextObject { around } => run_text_object(session, ch, around),
    };
    if !ok {
        session.beep_pending = true;
    }
}

/// Resolves `iw`/`aw` (and their blank-word variants) into a span and
/// feeds the pending operator. Around objects take trailing whitespace.
fn run_text_object(session: &mut EditSession<'_>, object: char, around: bool) -> bool {
    let Some(op) = session.vi.pending_op.take() else {
        return false;
    };
    let cursor = session.buf.cursor();
    let chars = session.buf.chars().to_vec();
    let span = match object {
        'w' => crate::word_at(&chars, cursor, &session.word_chars()),
        'W' => blank_word_at(&chars, cursor),
        _ => None,
    };
    let Some((start, mut end)) = span else {
        return false;
    };
    if around {
        while end < chars.len() && chars[end] == ' ' {
            end += 1;
        }
    }
    session.buf.move_to(start);
    operate(session, op, start, end, true)
}

fn blank_word_at(chars: &[char], cursor: usize) -> Option<(usize, usize)> {
    let len = chars.len();
    let mut idx = cursor.min(len);
    if idx == len || chars[idx].is_whitespace() {
        if idx == 0 || chars[idx - 1].is_whitespace() {
            return None;
        }
        idx -= 1;
    }
    let mut start = idx;
    while start > 0 && !chars[start - 1].is_whitespace() {
        start -= 1;
    }
    let mut end = idx + 1;
    while end < len && !chars[end].is_whitespace() {
        end += 1;
    }
    Some((start, end))
}
