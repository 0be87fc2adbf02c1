// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Key sequence encoding. Bindings are keyed by the byte sequences a
//! terminal would send, so crossterm key events are re-encoded into those
//! sequences before the keymap walk.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

pub const ESC: char = '\u{1b}';
pub const DEL: char = '\u{7f}';

/// Control-key form of `ch`: `ctrl('A')` is `"\x01"`.
#[must_use]
pub fn ctrl(ch: char) -> String {
    let upper = ch.to_ascii_uppercase();
    match upper {
        '@' | ' ' => "\0".to_string(),
        'A'..='Z' => char::from((upper as u8) & 0x1f).to_string(),
        '[' => ESC.to_string(),
        '_' | '-' => "\u{1f}".to_string(),
        '?' => DEL.to_string(),
        other => other.to_string(),
    }
}

/// Meta (alt) form: ESC prefix.
#[must_use]
pub fn alt(seq: &str) -> String { format!("{ESC}{seq}") }

/// Encodes one key event into the byte sequence the keymaps are keyed by.
/// Returns `None` for events that carry no sequence (release/repeat kinds,
/// bare modifiers).
#[must_use]
pub fn encode_key_event(event: &KeyEvent) -> Option<String> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let base = match event.code {
        KeyCode::Char(ch) => {
            if event.modifiers.contains(KeyModifiers::CONTROL) {
                ctrl(ch)
            } else {
                ch.to_string()
            }
        }
        KeyCode::Enter => "\r".to_string(),
        KeyCode::Tab => "\t".to_string(),
        KeyCode::BackTab => "\u{1b}[Z".to_string(),
        KeyCode::Backspace => DEL.to_string(),
        KeyCode::Esc => ESC.to_string(),
        KeyCode::Up => "\u{1b}[A".to_string(),
        KeyCode::Down => "\u{1b}[B".to_string(),
        KeyCode::Right => "\u{1b}[C".to_string(),
        KeyCode::Left => "\u{1b}[D".to_string(),
        KeyCode::Home => "\u{1b}[H".to_string(),
        KeyCode::End => "\u{1b}[F".to_string(),
        KeyCode::Insert => "\u{1b}[2~".to_string(),
        KeyCode::Delete => "\u{1b}[3~".to_string(),
        KeyCode::PageUp => "\u{1b}[5~".to_string(),
        KeyCode::PageDown => "\u{1b}[6~".to_string(),
        KeyCode::F(n) => encode_function_key(n)?,
        _ => return None,
    };

    // Alt wraps whatever the base sequence is with an ESC prefix, except for
    // a bare ESC itself.
    if event.modifiers.contains(KeyModifiers::ALT) && event.code != KeyCode::Esc {
        Some(alt(&base))
    } else {
        Some(base)
    }
}

fn encode_function_key(n: u8) -> Option<String> {
    let seq = match n {
        1 => "\u{1b}OP",
        2 => "\u{1b}OQ",
        3 => "\u{1b}OR",
        4 => "\u{1b}OS",
        5 => "\u{1b}[15~",
        6 => "\u{1b}[17~",
        7 => "\u{1b}[18~",
        8 => "\u{1b}[19~",
        9 => "\u{1b}[20~",
        10 => "\u{1b}[21~",
        11 => "\u{1b}[23~",
        12 => "\u{1b}[24~",
        _ => return None,
    };
    Some(seq.to_string())
}

/// Renders a sequence in caret notation for diagnostics (`"^A"`, `"^[b"`).
#[must_use]
pub fn display_seq(seq: &str) -> String {
    let mut out = String::new();
    for ch in seq.chars() {
        match ch {
            ESC => out.push_str("^["),
            DEL => out.push_str("^?"),
            c if (c as u32) < 0x20 => {
                out.push('^');
                out.push(char::from((c as u8) + 0x40));
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_encoding() {
        assert_eq!(ctrl('a'), "\u{1}");
        assert_eq!(ctrl('A'), "\u{1}");
        assert_eq!(ctrl('@'), "\0");
        assert_eq!(ctrl('_'), "\u{1f}");
    }

    #[test]
    fn test_encode_plain_and_modified() {
        let plain = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(encode_key_event(&plain), Some("x".to_string()));

        let ctrl_a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(encode_key_event(&ctrl_a), Some("\u{1}".to_string()));

        let alt_b = KeyEvent::new(KeyCode::Char('b'), KeyModifiers::ALT);
        assert_eq!(encode_key_event(&alt_b), Some("\u{1b}b".to_string()));

        let up = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(encode_key_event(&up), Some("\u{1b}[A".to_string()));
    }

    #[test]
    fn test_display_seq_caret_notation() {
        assert_eq!(display_seq("\u{1}"), "^A");
        assert_eq!(display_seq("\u{1b}b"), "^[b");
        assert_eq!(display_seq("abc"), "abc");
    }
}
