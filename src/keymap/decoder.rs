// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Turns terminal events into widget dispatches: a longest-match walk
//! through the active keymap, with an ambiguity deadline for sequences that
//! are both complete and a prefix of something longer. Macro expansions are
//! replayed as characters pushed back at the head of the stream.

use crate::{encode_key_event, Binding, KeyMap, Lookup, Size};
use crossterm::event::Event;
use std::{collections::VecDeque, io, time::Duration};

/// Input seam: one key event per call, with an optional deadline. `None`
/// means the deadline expired without input.
pub trait KeyEventReader {
    fn read_key_event(&mut self, deadline: Option<Duration>) -> io::Result<Option<Event>>;
}

/// Production reader on top of crossterm's sync poll/read pair.
#[derive(Debug)]
pub struct CrosstermKeyEventReader;

impl KeyEventReader for CrosstermKeyEventReader {
    fn read_key_event(&mut self, deadline: Option<Duration>) -> io::Result<Option<Event>> {
        match deadline {
            Some(timeout) => {
                if crossterm::event::poll(timeout)? {
                    Ok(Some(crossterm::event::read()?))
                } else {
                    Ok(None)
                }
            }
            None => Ok(Some(crossterm::event::read()?)),
        }
    }
}

/// One decoded unit of input, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedInput {
    /// A bound sequence. The sequence is kept for `self-insert`-style
    /// widgets that need the literal key.
    Bound { seq: String, binding: Binding },
    /// Unmatched printable input in a keymap with a `self-insert` default.
    SelfInsert(char),
    /// Unmatched input in a keymap without a default.
    Undefined(String),
    /// Bracketed paste payload, inserted atomically.
    Paste(String),
    Resize(Size),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RawItem {
    Char(char),
    Paste(String),
    Resize(Size),
}

#[derive(Debug)]
pub struct InputDecoder {
    queue: VecDeque<RawItem>,
    /// Sequence consumed so far in the current walk.
    walk: String,
    /// Longest complete binding seen during the walk: `(char count, binding)`.
    last_complete: Option<(usize, Binding)>,
    /// Set while waiting out an ambiguous binding.
    ambiguous: bool,
    pub ambiguous_timeout: Duration,
}

impl InputDecoder {
    pub const DEFAULT_AMBIGUOUS_TIMEOUT_MS: u64 = 1_000;

    #[must_use]
    pub fn new(ambiguous_timeout: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            walk: String::new(),
            last_complete: None,
            ambiguous: false,
            ambiguous_timeout,
        }
    }

    /// Deadline the next terminal read should honor: only set while an
    /// ambiguous walk is pending.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.ambiguous.then_some(self.ambiguous_timeout)
    }

    #[must_use]
    pub fn has_pending(&self) -> bool { !self.queue.is_empty() || !self.walk.is_empty() }

    /// Feeds one terminal event into the queue.
    pub fn feed(&mut self, event: &Event) {
        match event {
            Event::Key(key_event) => {
                if let Some(seq) = encode_key_event(key_event) {
                    self.queue.extend(seq.chars().map(RawItem::Char));
                }
            }
            Event::Paste(text) => self.queue.push_back(RawItem::Paste(text.clone())),
            Event::Resize(cols, rows) => {
                self.queue.push_back(RawItem::Resize(Size::new(*cols, *rows)));
            }
            _ => {}
        }
    }

    /// Replays a macro expansion at the head of the stream.
    pub fn push_macro(&mut self, expansion: &str) {
        for ch in expansion.chars().rev() {
            self.queue.push_front(RawItem::Char(ch));
        }
    }

    /// Pulls the next raw character, bypassing the keymap walk. Used by
    /// sub-states that read literal keys (`quoted-insert`, vi find-char).
    #[must_use]
    pub fn next_raw_char(&mut self) -> Option<char> {
        // Any interrupted walk is replayed first.
        if !self.walk.is_empty() {
            let mut chars: Vec<char> = self.walk.chars().collect();
            self.walk.clear();
            self.last_complete = None;
            self.ambiguous = false;
            let first = chars.remove(0);
            for ch in chars.into_iter().rev() {
                self.queue.push_front(RawItem::Char(ch));
            }
            return Some(first);
        }
        match self.queue.front() {
            Some(RawItem::Char(_)) => match self.queue.pop_front() {
                Some(RawItem::Char(ch)) => Some(ch),
                _ => None,
            },
            _ => None,
        }
    }

    /// Advances the walk with whatever is queued. Returns `None` when more
    /// input is needed (the caller reads the terminal, honoring
    /// [`Self::deadline`], then calls [`Self::feed`] or [`Self::on_timeout`]).
    pub fn poll(&mut self, keymap: &KeyMap) -> Option<DecodedInput> {
        loop {
            // Non-character items pass through between walks; mid-walk they
            // force resolution of whatever has matched so far.
            match self.queue.front() {
                Some(RawItem::Paste(_) | RawItem::Resize(_)) => {
                    if self.walk.is_empty() {
                        return Some(match self.queue.pop_front() {
                            Some(RawItem::Paste(text)) => DecodedInput::Paste(text),
                            Some(RawItem::Resize(size)) => DecodedInput::Resize(size),
                            _ => unreachable!(),
                        });
                    }
                    return self.resolve_walk(keymap);
                }
                Some(RawItem::Char(_)) => {}
                None => return None,
            }

            let Some(RawItem::Char(ch)) = self.queue.pop_front() else {
                return None;
            };
            self.walk.push(ch);
            self.ambiguous = false;

            match keymap.lookup(&self.walk) {
                Lookup::Complete(binding) => {
                    let seq = std::mem::take(&mut self.walk);
                    self.last_complete = None;
                    return Some(DecodedInput::Bound { seq, binding });
                }
                Lookup::CompleteAndPrefix(binding) => {
                    self.last_complete = Some((self.walk.chars().count(), binding));
                    if self.queue.is_empty() {
                        self.ambiguous = true;
                        return None;
                    }
                    // More input queued: the next character disambiguates.
                }
                Lookup::Prefix => {
                    if self.queue.is_empty() {
                        return None;
                    }
                }
                Lookup::NotFound => {
                    return self.resolve_walk(keymap);
                }
            }
        }
    }

    /// Ambiguity timer fired: emit the short match and replay the residue.
    pub fn on_timeout(&mut self, keymap: &KeyMap) -> Option<DecodedInput> {
        self.ambiguous = false;
        if self.last_complete.is_some() {
            self.resolve_walk(keymap)
        } else {
            None
        }
    }

    /// Emits the last complete match (replaying the residue), or falls back
    /// to self-insert / undefined-key for the first walked character.
    fn resolve_walk(&mut self, keymap: &KeyMap) -> Option<DecodedInput> {
        let walk: Vec<char> = std::mem::take(&mut self.walk).chars().collect();
        self.ambiguous = false;

        if let Some((matched_len, binding)) = self.last_complete.take() {
            for &ch in walk[matched_len..].iter().rev() {
                self.queue.push_front(RawItem::Char(ch));
            }
            let seq: String = walk[..matched_len].iter().collect();
            return Some(DecodedInput::Bound { seq, binding });
        }

        // No match at all: the first character resolves on its own, the rest
        // replays.
        let first = walk.first().copied()?;
        for &ch in walk[1..].iter().rev() {
            self.queue.push_front(RawItem::Char(ch));
        }
        match keymap.default_binding() {
            Some(_) => Some(DecodedInput::SelfInsert(first)),
            None => Some(DecodedInput::Undefined(first.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{emacs_keymap, vi_insert_keymap, Binding};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn feed_chars(decoder: &mut InputDecoder, text: &str) {
        for ch in text.chars() {
            decoder.feed(&Event::Key(KeyEvent::new(
                KeyCode::Char(ch),
                KeyModifiers::NONE,
            )));
        }
    }

    fn decoder() -> InputDecoder {
        InputDecoder::new(Duration::from_millis(
            InputDecoder::DEFAULT_AMBIGUOUS_TIMEOUT_MS,
        ))
    }

    #[test]
    fn test_plain_chars_self_insert() {
        let keymap = emacs_keymap();
        let mut decoder = decoder();
        feed_chars(&mut decoder, "hi");
        assert_eq!(decoder.poll(&keymap), Some(DecodedInput::SelfInsert('h')));
        assert_eq!(decoder.poll(&keymap), Some(DecodedInput::SelfInsert('i')));
        assert_eq!(decoder.poll(&keymap), None);
    }

    #[test]
    fn test_bound_control_key() {
        let keymap = emacs_keymap();
        let mut decoder = decoder();
        decoder.feed(&Event::Key(KeyEvent::new(
            KeyCode::Char('a'),
            KeyModifiers::CONTROL,
        )));
        assert_eq!(
            decoder.poll(&keymap),
            Some(DecodedInput::Bound {
                seq: "\u{1}".to_string(),
                binding: Binding::widget("beginning-of-line"),
            })
        );
    }

    #[test]
    fn test_multi_char_sequence() {
        let keymap = emacs_keymap();
        let mut decoder = decoder();
        decoder.feed(&Event::Key(KeyEvent::new(KeyCode::Up, KeyModifiers::NONE)));
        assert_eq!(
            decoder.poll(&keymap),
            Some(DecodedInput::Bound {
                seq: "\u{1b}[A".to_string(),
                binding: Binding::widget("up-line-or-history"),
            })
        );
    }

    #[test]
    fn test_ambiguous_esc_resolved_by_timeout() {
        let keymap = vi_insert_keymap();
        let mut decoder = decoder();
        decoder.feed(&Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        // ESC alone is complete (vi-cmd-mode) but also prefixes arrows.
        assert_eq!(decoder.poll(&keymap), None);
        assert!(decoder.deadline().is_some());
        assert_eq!(
            decoder.on_timeout(&keymap),
            Some(DecodedInput::Bound {
                seq: "\u{1b}".to_string(),
                binding: Binding::widget("vi-cmd-mode"),
            })
        );
    }

    #[test]
    fn test_ambiguous_esc_resolved_by_next_char() {
        let keymap = vi_insert_keymap();
        let mut decoder = decoder();
        decoder.feed(&Event::Key(KeyEvent::new(KeyCode::Up, KeyModifiers::NONE)));
        // All three chars arrive together: no ambiguity pause.
        assert!(matches!(
            decoder.poll(&keymap),
            Some(DecodedInput::Bound { binding, .. })
                if binding == Binding::widget("up-line-or-history")
        ));
    }

    #[test]
    fn test_short_match_replays_residue() {
        let keymap = vi_insert_keymap();
        let mut decoder = decoder();
        decoder.feed(&Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        feed_chars(&mut decoder, "q");
        // ESC q: ESC resolves to vi-cmd-mode, q replays.
        assert_eq!(
            decoder.poll(&keymap),
            Some(DecodedInput::Bound {
                seq: "\u{1b}".to_string(),
                binding: Binding::widget("vi-cmd-mode"),
            })
        );
        assert_eq!(decoder.poll(&keymap), Some(DecodedInput::SelfInsert('q')));
    }

    #[test]
    fn test_macro_replay_at_head() {
        let keymap = emacs_keymap();
        let mut decoder = decoder();
        feed_chars(&mut decoder, "z");
        decoder.push_macro("ab");
        assert_eq!(decoder.poll(&keymap), Some(DecodedInput::SelfInsert('a')));
        assert_eq!(decoder.poll(&keymap), Some(DecodedInput::SelfInsert('b')));
        assert_eq!(decoder.poll(&keymap), Some(DecodedInput::SelfInsert('z')));
    }

    #[test]
    fn test_paste_passthrough() {
        let keymap = emacs_keymap();
        let mut decoder = decoder();
        decoder.feed(&Event::Paste("pasted text".to_string()));
        assert_eq!(
            decoder.poll(&keymap),
            Some(DecodedInput::Paste("pasted text".to_string()))
        );
    }

    #[test]
    fn test_undefined_key_without_default() {
        let keymap = crate::vi_cmd_keymap();
        let mut decoder = decoder();
        feed_chars(&mut decoder, "q");
        assert_eq!(
            decoder.poll(&keymap),
            Some(DecodedInput::Undefined("q".to_string()))
        );
    }
}
