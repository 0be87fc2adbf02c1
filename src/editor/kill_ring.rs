// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Ordered ring of killed regions with a yank pointer. Contiguous kills
//! merge into the head entry; `yank-pop` rotates the pointer through older
//! entries.

use std::collections::VecDeque;

pub const KILL_RING_SIZE_MAX: usize = 60;

/// Where merged kill text lands relative to the head entry: forward kills
/// append, backward kills prepend.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KillDirection {
    Forward,
    Backward,
}

#[derive(Debug)]
pub struct KillRing {
    ring: VecDeque<String>,
    /// Yank pointer: offset from the head, advanced by [`Self::yank_pop`].
    index: usize,
    max_size: usize,
}

impl Default for KillRing {
    fn default() -> Self { Self::new(KILL_RING_SIZE_MAX) }
}

impl KillRing {
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            ring: VecDeque::new(),
            index: 0,
            max_size: max_size.max(1),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize { self.ring.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.ring.is_empty() }

    /// Pushes killed text. When `merge` is set (the previous widget was also
    /// a kill), the text joins the head entry on the side given by
    /// `direction` instead of creating a new entry.
    pub fn kill(&mut self, text: &str, direction: KillDirection, merge: bool) {
        if text.is_empty() {
            return;
        }
        if merge {
            if let Some(head) = self.ring.front_mut() {
                match direction {
                    KillDirection::Forward => head.push_str(text),
                    KillDirection::Backward => head.insert_str(0, text),
                }
                return;
            }
        }
        self.ring.push_front(text.to_string());
        self.ring.truncate(self.max_size);
        self.index = 0;
    }

    /// Most recent kill; resets the yank pointer to the head.
    #[must_use]
    pub fn yank(&mut self) -> Option<&str> {
        self.index = 0;
        self.ring.front().map(String::as_str)
    }

    /// Rotates the yank pointer one entry older (wrapping) and returns it.
    /// Only meaningful straight after a yank; the caller enforces that.
    #[must_use]
    pub fn yank_pop(&mut self) -> Option<&str> {
        if self.ring.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.ring.len();
        self.ring.get(self.index).map(String::as_str)
    }

    /// Overwrites all entries with NUL then clears (masked sessions).
    pub fn zero_out(&mut self) {
        for entry in &mut self.ring {
            *entry = "\0".repeat(entry.chars().count());
        }
        self.ring.clear();
        self.index = 0;
    }
}
