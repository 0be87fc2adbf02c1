// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Shared fixtures for inline tests: a mock terminal writer whose buffer can
//! be inspected, and a scripted key-event reader.

use crate::{KeyEventReader, StdMutex};
use crossterm::event::Event;
use std::{io::{self, Write},
          sync::Arc,
          time::Duration};

#[derive(Debug, Clone, Default)]
pub struct StdoutMock {
    pub buffer: Arc<StdMutex<Vec<u8>>>,
}

impl StdoutMock {
    #[must_use]
    pub fn get_copy_of_buffer(&self) -> Vec<u8> {
        self.buffer.lock().unwrap().clone()
    }

    #[must_use]
    pub fn get_copy_of_buffer_as_string(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).to_string()
    }

    /// Buffer contents with ANSI escapes removed, for assertions on visible
    /// output only.
    #[must_use]
    pub fn get_copy_of_buffer_as_stripped_string(&self) -> String {
        let stripped = strip_ansi_escapes::strip(self.buffer.lock().unwrap().clone());
        String::from_utf8_lossy(&stripped).to_string()
    }
}

impl Write for StdoutMock {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

/// Replays a scripted vector of crossterm events. Deadlines are ignored; the
/// script is drained in order and then reports end-of-input.
#[derive(Debug)]
pub struct TestVecKeyEventReader {
    pub events: Vec<Event>,
    pub index: usize,
}

impl TestVecKeyEventReader {
    #[must_use]
    pub fn new(events: Vec<Event>) -> Self { Self { events, index: 0 } }
}

impl KeyEventReader for TestVecKeyEventReader {
    fn read_key_event(&mut self, _deadline: Option<Duration>) -> io::Result<Option<Event>> {
        if self.index < self.events.len() {
            let event = self.events[self.index].clone();
            self.index += 1;
            Ok(Some(event))
        } else {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "script drained"))
        }
    }
}

/// Builds plain key press events from a str, one event per char.
#[must_use]
pub fn key_events_for(text: &str) -> Vec<Event> {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    text.chars()
        .map(|ch| Event::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE)))
        .collect()
}

/// A single key press with modifiers, for scripting control sequences.
#[must_use]
pub fn key_event(
    code: crossterm::event::KeyCode,
    modifiers: crossterm::event::KeyModifiers,
) -> Event {
    Event::Key(crossterm::event::KeyEvent::new(code, modifiers))
}
