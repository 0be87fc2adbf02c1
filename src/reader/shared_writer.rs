// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Print above the live prompt from any thread. `SharedWriter` is a
//! cloneable [`Write`] whose complete lines travel over a bounded channel;
//! the read loop drains the channel between widget steps, scrolls the
//! foreign text in above the prompt, and repaints. This channel is the only
//! cross-thread surface of the editor.

use crate::{Text, CHANNEL_CAPACITY};
use std::io::{self, Write};
use tokio::sync::mpsc::{Receiver, Sender};

/// Signals carried on the line channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineControlSignal {
    /// A complete line (or explicit flush) of foreign output.
    Line(Text),
    /// Force queued partial output through.
    Flush,
}

#[must_use]
pub fn line_channel() -> (Sender<LineControlSignal>, Receiver<LineControlSignal>) {
    tokio::sync::mpsc::channel(CHANNEL_CAPACITY)
}

/// Cloneable writer handle. Data is buffered until a newline, then sent as
/// one signal; `flush` sends whatever is buffered.
#[derive(Debug)]
pub struct SharedWriter {
    /// Holds data until a complete line is available.
    pub buffer: Text,

    /// Sender end; the receiver lives in the read loop.
    pub line_sender: Sender<LineControlSignal>,

    /// Set on clones: only the original instance reports send failures, so
    /// a closed editor doesn't error every logger at once.
    pub silent_error: bool,
}

impl SharedWriter {
    #[must_use]
    pub fn new(line_sender: Sender<LineControlSignal>) -> Self {
        Self {
            buffer: Vec::new(),
            line_sender,
            silent_error: false,
        }
    }
}

impl Clone for SharedWriter {
    /// Each clone gets its own buffer and a cloned sender, so interleaved
    /// writers cannot shear each other's partial lines.
    fn clone(&self) -> Self {
        Self {
            buffer: Vec::new(),
            line_sender: self.line_sender.clone(),
            silent_error: true,
        }
    }
}

impl Write for SharedWriter {
    fn write(&mut self, payload: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(payload);
        if self.buffer.ends_with(b"\n") {
            match self
                .line_sender
                .try_send(LineControlSignal::Line(self.buffer.clone()))
            {
                Ok(()) => self.buffer.clear(),
                Err(_) => {
                    if !self.silent_error {
                        return Err(io::Error::new(
                            io::ErrorKind::Other,
                            "SharedWriter receiver has closed",
                        ));
                    }
                }
            }
        }
        Ok(payload.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        match self
            .line_sender
            .try_send(LineControlSignal::Line(self.buffer.clone()))
        {
            Ok(()) => {
                self.buffer.clear();
                Ok(())
            }
            Err(_) => {
                if self.silent_error {
                    Ok(())
                } else {
                    Err(io::Error::new(
                        io::ErrorKind::Other,
                        "SharedWriter receiver has closed",
                    ))
                }
            }
        }
    }
}
