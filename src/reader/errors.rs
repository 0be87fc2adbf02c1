// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::io;
use thiserror::Error;

/// Errors returned from [`crate::LineEditor::read_line`]. Such errors
/// generally require specific procedures to recover from.
#[derive(Debug, Error)]
pub enum ReadlineError {
    /// An internal I/O error occurred.
    #[error(transparent)]
    IO(#[from] io::Error),

    /// The user aborted the line (`C-c` / `send-break`). The buffer is
    /// discarded.
    #[error("read interrupted")]
    Interrupted,

    /// `C-d` on an empty line, or upstream end of input.
    #[error("end of file")]
    Eof,

    /// A second concurrent `read_line` on the same editor.
    #[error("already reading")]
    AlreadyReading,

    /// `read_line()` was called after every [`crate::SharedWriter`] was
    /// dropped and all queued output was flushed.
    #[error("line writers closed")]
    Closed,

    /// Programmer error surfaced synchronously (bad keymap name, null
    /// required argument).
    #[error("illegal argument: {0}")]
    IllegalArgument(String),
}
