// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The `r3bl_line_editor` library is an interactive line editor for
//! terminal applications: a prompt is displayed, the user's input is
//! echoed and edited in place, and a completed line is returned. On the
//! way there you get Emacs and Vi modal editing, history with file
//! persistence and search, completion with menu selection, multi-line
//! composition under secondary prompts, and a differential redisplay that
//! keeps the screen consistent with the buffer under arbitrary widths.
//!
//! # Why use this crate
//!
//! 1. Because `read_line()` from the standard library is a black box: no
//!    editing beyond what the terminal driver gives you, no history, no
//!    completion, and no way to write to the terminal while a read is in
//!    progress.
//! 2. Because concurrent output is hard to get right. Any thread holding
//!    a [`SharedWriter`] clone can `writeln!` while a read is active;
//!    complete lines surface *above* the live prompt instead of tearing
//!    through it.
//!
//! # How to use this crate
//!
//! ## [`LineEditor`], the main entry point
//!
//! ```no_run
//! use r3bl_line_editor::{LineEditor, ReadlineError, StringsCompleter};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut editor = LineEditor::on_stdout()?;
//!     editor.add_completer(Box::new(StringsCompleter::new(["commit", "checkout"])));
//!     loop {
//!         match editor.read_line("> ") {
//!             Ok(line) => println!("got: {line}"),
//!             Err(ReadlineError::Interrupted) => continue,
//!             Err(ReadlineError::Eof) => break,
//!             Err(err) => return Err(err.into()),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! - Call [`LineEditor::read_line`] (most likely in a loop) to receive one
//!   line of input. The user can edit with the stock Emacs bindings, or
//!   switch to Vi with [`LineEditor::set_keymap`].
//! - Call [`LineEditor::shared_writer`] for a cloneable writer whose lines
//!   print above the prompt while a read is in progress.
//! - History is in-memory by default; attach a file through
//!   [`History::attach_file`] (reachable via [`LineEditor::history_mut`])
//!   for persistence with dedup, ignore patterns, and timestamps.
//!
//! ## Collaborators
//!
//! The editor core contracts with narrow traits for everything it does
//! not own: [`Parser`], [`Completer`], [`Highlighter`], [`Expander`], and
//! [`MaskingCallback`]. Each has a stock implementation covering the
//! simple case; supply your own to integrate a real command language.
//!
//! ## Behavior knobs
//!
//! Options ([`EditorOption`]) are boolean flags with stable names
//! (`AUTO_MENU`, `HISTORY_IGNORE_DUPS`, …); variables are string-keyed
//! (`list-max`, `history-file`, `bell-style`, …). Both live on
//! [`Config`], reachable via [`LineEditor::config_mut`].

// Attach sources.
pub mod completion;
pub mod core;
pub mod editor;
pub mod history;
pub mod keymap;
pub mod reader;
pub mod render;
pub mod widgets;

// Re-export the public API.
pub use crate::core::*;
pub use completion::*;
pub use editor::*;
pub use history::*;
pub use keymap::*;
pub use reader::*;
pub use render::*;
pub use widgets::*;

// Type aliases.
use std::sync::Arc;

pub type StdMutex<T> = std::sync::Mutex<T>;

pub type SendRawTerminal = dyn std::io::Write + Send;
pub type SafeRawTerminal = Arc<StdMutex<SendRawTerminal>>;

pub type Text = Vec<u8>;

// Constants.
pub const CHANNEL_CAPACITY: usize = 1_000;
