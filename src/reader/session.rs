// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The edit session and its read loop: decode a key, dispatch the bound
//! widget, reconcile the screen, repeat until a widget accepts, aborts,
//! or hits end of input. Incremental search and menu completion run as
//! sub-states that reinterpret keys before normal dispatch. The
//! print-above queue is drained between widget steps, round-robin with key
//! events.

use crate::{default_keymaps, default_registry, expand_prompt, expand_tabs, AttributedString,
            BellStyle, Binding, Buffer, CellPos, Completer, Config, CrosstermKeyEventReader,
            DecodedInput, DefaultHighlighter, DefaultParser, Display, EditorOption, Expander,
            Highlighter, History, HistoryCursor, InputDecoder, KeyEventReader, KeyMaps, KillRing,
            LineControlSignal, MaskingCallback, MenuSession, NullExpander, Parser, PromptContext,
            ReadlineError, RegionType, SafeRawTerminal, SearchState, SharedWriter, Size,
            StatusRegion, StdMutex, TermCaps, ViState, WidgetRegistry, WrapModel,
            SimpleMaskingCallback, Candidate,
            CsiSequence, Style};
use std::{io::Write,
          sync::{atomic::{AtomicBool, Ordering},
                 Arc},
          time::Duration};
use tokio::sync::mpsc::Receiver;
use tracing::debug;

/// How often the loop wakes to drain the print-above queue while idle.
const DRAIN_TICK_MS: u64 = 50;
/// At most this many foreign lines print per tick, so a chatty writer
/// cannot starve key handling.
const MAX_DRAIN_PER_TICK: usize = 32;

/// Terminal states of the read loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    Editing,
    Accepted,
    Aborted,
    Eof,
}

/// A widget that must see the next literal key before it can finish.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PendingOp {
    QuotedInsert,
    ViFind(crate::FindKind),
    ViRegister,
    ViReplace,
    /// Operator + `i`/`a` awaiting the text-object key (`diw`, `caw`).
    ViTextObject { around: bool },
}

/// Suffix appended by completion, removable when the next typed character
/// is in `remove-suffix-chars`.
#[derive(Debug, Clone)]
pub struct PendingSuffix {
    pub len: usize,
    pub remove_chars: String,
}

/// Arguments to [`LineEditor::read_line_with`].
#[derive(Default)]
pub struct ReadLineParams<'a> {
    pub prompt: Option<String>,
    pub right_prompt: Option<String>,
    /// Convenience char mask; wraps [`SimpleMaskingCallback`].
    pub mask: Option<char>,
    pub masking_callback: Option<&'a dyn MaskingCallback>,
    pub initial_buffer: Option<String>,
}

/// Per-call mutable state. Widgets receive `&mut EditSession` and never
/// store back-pointers; everything they touch lives here.
pub struct EditSession<'a> {
    pub buf: Buffer,
    pub kill_ring: &'a mut KillRing,
    pub history: &'a mut History,
    pub hist_cursor: HistoryCursor,
    pub config: &'a Config,
    pub keymaps: &'a mut KeyMaps,
    pub decoder: &'a mut InputDecoder,

    pub parser: &'a dyn Parser,
    pub highlighter: &'a dyn Highlighter,
    pub expander: &'a dyn Expander,
    pub masking: Option<&'a dyn MaskingCallback>,
    pub completers: &'a [Box<dyn Completer>],

    pub state: SessionState,
    pub term_size: Size,
    pub prompt: String,
    pub right_prompt: String,
    /// Width of the primary prompt's first line, the `%Pc` pad target.
    pub initial_prompt_width: u16,
    /// `%M` value for the secondary prompt after a parser EOF.
    pub continuation_missing: String,

    pub pending: Option<PendingOp>,
    /// Pending numeric argument; read-and-cleared by widgets.
    pub numeric_arg: Option<i64>,
    /// Key sequence that invoked the current widget.
    pub current_key: String,
    pub current_widget: String,
    pub last_widget: Option<String>,

    pub search: Option<SearchState>,
    pub menu: Option<MenuSession>,
    /// Rows rendered under the edit rows (candidate lists, menus).
    pub list_rows: Vec<AttributedString>,
    /// Candidates awaiting a y/n display confirmation (`list-max`).
    pub pending_confirm: Option<Vec<Candidate>>,
    pub pending_suffix: Option<PendingSuffix>,
    /// Span of the last yank, for `yank-pop`.
    pub yank_region: Option<(usize, usize)>,

    pub vi: ViState,

    /// Status region handle, shared with the terminal side; resized with
    /// the session.
    pub status: Arc<StdMutex<StatusRegion>>,

    /// Set by `clear-screen`; the loop erases and repaints.
    pub clear_screen_pending: bool,
    /// Set by `beep` and by widgets returning false.
    pub beep_pending: bool,

    pub display: Display,
}

impl EditSession<'_> {
    /// Consumes the pending numeric argument (default 1), capped at
    /// `max-repeat-count`. Negative flips direction where meaningful.
    pub fn take_repeat_count(&mut self) -> i64 {
        let cap = self.config.max_repeat_count();
        let arg = self.numeric_arg.take().unwrap_or(1);
        arg.clamp(-cap, cap)
    }

    #[must_use]
    pub fn word_chars(&self) -> String { self.config.word_chars() }

    /// Inserts text honoring overwrite mode; clears yank/suffix tracking.
    pub fn insert_text(&mut self, text: &str) {
        self.yank_region = None;
        self.buf.insert(text);
    }

    /// True when the previous widget was a kill, so a new kill merges.
    #[must_use]
    pub fn last_widget_was_kill(&self) -> bool {
        matches!(
            self.last_widget.as_deref(),
            Some(
                "kill-word" | "backward-kill-word" | "kill-line" | "backward-kill-line"
                    | "kill-whole-line" | "kill-region" | "vi-delete" | "vi-delete-char"
            )
        )
    }

    /// Leaves any completion menu/list state behind.
    pub fn dismiss_completion(&mut self) {
        self.menu = None;
        self.list_rows.clear();
        self.pending_confirm = None;
    }
}

/// The line reader. One instance services one terminal; a second
/// concurrent `read_line` fails with [`ReadlineError::AlreadyReading`].
pub struct LineEditor {
    pub(crate) config: Config,
    keymaps: KeyMaps,
    widgets: WidgetRegistry,
    history: History,
    kill_ring: KillRing,
    decoder: InputDecoder,

    parser: Box<dyn Parser>,
    highlighter: Box<dyn Highlighter>,
    expander: Box<dyn Expander>,
    completers: Vec<Box<dyn Completer>>,

    terminal: SafeRawTerminal,
    reader: Box<dyn KeyEventReader>,
    term_size: Size,
    status: Arc<StdMutex<StatusRegion>>,

    line_receiver: Receiver<LineControlSignal>,
    line_sender: tokio::sync::mpsc::Sender<LineControlSignal>,

    reading: AtomicBool,
    raw_mode: bool,
}

impl LineEditor {
    /// Builds an editor over the given raw terminal writer and key reader.
    /// `term_size` is the initial size; resize events keep it current.
    #[must_use]
    pub fn new(
        terminal: SafeRawTerminal,
        reader: Box<dyn KeyEventReader>,
        term_size: (u16, u16),
    ) -> Self {
        let (line_sender, line_receiver) = crate::line_channel();
        let size = Size::from(term_size);
        Self {
            config: Config::new(),
            keymaps: default_keymaps(),
            widgets: default_registry(),
            history: History::new(),
            kill_ring: KillRing::default(),
            decoder: InputDecoder::new(Duration::from_millis(
                InputDecoder::DEFAULT_AMBIGUOUS_TIMEOUT_MS,
            )),
            parser: Box::new(DefaultParser),
            highlighter: Box::new(DefaultHighlighter),
            expander: Box::new(NullExpander),
            completers: Vec::new(),
            terminal,
            reader,
            term_size: size,
            status: Arc::new(StdMutex::new(StatusRegion::new(size, false))),
            line_receiver,
            line_sender,
            reading: AtomicBool::new(false),
            raw_mode: false,
        }
    }

    /// Stock editor on stdout + crossterm events, raw mode managed around
    /// each read.
    pub fn on_stdout() -> std::io::Result<Self> {
        let size = crossterm::terminal::size()?;
        let terminal: SafeRawTerminal = Arc::new(StdMutex::new(std::io::stdout()));
        let mut editor = Self::new(terminal, Box::new(CrosstermKeyEventReader), size);
        editor.raw_mode = true;
        Ok(editor)
    }

    pub fn config_mut(&mut self) -> &mut Config { &mut self.config }

    #[must_use]
    pub fn config(&self) -> &Config { &self.config }

    pub fn history_mut(&mut self) -> &mut History { &mut self.history }

    #[must_use]
    pub fn history(&self) -> &History { &self.history }

    pub fn keymaps_mut(&mut self) -> &mut KeyMaps { &mut self.keymaps }

    pub fn set_parser(&mut self, parser: Box<dyn Parser>) { self.parser = parser; }

    pub fn set_highlighter(&mut self, highlighter: Box<dyn Highlighter>) {
        self.highlighter = highlighter;
    }

    pub fn set_expander(&mut self, expander: Box<dyn Expander>) { self.expander = expander; }

    pub fn add_completer(&mut self, completer: Box<dyn Completer>) {
        self.completers.push(completer);
    }

    /// Selects the active keymap; unknown names are programmer errors.
    pub fn set_keymap(&mut self, name: &str) -> Result<(), ReadlineError> {
        self.keymaps
            .select(name)
            .map_err(ReadlineError::IllegalArgument)
    }

    /// Status region handle, shared with the terminal side.
    #[must_use]
    pub fn status(&self) -> Arc<StdMutex<StatusRegion>> { self.status.clone() }

    /// A cloneable writer that prints above the live prompt from any
    /// thread.
    #[must_use]
    pub fn shared_writer(&self) -> SharedWriter { SharedWriter::new(self.line_sender.clone()) }

    /// Reads one line with just a prompt.
    pub fn read_line(&mut self, prompt: &str) -> miette::Result<String, ReadlineError> {
        self.read_line_with(ReadLineParams {
            prompt: Some(prompt.to_string()),
            ..ReadLineParams::default()
        })
    }

    /// Reads one masked line (`mask` echoes for every typed char; history
    /// is suppressed).
    pub fn read_line_masked(
        &mut self,
        prompt: &str,
        mask: char,
    ) -> miette::Result<String, ReadlineError> {
        self.read_line_with(ReadLineParams {
            prompt: Some(prompt.to_string()),
            mask: Some(mask),
            ..ReadLineParams::default()
        })
    }

    pub fn read_line_with(
        &mut self,
        params: ReadLineParams<'_>,
    ) -> miette::Result<String, ReadlineError> {
        if self.reading.swap(true, Ordering::SeqCst) {
            return Err(ReadlineError::AlreadyReading);
        }
        let result = self.read_line_inner(params);
        self.reading.store(false, Ordering::SeqCst);
        result
    }

    fn read_line_inner(
        &mut self,
        params: ReadLineParams<'_>,
    ) -> miette::Result<String, ReadlineError> {
        if self.raw_mode {
            crossterm::terminal::enable_raw_mode()?;
            if self.config.is_set(EditorOption::BracketedPaste) {
                let mut guard = self.terminal.lock().unwrap();
                let _ =
                    crossterm::execute!(&mut &mut *guard, crossterm::event::EnableBracketedPaste);
            }
        }

        // Sync config-driven collaborators.
        self.history.rules.ignore_space = self.config.is_set(EditorOption::HistoryIgnoreSpace);
        self.history.rules.ignore_dups = self.config.is_set(EditorOption::HistoryIgnoreDups);
        self.history.rules.reduce_blanks =
            self.config.is_set(EditorOption::HistoryReduceBlanks);
        self.history.rules.incremental = self.config.is_set(EditorOption::HistoryIncremental);
        self.history.rules.timestamped = self.config.is_set(EditorOption::HistoryTimestamped);
        self.history.max_size = self.config.history_size();
        self.history.file_max_size = self.config.history_file_size();
        if let Some(patterns) = self.config.var(crate::HISTORY_IGNORE) {
            let patterns = patterns.to_string();
            self.history.set_ignore_patterns(&patterns);
        }
        self.decoder.ambiguous_timeout =
            Duration::from_millis(self.config.ambiguous_binding_ms());

        let owned_masking: Option<Box<dyn MaskingCallback>> = params
            .mask
            .map(|mask| Box::new(SimpleMaskingCallback::new(mask)) as Box<dyn MaskingCallback>);
        let masking: Option<&dyn MaskingCallback> = params
            .masking_callback
            .or(owned_masking.as_deref());

        let prompt = params.prompt.unwrap_or_default();
        let initial_prompt_width = expand_prompt(
            &prompt,
            &PromptContext {
                line_number: self.config.line_offset() + 1,
                missing: "",
                pad_to: 0,
            },
        )
        .line_widths
        .first()
        .copied()
        .unwrap_or(0);

        let mut session = EditSession {
            buf: Buffer::new(!self.config.is_set(EditorOption::DisableUndo)),
            kill_ring: &mut self.kill_ring,
            history: &mut self.history,
            hist_cursor: HistoryCursor::new(),
            config: &self.config,
            keymaps: &mut self.keymaps,
            decoder: &mut self.decoder,
            parser: self.parser.as_ref(),
            highlighter: self.highlighter.as_ref(),
            expander: self.expander.as_ref(),
            masking,
            completers: &self.completers,
            state: SessionState::Editing,
            term_size: self.term_size,
            prompt,
            right_prompt: params.right_prompt.unwrap_or_default(),
            initial_prompt_width,
            continuation_missing: String::new(),
            pending: None,
            numeric_arg: None,
            current_key: String::new(),
            current_widget: String::new(),
            last_widget: None,
            search: None,
            menu: None,
            list_rows: Vec::new(),
            pending_confirm: None,
            pending_suffix: None,
            yank_region: None,
            vi: ViState::default(),
            status: self.status.clone(),
            clear_screen_pending: false,
            beep_pending: false,
            display: Display::new(TermCaps::default()),
        };
        // Reads always start in an insert-capable keymap.
        if session.keymaps.active_name() == KeyMaps::VI_CMD
            || session.keymaps.active_name() == KeyMaps::VISUAL
            || session.keymaps.active_name() == KeyMaps::MENU
        {
            let _ = session.keymaps.select(KeyMaps::VI_INSERT);
        }
        if let Some(initial) = &params.initial_buffer {
            session.buf.insert(initial);
            session.buf.split_undo();
        }

        let terminal = self.terminal.clone();
        redisplay(&mut session, &terminal)?;

        let result = loop {
            drain_line_channel(&mut self.line_receiver, &mut session, &terminal)?;

            let polled = {
                let keymap = session.keymaps.active();
                session.decoder.poll(keymap)
            };

            match polled {
                Some(input) => {
                    dispatch_input(&mut session, &self.widgets, &input, &terminal)?;
                    match session.state {
                        SessionState::Editing => redisplay(&mut session, &terminal)?,
                        SessionState::Accepted => {
                            break finish_accept(&mut session, &terminal);
                        }
                        SessionState::Aborted => {
                            finish_line(&mut session, &terminal)?;
                            break Err(ReadlineError::Interrupted);
                        }
                        SessionState::Eof => {
                            finish_line(&mut session, &terminal)?;
                            break Err(ReadlineError::Eof);
                        }
                    }
                }
                None => {
                    let deadline = session
                        .decoder
                        .deadline()
                        .unwrap_or(Duration::from_millis(DRAIN_TICK_MS));
                    match self.reader.read_key_event(Some(deadline)) {
                        Ok(Some(event)) => session.decoder.feed(&event),
                        Ok(None) => {
                            let timed_out = {
                                let keymap = session.keymaps.active();
                                session.decoder.on_timeout(keymap)
                            };
                            if let Some(input) = timed_out {
                                dispatch_input(&mut session, &self.widgets, &input, &terminal)?;
                                match session.state {
                                    SessionState::Editing => {
                                        redisplay(&mut session, &terminal)?;
                                    }
                                    SessionState::Accepted => {
                                        break finish_accept(&mut session, &terminal);
                                    }
                                    SessionState::Aborted => {
                                        finish_line(&mut session, &terminal)?;
                                        break Err(ReadlineError::Interrupted);
                                    }
                                    SessionState::Eof => {
                                        finish_line(&mut session, &terminal)?;
                                        break Err(ReadlineError::Eof);
                                    }
                                }
                            }
                        }
                        Err(err) => break Err(err.into()),
                    }
                }
            }
        };

        self.term_size = session.term_size;

        // Masked sessions scrub before release.
        if masking.is_some() {
            self.kill_ring.zero_out();
        }

        if self.raw_mode {
            {
                let mut guard = self.terminal.lock().unwrap();
                let _ = crossterm::execute!(
                    &mut &mut *guard,
                    crossterm::event::DisableBracketedPaste
                );
            }
            let _ = crossterm::terminal::disable_raw_mode();
        }
        result
    }
}

/// Drains queued print-above lines: scroll the prompt region away, write
/// the foreign text, and let the following redisplay repaint. Bounded per
/// tick so writers cannot starve key handling.
fn drain_line_channel(
    receiver: &mut Receiver<LineControlSignal>,
    session: &mut EditSession<'_>,
    terminal: &SafeRawTerminal,
) -> Result<(), ReadlineError> {
    let mut printed = false;
    for _ in 0..MAX_DRAIN_PER_TICK {
        match receiver.try_recv() {
            Ok(LineControlSignal::Line(text)) => {
                let mut guard = terminal.lock().unwrap();
                let term: &mut dyn Write = &mut *guard;
                if !printed {
                    session.display.clear_region(term)?;
                    printed = true;
                }
                term.write_all(&text)?;
                if !text.ends_with(b"\n") {
                    term.write_all(b"\r\n")?;
                } else {
                    term.write_all(b"\r")?;
                }
            }
            Ok(LineControlSignal::Flush) => {
                let mut guard = terminal.lock().unwrap();
                guard.flush()?;
            }
            Err(_) => break,
        }
    }
    if printed {
        session.display.reset();
        redisplay(session, terminal)?;
    }
    Ok(())
}

/// Routes one decoded input: pending literal-key ops first, then the
/// search and menu sub-states, then normal keymap dispatch.
pub(crate) fn dispatch_input(
    session: &mut EditSession<'_>,
    widgets: &WidgetRegistry,
    input: &DecodedInput,
    terminal: &SafeRawTerminal,
) -> Result<(), ReadlineError> {
    match input {
        DecodedInput::Resize(size) => {
            session.term_size = *size;
            {
                let mut guard = terminal.lock().unwrap();
                let term: &mut dyn Write = &mut *guard;
                session.status.lock().unwrap().resize(*size, term)?;
            }
            session.display.mark_dirty();
            return Ok(());
        }
        DecodedInput::Paste(text) => {
            handle_paste(session, text);
            return Ok(());
        }
        _ => {}
    }

    if session.pending.is_some() {
        crate::widgets::handle_pending_op(session, input);
        run_post_widget(session, terminal)?;
        return Ok(());
    }

    if session.search.is_some() {
        match crate::widgets::handle_search_input(session, input) {
            crate::widgets::SearchOutcome::Consumed => {
                run_post_widget(session, terminal)?;
                return Ok(());
            }
            crate::widgets::SearchOutcome::Replay => {
                // Fall through to normal dispatch with search closed.
            }
        }
    }

    if session.menu.is_some() && crate::widgets::handle_menu_input(session, widgets, input) {
        run_post_widget(session, terminal)?;
        return Ok(());
    }

    if session.pending_confirm.is_some() {
        crate::widgets::handle_confirm_input(session, input);
        run_post_widget(session, terminal)?;
        return Ok(());
    }

    match input {
        DecodedInput::Bound { seq, binding } => match resolve_binding(session, binding) {
            Some(ResolvedBinding::Widget(name)) => {
                run_widget(session, widgets, &name, seq, terminal)?;
            }
            Some(ResolvedBinding::Macro(expansion)) => {
                session.decoder.push_macro(&expansion);
            }
            None => {
                session.beep_pending = true;
            }
        },
        DecodedInput::SelfInsert(ch) => {
            let seq = ch.to_string();
            run_widget(session, widgets, "self-insert", &seq, terminal)?;
        }
        DecodedInput::Undefined(seq) => {
            debug!(seq = %crate::display_seq(seq), "undefined key");
            session.beep_pending = true;
            run_post_widget(session, terminal)?;
        }
        DecodedInput::Paste(_) | DecodedInput::Resize(_) => unreachable!("handled above"),
    }
    Ok(())
}

enum ResolvedBinding {
    Widget(String),
    Macro(String),
}

fn resolve_binding(session: &EditSession<'_>, binding: &Binding) -> Option<ResolvedBinding> {
    match session.keymaps.resolve(binding)? {
        Binding::Widget(name) => Some(ResolvedBinding::Widget(name.clone())),
        Binding::Macro(expansion) => Some(ResolvedBinding::Macro(expansion.clone())),
        Binding::Reference { .. } => None,
    }
}

/// Bracketed paste: one atomic insert, one undo unit, region type Paste.
fn handle_paste(session: &mut EditSession<'_>, text: &str) {
    if !session.config.is_set(EditorOption::BracketedPaste) {
        return;
    }
    session.buf.edit_atomically(|buf| {
        buf.insert(text);
    });
    session.buf.set_region_type(RegionType::Paste);
    session.last_widget = Some("bracketed-paste".to_string());
}

pub(crate) fn run_widget(
    session: &mut EditSession<'_>,
    widgets: &WidgetRegistry,
    name: &str,
    seq: &str,
    terminal: &SafeRawTerminal,
) -> Result<(), ReadlineError> {
    let Some(widget) = widgets.get(name) else {
        debug!(widget = name, "unbound widget name");
        session.beep_pending = true;
        return run_post_widget(session, terminal);
    };

    // Undo boundaries fall between widgets of different kinds; runs of
    // self-insert merge into one undoable unit.
    let merges = matches!(name, "self-insert" | "backward-delete-char" | "delete-char");
    if !merges || session.last_widget.as_deref() != Some(name) {
        session.buf.split_undo();
    }

    session.current_key = seq.to_string();
    session.current_widget = name.to_string();
    let ok = widget(session);
    if !ok {
        session.beep_pending = true;
    }
    session.last_widget = Some(name.to_string());

    run_post_widget(session, terminal)
}

/// Bell and clear-screen effects requested by the widget that just ran.
fn run_post_widget(
    session: &mut EditSession<'_>,
    terminal: &SafeRawTerminal,
) -> Result<(), ReadlineError> {
    if session.clear_screen_pending {
        session.clear_screen_pending = false;
        let mut guard = terminal.lock().unwrap();
        let term: &mut dyn Write = &mut *guard;
        write!(term, "\u{1b}[2J{}", CsiSequence::CursorPosition { row: 0, col: 0 })?;
        session.display.reset();
    }
    if session.beep_pending {
        session.beep_pending = false;
        let mut guard = terminal.lock().unwrap();
        let term: &mut dyn Write = &mut *guard;
        match session.config.bell_style() {
            BellStyle::None => {}
            BellStyle::Audible => term.write_all(b"\x07")?,
            BellStyle::Visible => term.write_all(b"\x1b[?5h\x1b[?5l")?,
        }
    }
    Ok(())
}

/// Composes prompt + (masked or highlighted) buffer + list rows, wraps to
/// the terminal width, and reconciles via the differential display.
pub(crate) fn redisplay(
    session: &mut EditSession<'_>,
    terminal: &SafeRawTerminal,
) -> Result<(), ReadlineError> {
    let (mut composed, cursor_cell) = compose(session);

    if !session.right_prompt.is_empty() {
        // Right prompt decorates the first row when it fits.
        composed.right_prompt = Some(expand_prompt(
            &session.right_prompt,
            &PromptContext {
                line_number: session.config.line_offset() + 1,
                missing: &session.continuation_missing,
                pad_to: session.initial_prompt_width,
            },
        )
        .to_attributed());
    }

    let wrap = WrapModel::new(
        session.term_size.cols,
        session.config.is_set(EditorOption::DelayLineWrap),
    );
    let mut rows = wrap.wrap(&composed.text);
    let cursor = wrap.locate(&composed.text, cursor_cell);

    if let Some(right) = composed.right_prompt {
        if let Some(first) = rows.first_mut() {
            let used = first.width() + right.width();
            if used + 1 <= session.term_size.cols {
                let gap = session.term_size.cols - used;
                let mut padded = first.clone();
                for _ in 0..gap {
                    padded.push_char(' ', Style::default());
                }
                padded.extend(&right);
                *first = padded;
            }
        }
    }

    for row in &session.list_rows {
        rows.extend(wrap.wrap(row));
    }

    let mut guard = terminal.lock().unwrap();
    let term: &mut dyn Write = &mut *guard;
    // Terminal writes are best-effort: a failed update marks the display
    // dirty so the next tick repaints from scratch.
    if session
        .display
        .update(
            &rows,
            CellPos {
                row: cursor.row,
                col: cursor.col,
            },
            term,
            true,
        )
        .is_err()
    {
        session.display.mark_dirty();
    }
    Ok(())
}

struct Composed {
    text: AttributedString,
    right_prompt: Option<AttributedString>,
}

/// Builds the attributed text for the whole edit region and the cell index
/// of the cursor within it.
fn compose(session: &EditSession<'_>) -> (Composed, usize) {
    let buffer_text = session.buf.as_string();
    let cursor = session.buf.cursor();

    // Incremental search replaces the prompt line entirely.
    if let Some(search) = &session.search {
        let text = crate::widgets::search_prompt_line(session, search);
        let cursor_cell = text.len();
        return (
            Composed {
                text,
                right_prompt: None,
            },
            cursor_cell,
        );
    }

    let display_text: String = match session.masking {
        Some(masking) => masking.display(&buffer_text),
        None => buffer_text.clone(),
    };

    let highlighted = match session.masking {
        Some(_) => AttributedString::plain(&display_text),
        None => session.highlighter.highlight(&display_text),
    };
    let highlighted = expand_tabs(&highlighted, session.config.tab_width());

    // Cursor index within the display text: identical for unmasked input,
    // clamped for masked (the mask maps 1:1 or hides everything).
    let display_cursor = cursor.min(highlighted.len());

    let mut text = AttributedString::new();
    let mut cursor_cell = 0usize;
    let mut line_no = 0u64;

    let primary = expand_prompt(
        &session.prompt,
        &PromptContext {
            line_number: session.config.line_offset() + 1,
            missing: "",
            pad_to: 0,
        },
    );
    let secondary_pattern = session.config.secondary_prompt_pattern();

    let prompt_attr = primary.to_attributed();
    text.extend(&prompt_attr);
    let mut cells_before_cursor = prompt_attr.len();

    for (idx, cell) in highlighted.cells().iter().enumerate() {
        if idx == display_cursor {
            cursor_cell = cells_before_cursor;
        }
        if cell.ch == '\n' {
            line_no += 1;
            text.push_char('\n', Style::default());
            let continuation = expand_prompt(
                &secondary_pattern,
                &PromptContext {
                    line_number: session.config.line_offset() + line_no + 1,
                    missing: &session.continuation_missing,
                    pad_to: session.initial_prompt_width,
                },
            )
            .to_attributed();
            text.extend(&continuation);
            if idx < display_cursor {
                cells_before_cursor = text.len();
            }
        } else {
            text.push(*cell);
            if idx < display_cursor {
                cells_before_cursor = text.len();
            }
        }
    }
    if display_cursor >= highlighted.len() {
        cursor_cell = cells_before_cursor;
    }

    (
        Composed {
            text,
            right_prompt: None,
        },
        cursor_cell,
    )
}

/// Accept path: history, final cursor parking, optional erase.
fn finish_accept(
    session: &mut EditSession<'_>,
    terminal: &SafeRawTerminal,
) -> miette::Result<String, ReadlineError> {
    let line = session.buf.as_string();

    let history_line = match session.masking {
        Some(masking) => masking.history(&line),
        None => Some(line.clone()),
    };
    if let Some(history_line) = history_line {
        session.history.add(&history_line);
    }

    finish_line(session, terminal)?;

    if session.masking.is_some() {
        session.buf.zero_out();
    }
    Ok(line)
}

/// Parks the cursor past the edit region (or erases it) and drops to a
/// fresh line so the caller's output starts clean.
fn finish_line(
    session: &mut EditSession<'_>,
    terminal: &SafeRawTerminal,
) -> Result<(), ReadlineError> {
    session.dismiss_completion();
    session.search = None;
    // Show the final buffer (accept-line may have rewritten it) and drop
    // any candidate rows before parking the cursor.
    redisplay(session, terminal)?;
    let erase = session.config.is_set(EditorOption::EraseLineOnFinish);
    redisplay_final(session, terminal, erase)
}

fn redisplay_final(
    session: &mut EditSession<'_>,
    terminal: &SafeRawTerminal,
    erase: bool,
) -> Result<(), ReadlineError> {
    let mut guard = terminal.lock().unwrap();
    let term: &mut dyn Write = &mut *guard;
    if erase {
        session.display.clear_region(term)?;
        session.display.reset();
    } else {
        session.display.park_below(term)?;
    }
    term.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_fixtures::{key_event, key_events_for, StdoutMock, TestVecKeyEventReader};
    use crossterm::event::{Event, KeyCode, KeyModifiers};
    use pretty_assertions::assert_eq;

    fn editor_with_events(events: Vec<Event>) -> (LineEditor, StdoutMock) {
        let stdout_mock = StdoutMock::default();
        let terminal: SafeRawTerminal = Arc::new(StdMutex::new(stdout_mock.clone()));
        let reader = Box::new(TestVecKeyEventReader::new(events));
        let mut editor = LineEditor::new(terminal, reader, (80, 24));
        editor.config_mut().set_option(EditorOption::HistoryIncremental, false);
        editor.config_mut().set_option(EditorOption::HistoryTimestamped, false);
        (editor, stdout_mock)
    }

    fn enter() -> Event { key_event(KeyCode::Enter, KeyModifiers::NONE) }

    #[test]
    fn test_scenario_hello_enter() {
        let mut events = key_events_for("hello");
        events.push(enter());
        let (mut editor, stdout_mock) = editor_with_events(events);

        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "hello");
        assert_eq!(editor.history().len(), 1);
        assert_eq!(editor.history().get(0).unwrap().text, "hello");

        let output = stdout_mock.get_copy_of_buffer_as_stripped_string();
        assert!(output.contains("> hello"));
    }

    #[test]
    fn test_interrupt_returns_error() {
        let events = vec![key_event(KeyCode::Char('c'), KeyModifiers::CONTROL)];
        let (mut editor, _) = editor_with_events(events);
        let result = editor.read_line("> ");
        assert!(matches!(result, Err(ReadlineError::Interrupted)));
    }

    #[test]
    fn test_ctrl_d_empty_is_eof() {
        let events = vec![key_event(KeyCode::Char('d'), KeyModifiers::CONTROL)];
        let (mut editor, _) = editor_with_events(events);
        let result = editor.read_line("> ");
        assert!(matches!(result, Err(ReadlineError::Eof)));
    }

    #[test]
    fn test_ctrl_d_nonempty_deletes() {
        let mut events = key_events_for("ab");
        events.push(key_event(KeyCode::Left, KeyModifiers::NONE));
        events.push(key_event(KeyCode::Char('d'), KeyModifiers::CONTROL));
        events.push(enter());
        let (mut editor, _) = editor_with_events(events);
        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "a");
    }

    #[test]
    fn test_masked_line_echoes_mask_and_skips_history() {
        let mut events = key_events_for("s3cret");
        events.push(enter());
        let (mut editor, stdout_mock) = editor_with_events(events);

        let result = editor.read_line_masked("pw: ", '*').unwrap();
        assert_eq!(result, "s3cret");
        assert_eq!(editor.history().len(), 0);

        let output = stdout_mock.get_copy_of_buffer_as_stripped_string();
        assert!(output.contains("pw: ******"));
        assert!(!output.contains("s3cret"));
    }

    #[test]
    fn test_initial_buffer() {
        let events = vec![enter()];
        let (mut editor, _) = editor_with_events(events);
        let result = editor
            .read_line_with(ReadLineParams {
                prompt: Some("> ".into()),
                initial_buffer: Some("preset".into()),
                ..ReadLineParams::default()
            })
            .unwrap();
        assert_eq!(result, "preset");
    }

    #[test]
    fn test_secondary_prompt_on_parser_eof() {
        let mut events = key_events_for("echo 'a");
        events.push(enter());
        events.extend(key_events_for("b'"));
        events.push(enter());
        let (mut editor, stdout_mock) = editor_with_events(events);

        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "echo 'a\nb'");
        let output = stdout_mock.get_copy_of_buffer_as_stripped_string();
        // Secondary prompt (default "%M> ") shows the missing quote.
        assert!(output.contains("'> "));
    }

    #[test]
    fn test_print_above_while_reading() {
        let mut events = key_events_for("hi");
        events.push(enter());
        let (mut editor, stdout_mock) = editor_with_events(events);
        let mut writer = editor.shared_writer();
        writeln!(writer, "log line").unwrap();

        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "hi");
        let output = stdout_mock.get_copy_of_buffer_as_stripped_string();
        assert!(output.contains("log line"));
    }

    #[test]
    fn test_up_down_history_navigation() {
        let mut events = vec![
            key_event(KeyCode::Up, KeyModifiers::NONE),
            key_event(KeyCode::Up, KeyModifiers::NONE),
            key_event(KeyCode::Up, KeyModifiers::NONE),
        ];
        events.push(enter());
        let (mut editor, _) = editor_with_events(events);
        editor.history_mut().rules.incremental = false;
        editor.history_mut().rules.timestamped = false;
        editor.history_mut().add("ls");
        editor.history_mut().add("ls -l");
        editor.history_mut().add("git status");

        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "ls");
    }

    #[test]
    fn test_bell_on_undefined_in_vicmd() {
        let mut events = vec![
            key_event(KeyCode::Esc, KeyModifiers::NONE),
            key_event(KeyCode::Char('q'), KeyModifiers::NONE),
        ];
        events.push(enter());
        let (mut editor, stdout_mock) = editor_with_events(events);
        editor.set_keymap(KeyMaps::VI_INSERT).unwrap();

        let result = editor.read_line("> ").unwrap();
        assert_eq!(result, "");
        let output = stdout_mock.get_copy_of_buffer_as_string();
        assert!(output.contains('\u{7}'));
    }

    #[test]
    fn test_set_keymap_unknown_is_illegal_argument() {
        let (mut editor, _) = editor_with_events(vec![]);
        assert!(matches!(
            editor.set_keymap("bogus"),
            Err(ReadlineError::IllegalArgument(_))
        ));
    }
}
