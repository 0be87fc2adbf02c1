// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! History file persistence. UTF-8, one entry per line; with timestamps each
//! entry is preceded by a `#<unix-millis>` line; embedded newlines are
//! escaped with a trailing backslash so multi-line entries survive the
//! round trip. Rewrites go through a sibling temp file and an atomic rename,
//! so a failed rewrite leaves the previous file intact.

use crate::HistoryEntry;
use std::{fs,
          io::{self, Write},
          path::Path};

/// Loads `(timestamp, text)` pairs. `timestamped` mirrors the flag the
/// file was written with: `#<millis>` lines are only recognized when set,
/// so a plain file's all-digit `#…` entries survive the round trip. A
/// missing file is an empty history, not an error.
pub fn load(path: &Path, timestamped: bool) -> io::Result<Vec<(Option<u64>, String)>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut out = Vec::new();
    let mut timestamp: Option<u64> = None;
    let mut pending: Option<String> = None;

    for line in raw.lines() {
        if let Some(text) = &mut pending {
            // Continuation of an escaped multi-line entry.
            text.push('\n');
            text.push_str(line);
        } else {
            if timestamped {
                if let Some(millis) = parse_timestamp_line(line) {
                    timestamp = Some(millis);
                    continue;
                }
            }
            pending = Some(line.to_string());
        }

        let text = pending.as_mut().expect("set above");
        if ends_with_escape(text) {
            // Strip the escaping backslash; the next physical line joins.
            text.pop();
        } else {
            let text = pending.take().expect("set above");
            out.push((timestamp.take(), unescape_backslashes(&text)));
        }
    }
    // A trailing escaped line with no continuation is kept as-is.
    if let Some(text) = pending {
        out.push((timestamp, unescape_backslashes(&text)));
    }
    Ok(out)
}

/// Appends one entry (incremental mode).
pub fn append_entry(path: &Path, entry: &HistoryEntry, timestamped: bool) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    write_entry(&mut file, entry, timestamped)?;
    file.flush()
}

/// Rewrites the whole file atomically.
pub fn rewrite<'a>(
    path: &Path,
    entries: impl Iterator<Item = &'a HistoryEntry>,
    timestamped: bool,
) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let temp_path = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&temp_path)?;
        for entry in entries {
            write_entry(&mut file, entry, timestamped)?;
        }
        file.flush()?;
    }
    fs::rename(&temp_path, path)
}

fn write_entry(file: &mut fs::File, entry: &HistoryEntry, timestamped: bool) -> io::Result<()> {
    if timestamped {
        if let Some(millis) = entry.timestamp {
            writeln!(file, "#{millis}")?;
        }
    }
    writeln!(file, "{}", escape_newlines(&entry.text))
}

fn parse_timestamp_line(line: &str) -> Option<u64> {
    let digits = line.strip_prefix('#')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn escape_newlines(text: &str) -> String {
    // Literal backslashes double so a trailing one cannot read back as a
    // line continuation.
    text.replace('\\', "\\\\").replace('\n', "\\\n")
}

fn unescape_backslashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// True when the line ends in an odd run of backslashes, i.e. the final
/// backslash escapes the newline rather than itself.
fn ends_with_escape(text: &str) -> bool {
    text.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}
