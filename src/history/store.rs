// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Append-only history ring, shared across read sessions. Entries carry a
//! monotonically increasing index that survives trimming, so search cursors
//! stay valid while the ring rolls.

use crate::history::file as history_file;
use regex::Regex;
use std::{collections::VecDeque,
          path::{Path, PathBuf},
          time::{SystemTime, UNIX_EPOCH}};
use tracing::warn;

pub const HISTORY_SIZE_MAX: usize = 1_000;
pub const HISTORY_FILE_SIZE_MAX: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub index: u64,
    pub timestamp: Option<u64>,
    pub text: String,
}

/// Behavior knobs synced from the reader's options before each session.
#[derive(Debug, Clone, Copy)]
pub struct HistoryRules {
    pub ignore_space: bool,
    pub ignore_dups: bool,
    pub reduce_blanks: bool,
    pub incremental: bool,
    pub timestamped: bool,
}

impl Default for HistoryRules {
    fn default() -> Self {
        Self {
            ignore_space: true,
            ignore_dups: true,
            reduce_blanks: true,
            incremental: true,
            timestamped: true,
        }
    }
}

#[derive(Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    next_index: u64,
    pub max_size: usize,
    pub file_max_size: usize,
    pub rules: HistoryRules,
    path: Option<PathBuf>,
    ignore_patterns: Vec<Regex>,
}

impl Default for History {
    fn default() -> Self { Self::new() }
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_index: 0,
            max_size: HISTORY_SIZE_MAX,
            file_max_size: HISTORY_FILE_SIZE_MAX,
            rules: HistoryRules::default(),
            path: None,
            ignore_patterns: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Logical index of the first retained entry.
    #[must_use]
    pub fn first_index(&self) -> Option<u64> { self.entries.front().map(|e| e.index) }

    #[must_use]
    pub fn last_index(&self) -> Option<u64> { self.entries.back().map(|e| e.index) }

    #[must_use]
    pub fn get(&self, index: u64) -> Option<&HistoryEntry> {
        let first = self.first_index()?;
        if index < first {
            return None;
        }
        self.entries.get((index - first) as usize)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Compiles the colon-separated `history-ignore` glob list. Patterns
    /// that fail to compile are dropped with a warning.
    pub fn set_ignore_patterns(&mut self, patterns: &str) {
        self.ignore_patterns = patterns
            .split(':')
            .filter(|p| !p.is_empty())
            .filter_map(|p| match Regex::new(&glob_to_regex(p)) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    warn!(pattern = p, %err, "bad history-ignore pattern dropped");
                    None
                }
            })
            .collect();
    }

    /// The ignore rules every stored line passes through, whether typed at
    /// the prompt or merged back from a file: leading-space skip, blank
    /// canonicalization, consecutive-dup skip against `previous`, and the
    /// `history-ignore` patterns. Returns the canonical text to store, or
    /// `None` when the line is filtered out.
    fn apply_ignore_rules(&self, line: &str, previous: Option<&str>) -> Option<String> {
        if line.is_empty() {
            return None;
        }
        if self.rules.ignore_space && line.starts_with(' ') {
            return None;
        }
        let text = if self.rules.reduce_blanks {
            reduce_blanks(line)
        } else {
            line.to_string()
        };
        if text.is_empty() {
            return None;
        }
        if self.rules.ignore_dups && previous == Some(text.as_str()) {
            return None;
        }
        if self.ignore_patterns.iter().any(|p| p.is_match(&text)) {
            return None;
        }
        Some(text)
    }

    /// Applies ignore rules and appends. Returns the stored text, or `None`
    /// when the line was filtered out. With incremental persistence on, the
    /// entry is written through to the file immediately.
    pub fn add(&mut self, line: &str) -> Option<&HistoryEntry> {
        let previous = self.entries.back().map(|entry| entry.text.as_str());
        let text = self.apply_ignore_rules(line, previous)?;

        let timestamp = self.rules.timestamped.then(now_millis);
        let entry = HistoryEntry {
            index: self.next_index,
            timestamp,
            text,
        };
        self.next_index += 1;
        self.entries.push_back(entry);
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
        }

        let stored = self.entries.back().expect("just pushed");
        if self.rules.incremental {
            if let Some(path) = &self.path {
                if let Err(err) = history_file::append_entry(path, stored, self.rules.timestamped)
                {
                    // Drop this record only; the session keeps going.
                    warn!(?path, %err, "incremental history write failed");
                }
            }
        }
        Some(stored)
    }

    /// Attaches a history file and merges its entries in front of whatever
    /// is already in memory. Merged lines pass through the same ignore
    /// rules as [`Self::add`], so a file written under older settings is
    /// re-filtered against the session's current rules.
    pub fn attach_file(&mut self, path: &Path) {
        self.path = Some(path.to_path_buf());
        match history_file::load(path, self.rules.timestamped) {
            Ok(loaded) => self.merge_loaded(loaded),
            Err(err) => warn!(?path, %err, "history file load failed"),
        }
    }

    fn merge_loaded(&mut self, loaded: Vec<(Option<u64>, String)>) {
        let existing: Vec<HistoryEntry> = self.entries.drain(..).collect();
        let mut merged: VecDeque<HistoryEntry> = VecDeque::new();
        let mut index = 0u64;

        let incoming = loaded
            .into_iter()
            .chain(existing.into_iter().map(|entry| (entry.timestamp, entry.text)));
        for (timestamp, line) in incoming {
            let previous = merged.back().map(|entry| entry.text.as_str());
            let Some(text) = self.apply_ignore_rules(&line, previous) else {
                continue;
            };
            merged.push_back(HistoryEntry {
                index,
                timestamp,
                text,
            });
            index += 1;
        }

        while merged.len() > self.max_size {
            merged.pop_front();
        }
        self.next_index = index;
        self.entries = merged;
    }

    /// Rewrites the whole file atomically, capped at `file_max_size`. A
    /// failed rewrite leaves the previous file intact.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let skip = self.entries.len().saturating_sub(self.file_max_size);
        history_file::rewrite(
            path,
            self.entries.iter().skip(skip),
            self.rules.timestamped,
        )
    }

    /// Scrubs entry text (masked sessions never reach here; this covers the
    /// explicit purge API).
    pub fn purge(&mut self) {
        for entry in &mut self.entries {
            entry.text = "\0".repeat(entry.text.chars().count());
        }
        self.entries.clear();
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Canonicalizes whitespace runs to single spaces and trims the ends.
#[must_use]
pub fn reduce_blanks(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Translates one shell glob (`*`, `?`) into an anchored regex.
#[must_use]
pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    for ch in glob.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c if "\\.+()[]{}|^$".contains(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plain_history() -> History {
        let mut history = History::new();
        history.rules.incremental = false;
        history.rules.timestamped = false;
        history
    }

    #[test]
    fn test_add_and_index() {
        let mut history = plain_history();
        history.add("ls");
        history.add("ls -l");
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(0).unwrap().text, "ls");
        assert_eq!(history.get(1).unwrap().text, "ls -l");
    }

    #[test]
    fn test_consecutive_dups_store_once() {
        let mut history = plain_history();
        history.add("make");
        history.add("make");
        history.add("make");
        assert_eq!(history.len(), 1);

        history.rules.ignore_dups = false;
        history.add("make");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_ignore_space() {
        let mut history = plain_history();
        assert!(history.add(" secret").is_none());
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_reduce_blanks() {
        let mut history = plain_history();
        history.add("git   status  ");
        assert_eq!(history.get(0).unwrap().text, "git status");
        // The reduced form is what dedup compares against.
        assert!(history.add("git status").is_none());
    }

    #[test]
    fn test_ignore_patterns() {
        let mut history = plain_history();
        history.set_ignore_patterns("ls*:cd");
        assert!(history.add("ls -l").is_none());
        assert!(history.add("cd").is_none());
        assert!(history.add("cdx").is_some());
        assert!(history.add("git ls").is_some());
    }

    #[test]
    fn test_size_cap_rolls_oldest_out() {
        let mut history = plain_history();
        history.max_size = 2;
        history.add("one");
        history.add("two");
        history.add("three");
        assert_eq!(history.len(), 2);
        assert_eq!(history.first_index(), Some(1));
        assert!(history.get(0).is_none());
        assert_eq!(history.get(2).unwrap().text, "three");
    }

    #[test]
    fn test_glob_to_regex() {
        assert_eq!(glob_to_regex("ls*"), "^ls.*$");
        assert_eq!(glob_to_regex("a?c"), "^a.c$");
        assert_eq!(glob_to_regex("a.b"), "^a\\.b$");
    }

    #[test]
    fn test_attach_file_applies_ignore_rules_on_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        // A file written before the session's rules existed: leading
        // space, irregular blanks, a now-ignored command, and a dup run.
        let stale: Vec<HistoryEntry> = [" secret", "git   status", "ls -l", "make", "make"]
            .iter()
            .enumerate()
            .map(|(i, text)| HistoryEntry {
                index: i as u64,
                timestamp: None,
                text: (*text).to_string(),
            })
            .collect();
        crate::history::file::rewrite(&path, stale.iter(), false).unwrap();

        let mut history = plain_history();
        history.set_ignore_patterns("ls*");
        history.attach_file(&path);

        let texts: Vec<&str> = history.iter().map(|entry| entry.text.as_str()).collect();
        assert_eq!(texts, vec!["git status", "make"]);
    }

    #[test]
    fn test_attach_file_merges_before_in_memory_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        let on_disk = [HistoryEntry {
            index: 0,
            timestamp: None,
            text: "from-file".to_string(),
        }];
        crate::history::file::rewrite(&path, on_disk.iter(), false).unwrap();

        let mut history = plain_history();
        history.add("in-memory");
        history.attach_file(&path);

        let texts: Vec<&str> = history.iter().map(|entry| entry.text.as_str()).collect();
        assert_eq!(texts, vec!["from-file", "in-memory"]);
    }
}
