// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The completion pipeline: gather candidates from every completer,
//! normalize and deduplicate, run the matcher chain, then pick a behavior
//! (insert / extend prefix / list / menu) for the session to apply.

use crate::{match_candidates, Candidate, MatcherOptions, MenuState, ParsedLine};
use std::collections::HashSet;

/// Engine knobs, snapshot of reader options/variables at invocation time.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub auto_menu: bool,
    pub auto_list: bool,
    pub complete_in_word: bool,
    pub auto_param_slash: bool,
    /// An empty word offers every candidate when set.
    pub empty_word: bool,
    pub group: bool,
    pub auto_group: bool,
    pub others_group_name: String,
    pub list_rows_first: bool,
    pub list_packed: bool,
    pub list_max: usize,
    /// Candidate counts above this fall back from menu to a plain list.
    pub menu_list_max: usize,
    pub matcher: MatcherOptions,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            auto_menu: true,
            auto_list: true,
            complete_in_word: false,
            auto_param_slash: true,
            empty_word: true,
            group: true,
            auto_group: true,
            others_group_name: "others".to_string(),
            list_rows_first: false,
            list_packed: false,
            list_max: 100,
            menu_list_max: usize::MAX,
            matcher: MatcherOptions::default(),
        }
    }
}

/// What the invoking widget should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompleteOutcome {
    /// No candidate survived: ring the bell.
    NoMatches,
    /// Sole survivor: replace the word, apply the suffix policy.
    Insert(Candidate),
    /// Several survivors and the common prefix extends the word.
    ExtendPrefix {
        prefix: String,
        survivors: Vec<Candidate>,
    },
    /// Several survivors, nothing to extend: list them (or beep when
    /// listing is off).
    List(Vec<Candidate>),
    /// Candidate count exceeds `list-max`: ask before displaying.
    ConfirmList(Vec<Candidate>),
    /// Enter the menu sub-loop.
    Menu(MenuState),
}

/// Collects candidates in completer order, strips ANSI from display text,
/// and deduplicates by the `(value, group, sort key)` triple.
#[must_use]
pub fn normalize(raw: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: HashSet<(String, Option<String>, Option<String>)> = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for mut candidate in raw {
        let stripped = strip_ansi_escapes::strip(candidate.display.as_bytes());
        candidate.display = String::from_utf8_lossy(&stripped).to_string();
        if seen.insert(candidate.dedup_key()) {
            out.push(candidate);
        }
    }
    out
}

/// Longest common prefix across survivor values.
#[must_use]
pub fn common_prefix(candidates: &[Candidate]) -> String {
    let Some(first) = candidates.first() else {
        return String::new();
    };
    let mut prefix: Vec<char> = first.value.chars().collect();
    for candidate in &candidates[1..] {
        let mut len = 0usize;
        for (a, b) in prefix.iter().zip(candidate.value.chars()) {
            if *a != b {
                break;
            }
            len += 1;
        }
        prefix.truncate(len);
        if prefix.is_empty() {
            break;
        }
    }
    prefix.into_iter().collect()
}

/// The word prefix completion matches against: up to the cursor when
/// completing in-word, the whole word otherwise.
#[must_use]
pub fn completion_word(parsed: &ParsedLine, complete_in_word: bool) -> String {
    let word = parsed.word();
    if complete_in_word {
        word.chars().take(parsed.word_cursor).collect()
    } else {
        word.to_string()
    }
}

/// Runs matching and behavior selection. `force_menu` is set by the
/// `menu-complete` family, which skips prefix insertion and goes straight
/// to cycling.
#[must_use]
pub fn decide(
    candidates: Vec<Candidate>,
    parsed: &ParsedLine,
    config: &CompletionConfig,
    force_menu: bool,
) -> CompleteOutcome {
    let word = completion_word(parsed, config.complete_in_word);
    if word.is_empty() && !config.empty_word {
        return CompleteOutcome::NoMatches;
    }
    let mut survivors = match_candidates(&word, &normalize(candidates), config.matcher);
    if survivors.is_empty() {
        return CompleteOutcome::NoMatches;
    }
    survivors.sort_by(|a, b| a.order_key().cmp(b.order_key()));

    if survivors.len() == 1 {
        return CompleteOutcome::Insert(survivors.remove(0));
    }

    if (force_menu || config.auto_menu) && survivors.len() <= config.menu_list_max {
        let prefix = common_prefix(&survivors);
        let initial = if force_menu { None } else { Some(prefix) };
        return CompleteOutcome::Menu(MenuState::new(survivors, word, initial));
    }

    let prefix = common_prefix(&survivors);
    if prefix.chars().count() > word.chars().count() {
        return CompleteOutcome::ExtendPrefix {
            prefix,
            survivors,
        };
    }

    if survivors.len() > config.list_max {
        CompleteOutcome::ConfirmList(survivors)
    } else if config.auto_list {
        CompleteOutcome::List(survivors)
    } else {
        CompleteOutcome::NoMatches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parsed_word(word: &str) -> ParsedLine {
        ParsedLine {
            words: vec![word.to_string()],
            word_index: 0,
            word_cursor: word.chars().count(),
            raw_word_cursor: word.chars().count(),
            line: word.to_string(),
            cursor: word.chars().count(),
        }
    }

    fn pool(values: &[&str]) -> Vec<Candidate> {
        values.iter().map(|v| Candidate::new(v)).collect()
    }

    #[test]
    fn test_normalize_strips_ansi_and_dedups() {
        let mut fancy = Candidate::new("commit");
        fancy.display = "\u{1b}[1mcommit\u{1b}[0m".to_string();
        let out = normalize(vec![fancy, Candidate::new("commit")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].display, "commit");
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix(&pool(&["commit", "checkout", "clone"])), "c");
        assert_eq!(common_prefix(&pool(&["checkout", "check"])), "check");
        assert_eq!(common_prefix(&pool(&[])), "");
    }

    #[test]
    fn test_single_candidate_inserts() {
        let config = CompletionConfig::default();
        let outcome = decide(pool(&["commit", "checkout"]), &parsed_word("com"), &config, false);
        assert!(matches!(
            outcome,
            CompleteOutcome::Insert(candidate) if candidate.value == "commit"
        ));
    }

    #[test]
    fn test_no_matches_beeps() {
        let config = CompletionConfig {
            matcher: MatcherOptions {
                typo_errors: 0,
                ..MatcherOptions::default()
            },
            ..CompletionConfig::default()
        };
        let outcome = decide(pool(&["commit"]), &parsed_word("zzz"), &config, false);
        assert_eq!(outcome, CompleteOutcome::NoMatches);
    }

    #[test]
    fn test_prefix_extension_without_auto_menu() {
        let config = CompletionConfig {
            auto_menu: false,
            ..CompletionConfig::default()
        };
        let outcome = decide(
            pool(&["checkout", "cherry-pick"]),
            &parsed_word("c"),
            &config,
            false,
        );
        assert!(matches!(
            outcome,
            CompleteOutcome::ExtendPrefix { prefix, .. } if prefix == "ch"
        ));
    }

    #[test]
    fn test_unextendable_prefix_lists() {
        let config = CompletionConfig {
            auto_menu: false,
            ..CompletionConfig::default()
        };
        // Common prefix equals the word: nothing to insert, so list.
        let outcome = decide(
            pool(&["commit", "checkout", "clone"]),
            &parsed_word("c"),
            &config,
            false,
        );
        assert!(matches!(outcome, CompleteOutcome::List(survivors) if survivors.len() == 3));
    }

    #[test]
    fn test_menu_when_auto_menu_on() {
        let config = CompletionConfig::default();
        let outcome = decide(
            pool(&["commit", "checkout", "clone"]),
            &parsed_word("c"),
            &config,
            false,
        );
        assert!(matches!(outcome, CompleteOutcome::Menu(_)));
    }

    #[test]
    fn test_confirm_when_over_list_max() {
        let config = CompletionConfig {
            auto_menu: false,
            list_max: 2,
            ..CompletionConfig::default()
        };
        let outcome = decide(
            pool(&["commit", "checkout", "clone"]),
            &parsed_word("c"),
            &config,
            false,
        );
        assert!(matches!(outcome, CompleteOutcome::ConfirmList(_)));
    }
}
