// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Matcher chain: case-sensitive prefix → case-insensitive prefix →
//! camelCase humps → typo (edit distance within the `errors` budget). The
//! first matcher that yields any survivors wins.

use crate::Candidate;

#[derive(Debug, Copy, Clone)]
pub struct MatcherOptions {
    /// Skip straight to case-insensitive matching.
    pub case_insensitive: bool,
    /// Enables the typo matcher with this many tolerated edits. Zero
    /// disables it.
    pub typo_errors: usize,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            typo_errors: 2,
        }
    }
}

/// Runs the chain for `word` over `candidates`, returning the survivors of
/// the first non-empty stage.
#[must_use]
pub fn match_candidates(
    word: &str,
    candidates: &[Candidate],
    options: MatcherOptions,
) -> Vec<Candidate> {
    if word.is_empty() {
        return candidates.to_vec();
    }

    type Stage = fn(&str, &str) -> bool;
    let mut stages: Vec<Stage> = Vec::new();
    if !options.case_insensitive {
        stages.push(prefix_match);
    }
    stages.push(prefix_match_ci);
    stages.push(camel_match);

    for stage in stages {
        let survivors: Vec<Candidate> = candidates
            .iter()
            .filter(|candidate| stage(word, &candidate.value))
            .cloned()
            .collect();
        if !survivors.is_empty() {
            return survivors;
        }
    }

    if options.typo_errors > 0 {
        let survivors: Vec<Candidate> = candidates
            .iter()
            .filter(|candidate| typo_match(word, &candidate.value, options.typo_errors))
            .cloned()
            .collect();
        if !survivors.is_empty() {
            return survivors;
        }
    }
    Vec::new()
}

fn prefix_match(word: &str, value: &str) -> bool { value.starts_with(word) }

fn prefix_match_ci(word: &str, value: &str) -> bool {
    value.to_lowercase().starts_with(&word.to_lowercase())
}

/// camelCase hump matching: each word character must match either the next
/// value character in sequence or the start of a following hump (an upper
/// case letter, or the character after `-`/`_`/`.`).
#[must_use]
pub fn camel_match(word: &str, value: &str) -> bool {
    let value_chars: Vec<char> = value.chars().collect();
    let mut pos = 0usize;
    for word_char in word.chars() {
        // Consecutive match at the current position.
        if pos < value_chars.len()
            && value_chars[pos].to_lowercase().eq(word_char.to_lowercase())
        {
            pos += 1;
            continue;
        }
        // Otherwise jump to the next hump start that matches.
        let mut found = false;
        let mut idx = pos;
        while idx < value_chars.len() {
            if is_hump_start(&value_chars, idx)
                && value_chars[idx].to_lowercase().eq(word_char.to_lowercase())
            {
                pos = idx + 1;
                found = true;
                break;
            }
            idx += 1;
        }
        if !found {
            return false;
        }
    }
    true
}

fn is_hump_start(chars: &[char], idx: usize) -> bool {
    if idx == 0 {
        return true;
    }
    let prev = chars[idx - 1];
    chars[idx].is_uppercase() || matches!(prev, '-' | '_' | '.')
}

/// Edit distance within `errors`, comparing the word against the value
/// prefix of the same length (a typo in what was typed so far, not in the
/// untyped tail).
#[must_use]
pub fn typo_match(word: &str, value: &str, errors: usize) -> bool {
    let word_chars: Vec<char> = word.chars().collect();
    let value_prefix: Vec<char> = value.chars().take(word_chars.len()).collect();
    levenshtein(&word_chars, &value_prefix) <= errors
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, &a_char) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &b_char) in b.iter().enumerate() {
            let cost = usize::from(!a_char.eq_ignore_ascii_case(&b_char));
            current[j + 1] = (prev[j] + cost)
                .min(prev[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(values: &[&str]) -> Vec<Candidate> {
        values.iter().map(|v| Candidate::new(v)).collect()
    }

    fn values(matched: &[Candidate]) -> Vec<String> {
        matched.iter().map(|c| c.value.clone()).collect()
    }

    #[test]
    fn test_exact_prefix_wins() {
        let pool = candidates(&["commit", "checkout", "Clone"]);
        let matched = match_candidates("c", &pool, MatcherOptions::default());
        assert_eq!(values(&matched), vec!["commit", "checkout"]);
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let pool = candidates(&["Commit", "Checkout"]);
        let matched = match_candidates("co", &pool, MatcherOptions::default());
        assert_eq!(values(&matched), vec!["Commit"]);
    }

    #[test]
    fn test_camel_match() {
        assert!(camel_match("fB", "fooBar"));
        assert!(camel_match("gs", "git-status"));
        assert!(!camel_match("fx", "fooBar"));
        let pool = candidates(&["fooBar", "fooBaz"]);
        let matched = match_candidates("fB", &pool, MatcherOptions::default());
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn test_typo_match_last_resort() {
        let pool = candidates(&["commit"]);
        let matched = match_candidates("xommit", &pool, MatcherOptions::default());
        assert_eq!(values(&matched), vec!["commit"]);

        let disabled = MatcherOptions {
            typo_errors: 0,
            ..MatcherOptions::default()
        };
        assert!(match_candidates("xommit", &pool, disabled).is_empty());
    }

    #[test]
    fn test_empty_word_matches_all() {
        let pool = candidates(&["a", "b"]);
        assert_eq!(match_candidates("", &pool, MatcherOptions::default()).len(), 2);
    }
}
