// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Reader configuration: boolean options (stable SCREAMING_SNAKE names) and
//! string-keyed variables, with the documented defaults. Variable names
//! match the inputrc vocabulary, so an external inputrc layer can set them
//! without translation.

use std::collections::HashMap;
use strum_macros::{Display, EnumIter, EnumString};

/// Boolean behavior flags.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EditorOption {
    CompleteInWord,
    CaseInsensitive,
    AutoGroup,
    AutoMenu,
    AutoList,
    Group,
    AutoParamSlash,
    AutoRemoveSlash,
    BracketedPaste,
    HistoryIgnoreSpace,
    HistoryIgnoreDups,
    HistoryReduceBlanks,
    HistoryBeep,
    HistoryIncremental,
    HistoryTimestamped,
    DelayLineWrap,
    EmptyWordOptions,
    CompleteMatcherTypo,
    DisableUndo,
    EraseLineOnFinish,
    InsertTab,
    Mouse,
    ListRowsFirst,
    ListPacked,
    MenuComplete,
}

impl EditorOption {
    /// Documented default for each flag.
    #[must_use]
    pub fn default_value(self) -> bool {
        use EditorOption::*;
        match self {
            AutoGroup | AutoMenu | AutoList | Group | AutoParamSlash | AutoRemoveSlash
            | BracketedPaste | HistoryIgnoreSpace | HistoryIgnoreDups | HistoryReduceBlanks
            | HistoryBeep | HistoryIncremental | HistoryTimestamped | EmptyWordOptions
            | CompleteMatcherTypo => true,
            CompleteInWord | CaseInsensitive | DelayLineWrap | DisableUndo
            | EraseLineOnFinish | InsertTab | Mouse | ListRowsFirst | ListPacked
            | MenuComplete => false,
        }
    }
}

/// `bell-style` values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BellStyle {
    None,
    #[default]
    Audible,
    Visible,
}

// Variable names (string-keyed, stable).
pub const LIST_MAX: &str = "list-max";
pub const MENU_LIST_MAX: &str = "menu-list-max";
pub const HISTORY_FILE: &str = "history-file";
pub const HISTORY_SIZE: &str = "history-size";
pub const HISTORY_FILE_SIZE: &str = "history-file-size";
pub const HISTORY_IGNORE: &str = "history-ignore";
pub const AMBIGUOUS_BINDING: &str = "ambiguous-binding";
pub const SECONDARY_PROMPT_PATTERN: &str = "secondary-prompt-pattern";
pub const LINE_OFFSET: &str = "line-offset";
pub const TAB_WIDTH: &str = "tab-width";
pub const FEATURES_MAX_BUFFER_SIZE: &str = "features-max-buffer-size";
pub const SUGGESTIONS_MIN_BUFFER_SIZE: &str = "suggestions-min-buffer-size";
pub const COMMENT_BEGIN: &str = "comment-begin";
pub const BELL_STYLE: &str = "bell-style";
pub const WORDCHARS: &str = "wordchars";
pub const REMOVE_SUFFIX_CHARS: &str = "remove-suffix-chars";
pub const SEARCH_TERMINATORS: &str = "search-terminators";
pub const ERRORS: &str = "errors";
pub const OTHERS_GROUP_NAME: &str = "others-group-name";
pub const MAX_REPEAT_COUNT: &str = "max-repeat-count";

#[derive(Debug, Default)]
pub struct Config {
    options: HashMap<EditorOption, bool>,
    vars: HashMap<String, String>,
}

impl Config {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn is_set(&self, option: EditorOption) -> bool {
        self.options
            .get(&option)
            .copied()
            .unwrap_or_else(|| option.default_value())
    }

    pub fn set_option(&mut self, option: EditorOption, value: bool) {
        self.options.insert(option, value);
    }

    pub fn unset_option(&mut self, option: EditorOption) {
        self.options.insert(option, false);
    }

    /// Sets a string-keyed variable.
    pub fn set_var(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    #[must_use]
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn var_or(&self, name: &str, default: &str) -> String {
        self.var(name).unwrap_or(default).to_string()
    }

    fn var_usize(&self, name: &str, default: usize) -> usize {
        self.var(name)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }

    // Typed accessors with the documented defaults.

    #[must_use]
    pub fn list_max(&self) -> usize { self.var_usize(LIST_MAX, 100) }

    #[must_use]
    pub fn menu_list_max(&self) -> usize { self.var_usize(MENU_LIST_MAX, usize::MAX) }

    #[must_use]
    pub fn history_size(&self) -> usize {
        self.var_usize(HISTORY_SIZE, crate::HISTORY_SIZE_MAX)
    }

    #[must_use]
    pub fn history_file_size(&self) -> usize {
        self.var_usize(HISTORY_FILE_SIZE, crate::HISTORY_FILE_SIZE_MAX)
    }

    /// Ambiguous-binding resolution timeout, in milliseconds.
    #[must_use]
    pub fn ambiguous_binding_ms(&self) -> u64 {
        self.var_usize(AMBIGUOUS_BINDING, 1_000) as u64
    }

    #[must_use]
    pub fn secondary_prompt_pattern(&self) -> String {
        self.var_or(SECONDARY_PROMPT_PATTERN, "%M> ")
    }

    #[must_use]
    pub fn line_offset(&self) -> u64 { self.var_usize(LINE_OFFSET, 0) as u64 }

    #[must_use]
    pub fn tab_width(&self) -> u16 { self.var_usize(TAB_WIDTH, 4) as u16 }

    #[must_use]
    pub fn comment_begin(&self) -> String { self.var_or(COMMENT_BEGIN, "#") }

    #[must_use]
    pub fn bell_style(&self) -> BellStyle {
        self.var(BELL_STYLE)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn word_chars(&self) -> String { self.var_or(WORDCHARS, "*?_-.[]~=/&;!#$%^(){}<>") }

    #[must_use]
    pub fn remove_suffix_chars(&self) -> String {
        self.var_or(REMOVE_SUFFIX_CHARS, " \t\n;&|")
    }

    #[must_use]
    pub fn search_terminators(&self) -> String { self.var_or(SEARCH_TERMINATORS, "\u{1b}\n") }

    /// Typo matcher edit budget.
    #[must_use]
    pub fn errors(&self) -> usize { self.var_usize(ERRORS, 2) }

    #[must_use]
    pub fn others_group_name(&self) -> String { self.var_or(OTHERS_GROUP_NAME, "others") }

    #[must_use]
    pub fn max_repeat_count(&self) -> i64 { self.var_usize(MAX_REPEAT_COUNT, 9_999) as i64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_documented_defaults() {
        let config = Config::new();
        assert!(!config.is_set(EditorOption::CompleteInWord));
        assert!(!config.is_set(EditorOption::CaseInsensitive));
        assert!(config.is_set(EditorOption::AutoMenu));
        assert!(config.is_set(EditorOption::AutoList));
        assert!(config.is_set(EditorOption::HistoryIgnoreDups));
        assert!(!config.is_set(EditorOption::DisableUndo));
        assert!(!config.is_set(EditorOption::Mouse));
    }

    #[test]
    fn test_set_and_unset() {
        let mut config = Config::new();
        config.set_option(EditorOption::AutoMenu, false);
        assert!(!config.is_set(EditorOption::AutoMenu));
        config.set_option(EditorOption::CaseInsensitive, true);
        assert!(config.is_set(EditorOption::CaseInsensitive));
    }

    #[test]
    fn test_option_names_are_stable() {
        assert_eq!(EditorOption::AutoMenu.to_string(), "AUTO_MENU");
        assert_eq!(
            "HISTORY_IGNORE_DUPS".parse::<EditorOption>().unwrap(),
            EditorOption::HistoryIgnoreDups
        );
        // Every option round-trips through its name.
        for option in EditorOption::iter() {
            assert_eq!(option.to_string().parse::<EditorOption>().unwrap(), option);
        }
    }

    #[test]
    fn test_variables() {
        let mut config = Config::new();
        assert_eq!(config.list_max(), 100);
        config.set_var(LIST_MAX, "50");
        assert_eq!(config.list_max(), 50);
        config.set_var(BELL_STYLE, "visible");
        assert_eq!(config.bell_style(), BellStyle::Visible);
        config.set_var(BELL_STYLE, "bogus");
        assert_eq!(config.bell_style(), BellStyle::Audible);
    }
}
