// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Widget registry: every editing operation is a named function value so
//! key bindings stay table-driven and user rebinding is data, not code.

use crate::EditSession;
use std::collections::HashMap;

/// A widget mutates the session and reports success; `false` rings the
/// bell per `bell-style`.
pub type Widget = fn(&mut EditSession<'_>) -> bool;

#[derive(Default)]
pub struct WidgetRegistry {
    map: HashMap<&'static str, Widget>,
}

impl WidgetRegistry {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub fn register(&mut self, name: &'static str, widget: Widget) {
        self.map.insert(name, widget);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Widget> { self.map.get(name).copied() }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool { self.map.contains_key(name) }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.map.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Builds the registry with the full stock widget set.
#[must_use]
pub fn default_registry() -> WidgetRegistry {
    let mut registry = WidgetRegistry::new();
    crate::widgets::emacs::register_emacs_widgets(&mut registry);
    crate::widgets::complete::register_completion_widgets(&mut registry);
    crate::widgets::search::register_search_widgets(&mut registry);
    crate::widgets::vi::register_vi_widgets(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{default_keymaps, emacs_keymap, vi_cmd_keymap, Binding, KeyMaps, Lookup};

    #[test]
    fn test_every_default_binding_has_a_widget() {
        let registry = default_registry();
        let keymaps = default_keymaps();
        for name in [
            KeyMaps::EMACS,
            KeyMaps::VI_INSERT,
            KeyMaps::VI_CMD,
            KeyMaps::VISUAL,
            KeyMaps::MENU,
        ] {
            let keymap = keymaps.get(name).unwrap();
            for seq in all_bound_sequences(keymap) {
                if let Lookup::Complete(Binding::Widget(widget))
                | Lookup::CompleteAndPrefix(Binding::Widget(widget)) = keymap.lookup(&seq)
                {
                    assert!(
                        registry.contains(&widget),
                        "keymap {name} binds unknown widget {widget}"
                    );
                }
            }
        }
    }

    // Walks the trie by brute force over the sequences the default maps
    // use (single chars, ESC pairs, CSI arrows, C-x pairs).
    fn all_bound_sequences(keymap: &crate::KeyMap) -> Vec<String> {
        let mut seqs = Vec::new();
        let singles: Vec<char> = (0u8..=0x7f).map(char::from).collect();
        for &a in &singles {
            let s = a.to_string();
            if !matches!(keymap.lookup(&s), Lookup::NotFound) {
                seqs.push(s);
            }
            for &b in &singles {
                let s2 = format!("{a}{b}");
                if matches!(
                    keymap.lookup(&s2),
                    Lookup::Complete(_) | Lookup::CompleteAndPrefix(_)
                ) {
                    seqs.push(s2);
                }
            }
        }
        for tail in ["[A", "[B", "[C", "[D", "[H", "[F", "[Z", "[1~", "[2~", "[3~", "[4~"] {
            seqs.push(format!("\u{1b}{tail}"));
        }
        seqs
    }

    #[test]
    fn test_registry_names_sorted() {
        let registry = default_registry();
        let names = registry.names();
        assert!(names.contains(&"self-insert"));
        assert!(names.contains(&"accept-line"));
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }
}
