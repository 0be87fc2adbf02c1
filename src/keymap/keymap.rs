// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Prefix tree from key sequences to bindings. A sequence can be both a
//! complete binding and a prefix of a longer one; the decoder resolves that
//! ambiguity with a timeout.

use std::collections::HashMap;

/// What a key sequence resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Named widget, dispatched through the registry.
    Widget(String),
    /// Literal expansion replayed at the head of the input stream.
    Macro(String),
    /// Indirection into another keymap at the given sequence.
    Reference { keymap: String, seq: String },
}

impl Binding {
    #[must_use]
    pub fn widget(name: &str) -> Self { Binding::Widget(name.to_string()) }
}

#[derive(Debug, Default)]
struct Node {
    binding: Option<Binding>,
    children: HashMap<char, Node>,
}

/// Result of walking a (partial) sequence through the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// No binding at or beneath this sequence.
    NotFound,
    /// Not bound itself, but a strict prefix of bound sequences.
    Prefix,
    /// Bound, and nothing longer starts with it.
    Complete(Binding),
    /// Bound *and* a strict prefix of longer bindings: ambiguous.
    CompleteAndPrefix(Binding),
}

#[derive(Debug, Default)]
pub struct KeyMap {
    name: String,
    root: Node,
    /// Fallback for unmatched printable input. Insert-style maps use
    /// `self-insert`; command maps leave it unset (`undefined-key`).
    default_binding: Option<Binding>,
}

impl KeyMap {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            root: Node::default(),
            default_binding: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    #[must_use]
    pub fn default_binding(&self) -> Option<&Binding> { self.default_binding.as_ref() }

    pub fn set_default_binding(&mut self, binding: Binding) {
        self.default_binding = Some(binding);
    }

    /// Binds `seq` (replacing any previous binding at that exact sequence).
    pub fn bind(&mut self, seq: &str, binding: Binding) {
        let mut node = &mut self.root;
        for ch in seq.chars() {
            node = node.children.entry(ch).or_default();
        }
        node.binding = Some(binding);
    }

    /// Removes the binding at exactly `seq`. Empty subtrees are left in
    /// place; lookup treats a childless unbound node as `NotFound`.
    pub fn unbind(&mut self, seq: &str) {
        let mut node = &mut self.root;
        for ch in seq.chars() {
            match node.children.get_mut(&ch) {
                Some(next) => node = next,
                None => return,
            }
        }
        node.binding = None;
    }

    #[must_use]
    pub fn lookup(&self, seq: &str) -> Lookup {
        let mut node = &self.root;
        for ch in seq.chars() {
            match node.children.get(&ch) {
                Some(next) => node = next,
                None => return Lookup::NotFound,
            }
        }
        let has_longer = !node.children.is_empty() && subtree_has_binding(node);
        match (&node.binding, has_longer) {
            (Some(binding), true) => Lookup::CompleteAndPrefix(binding.clone()),
            (Some(binding), false) => Lookup::Complete(binding.clone()),
            (None, _) => {
                if node_has_descendant_binding(node) {
                    Lookup::Prefix
                } else {
                    Lookup::NotFound
                }
            }
        }
    }
}

fn node_has_descendant_binding(node: &Node) -> bool {
    node.children
        .values()
        .any(|child| child.binding.is_some() || node_has_descendant_binding(child))
}

fn subtree_has_binding(node: &Node) -> bool { node_has_descendant_binding(node) }

/// The named keymaps of a session plus the active selection. `main` is an
/// alias resolved at selection time.
#[derive(Debug)]
pub struct KeyMaps {
    maps: HashMap<String, KeyMap>,
    active: String,
}

impl KeyMaps {
    pub const EMACS: &'static str = "emacs";
    pub const VI_INSERT: &'static str = "viins";
    pub const VI_CMD: &'static str = "vicmd";
    pub const VISUAL: &'static str = "visual";
    pub const MENU: &'static str = "menuselect";

    #[must_use]
    pub fn new(maps: Vec<KeyMap>, active: &str) -> Self {
        let maps = maps
            .into_iter()
            .map(|keymap| (keymap.name().to_string(), keymap))
            .collect();
        Self {
            maps,
            active: active.to_string(),
        }
    }

    #[must_use]
    pub fn active_name(&self) -> &str { &self.active }

    #[must_use]
    pub fn active(&self) -> &KeyMap {
        // The active name is validated on selection.
        &self.maps[&self.active]
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&KeyMap> { self.maps.get(name) }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut KeyMap> { self.maps.get_mut(name) }

    /// Selects the active keymap. An unknown name is a programmer error and
    /// is reported synchronously.
    pub fn select(&mut self, name: &str) -> Result<(), String> {
        if self.maps.contains_key(name) {
            self.active = name.to_string();
            Ok(())
        } else {
            Err(format!("no such keymap: {name}"))
        }
    }

    /// Follows `Reference` bindings to their target, guarding against
    /// reference cycles.
    #[must_use]
    pub fn resolve<'a>(&'a self, binding: &'a Binding) -> Option<&'a Binding> {
        let mut current = binding;
        for _ in 0..8 {
            match current {
                Binding::Reference { keymap, seq } => {
                    match self.get(keymap)?.lookup(seq) {
                        Lookup::Complete(_) | Lookup::CompleteAndPrefix(_) => {
                            // Re-borrow from the map to return a reference.
                            current = self.lookup_ref(keymap, seq)?;
                        }
                        _ => return None,
                    }
                }
                other => return Some(other),
            }
        }
        None
    }

    fn lookup_ref(&self, keymap: &str, seq: &str) -> Option<&Binding> {
        let mut node = &self.get(keymap)?.root;
        for ch in seq.chars() {
            node = node.children.get(&ch)?;
        }
        node.binding.as_ref()
    }
}
