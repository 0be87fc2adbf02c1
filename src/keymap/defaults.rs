// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Default keymaps. Bindings follow GNU Readline / ZLE conventions; every
//! bound name must exist in the widget registry.

use crate::{alt, ctrl, Binding, KeyMap, KeyMaps};

#[must_use]
pub fn default_keymaps() -> KeyMaps {
    KeyMaps::new(
        vec![
            emacs_keymap(),
            vi_insert_keymap(),
            vi_cmd_keymap(),
            visual_keymap(),
            menu_select_keymap(),
        ],
        KeyMaps::EMACS,
    )
}

fn bind_arrows(keymap: &mut KeyMap) {
    keymap.bind("\u{1b}[A", Binding::widget("up-line-or-history"));
    keymap.bind("\u{1b}[B", Binding::widget("down-line-or-history"));
    keymap.bind("\u{1b}[C", Binding::widget("forward-char"));
    keymap.bind("\u{1b}[D", Binding::widget("backward-char"));
    keymap.bind("\u{1b}[H", Binding::widget("beginning-of-line"));
    keymap.bind("\u{1b}[F", Binding::widget("end-of-line"));
    keymap.bind("\u{1b}[1~", Binding::widget("beginning-of-line"));
    keymap.bind("\u{1b}[4~", Binding::widget("end-of-line"));
    keymap.bind("\u{1b}[3~", Binding::widget("delete-char"));
    keymap.bind("\u{1b}[2~", Binding::widget("overwrite-mode"));
}

#[must_use]
pub fn emacs_keymap() -> KeyMap {
    let mut keymap = KeyMap::new(KeyMaps::EMACS);
    keymap.set_default_binding(Binding::widget("self-insert"));

    keymap.bind(&ctrl('A'), Binding::widget("beginning-of-line"));
    keymap.bind(&ctrl('B'), Binding::widget("backward-char"));
    keymap.bind(&ctrl('C'), Binding::widget("send-break"));
    keymap.bind(&ctrl('D'), Binding::widget("delete-char"));
    keymap.bind(&ctrl('E'), Binding::widget("end-of-line"));
    keymap.bind(&ctrl('F'), Binding::widget("forward-char"));
    keymap.bind(&ctrl('G'), Binding::widget("abort"));
    keymap.bind(&ctrl('H'), Binding::widget("backward-delete-char"));
    keymap.bind("\t", Binding::widget("expand-or-complete"));
    keymap.bind(&ctrl('K'), Binding::widget("kill-line"));
    keymap.bind(&ctrl('L'), Binding::widget("clear-screen"));
    keymap.bind("\r", Binding::widget("accept-line"));
    keymap.bind("\n", Binding::widget("accept-line"));
    keymap.bind(&ctrl('N'), Binding::widget("down-line-or-history"));
    keymap.bind(&ctrl('P'), Binding::widget("up-line-or-history"));
    keymap.bind(&ctrl('R'), Binding::widget("history-incremental-search-backward"));
    keymap.bind(&ctrl('S'), Binding::widget("history-incremental-search-forward"));
    keymap.bind(&ctrl('T'), Binding::widget("transpose-chars"));
    keymap.bind(&ctrl('U'), Binding::widget("kill-whole-line"));
    keymap.bind(&ctrl('V'), Binding::widget("quoted-insert"));
    keymap.bind(&ctrl('W'), Binding::widget("backward-kill-word"));
    keymap.bind(&ctrl('Y'), Binding::widget("yank"));
    keymap.bind("\0", Binding::widget("set-mark-command"));
    keymap.bind("\u{1f}", Binding::widget("undo"));
    keymap.bind("\u{7f}", Binding::widget("backward-delete-char"));

    // C-x prefix.
    keymap.bind(&format!("{}{}", ctrl('X'), ctrl('X')), Binding::widget("exchange-point-and-mark"));
    keymap.bind(&format!("{}u", ctrl('X')), Binding::widget("undo"));
    keymap.bind(&format!("{}r", ctrl('X')), Binding::widget("redo"));
    keymap.bind(&format!("{}{}", ctrl('X'), ctrl('U')), Binding::widget("undo"));

    // Meta bindings.
    keymap.bind(&alt("b"), Binding::widget("backward-word"));
    keymap.bind(&alt("f"), Binding::widget("forward-word"));
    keymap.bind(&alt("d"), Binding::widget("kill-word"));
    keymap.bind(&alt("\u{7f}"), Binding::widget("backward-kill-word"));
    keymap.bind(&alt("y"), Binding::widget("yank-pop"));
    keymap.bind(&alt("c"), Binding::widget("capitalize-word"));
    keymap.bind(&alt("u"), Binding::widget("up-case-word"));
    keymap.bind(&alt("l"), Binding::widget("down-case-word"));
    keymap.bind(&alt("t"), Binding::widget("transpose-words"));
    keymap.bind(&alt("<"), Binding::widget("beginning-of-history"));
    keymap.bind(&alt(">"), Binding::widget("end-of-history"));
    keymap.bind(&alt("n"), Binding::widget("history-search-forward"));
    keymap.bind(&alt("p"), Binding::widget("history-search-backward"));
    keymap.bind(&alt("w"), Binding::widget("copy-region-as-kill"));
    keymap.bind(&alt("-"), Binding::widget("neg-argument"));
    for digit in '0'..='9' {
        keymap.bind(&alt(&digit.to_string()), Binding::widget("digit-argument"));
    }
    keymap.bind(&alt("\r"), Binding::widget("self-insert-unmeta"));

    // Completion listing and menu entry points.
    keymap.bind("\u{1b}[Z", Binding::widget("reverse-menu-complete"));
    keymap.bind(&alt("?"), Binding::widget("list-choices"));
    keymap.bind(&alt("*"), Binding::widget("list-choices"));

    bind_arrows(&mut keymap);
    keymap
}

#[must_use]
pub fn vi_insert_keymap() -> KeyMap {
    let mut keymap = KeyMap::new(KeyMaps::VI_INSERT);
    keymap.set_default_binding(Binding::widget("self-insert"));

    keymap.bind("\u{1b}", Binding::widget("vi-cmd-mode"));
    keymap.bind("\r", Binding::widget("accept-line"));
    keymap.bind("\n", Binding::widget("accept-line"));
    keymap.bind("\t", Binding::widget("expand-or-complete"));
    keymap.bind("\u{7f}", Binding::widget("backward-delete-char"));
    keymap.bind(&ctrl('C'), Binding::widget("send-break"));
    keymap.bind(&ctrl('D'), Binding::widget("delete-char"));
    keymap.bind(&ctrl('G'), Binding::widget("abort"));
    keymap.bind(&ctrl('H'), Binding::widget("backward-delete-char"));
    keymap.bind(&ctrl('R'), Binding::widget("history-incremental-search-backward"));
    keymap.bind(&ctrl('U'), Binding::widget("backward-kill-line"));
    keymap.bind(&ctrl('V'), Binding::widget("quoted-insert"));
    keymap.bind(&ctrl('W'), Binding::widget("backward-kill-word"));
    bind_arrows(&mut keymap);
    keymap
}

#[must_use]
pub fn vi_cmd_keymap() -> KeyMap {
    let mut keymap = KeyMap::new(KeyMaps::VI_CMD);
    // No default: unmatched keys are undefined in command mode.

    keymap.bind("h", Binding::widget("backward-char"));
    keymap.bind("l", Binding::widget("forward-char"));
    keymap.bind(" ", Binding::widget("forward-char"));
    keymap.bind("0", Binding::widget("vi-digit-or-beginning-of-line"));
    keymap.bind("$", Binding::widget("end-of-line"));
    keymap.bind("^", Binding::widget("vi-first-non-blank"));
    keymap.bind("|", Binding::widget("vi-goto-column"));
    keymap.bind("w", Binding::widget("vi-forward-word"));
    keymap.bind("b", Binding::widget("vi-backward-word"));
    keymap.bind("e", Binding::widget("vi-forward-word-end"));
    keymap.bind("W", Binding::widget("vi-forward-blank-word"));
    keymap.bind("B", Binding::widget("vi-backward-blank-word"));
    keymap.bind("E", Binding::widget("vi-forward-blank-word-end"));
    keymap.bind("f", Binding::widget("vi-find-next-char"));
    keymap.bind("F", Binding::widget("vi-find-prev-char"));
    keymap.bind("t", Binding::widget("vi-find-next-char-skip"));
    keymap.bind("T", Binding::widget("vi-find-prev-char-skip"));
    keymap.bind(";", Binding::widget("vi-repeat-find"));
    keymap.bind(",", Binding::widget("vi-rev-repeat-find"));

    keymap.bind("i", Binding::widget("vi-insert"));
    keymap.bind("I", Binding::widget("vi-insert-bol"));
    keymap.bind("a", Binding::widget("vi-add-next"));
    keymap.bind("A", Binding::widget("vi-add-eol"));
    keymap.bind("x", Binding::widget("vi-delete-char"));
    keymap.bind("X", Binding::widget("vi-backward-delete-char"));
    keymap.bind("r", Binding::widget("vi-replace-chars"));
    keymap.bind("R", Binding::widget("vi-replace"));
    keymap.bind("s", Binding::widget("vi-substitute"));
    keymap.bind("~", Binding::widget("vi-swap-case"));

    keymap.bind("d", Binding::widget("vi-delete"));
    keymap.bind("c", Binding::widget("vi-change"));
    keymap.bind("y", Binding::widget("vi-yank"));
    keymap.bind("D", Binding::widget("kill-line"));
    keymap.bind("C", Binding::widget("vi-change-eol"));
    keymap.bind("Y", Binding::widget("vi-yank-whole-line"));
    keymap.bind("S", Binding::widget("vi-change-whole-line"));
    keymap.bind("p", Binding::widget("vi-put-after"));
    keymap.bind("P", Binding::widget("vi-put-before"));
    keymap.bind("\"", Binding::widget("vi-set-buffer"));
    keymap.bind(".", Binding::widget("vi-repeat-change"));

    keymap.bind("u", Binding::widget("undo"));
    keymap.bind(&ctrl('R'), Binding::widget("redo"));
    keymap.bind("j", Binding::widget("down-line-or-history"));
    keymap.bind("k", Binding::widget("up-line-or-history"));
    keymap.bind("+", Binding::widget("down-history"));
    keymap.bind("-", Binding::widget("up-history"));
    keymap.bind("G", Binding::widget("end-of-history"));
    keymap.bind("/", Binding::widget("history-incremental-search-backward"));
    keymap.bind("?", Binding::widget("history-incremental-search-forward"));
    keymap.bind("n", Binding::widget("vi-repeat-search"));
    keymap.bind("N", Binding::widget("vi-rev-repeat-search"));

    keymap.bind("v", Binding::widget("visual-mode"));
    keymap.bind("V", Binding::widget("visual-line-mode"));

    keymap.bind("\r", Binding::widget("accept-line"));
    keymap.bind("\n", Binding::widget("accept-line"));
    keymap.bind(&ctrl('C'), Binding::widget("send-break"));
    keymap.bind(&ctrl('G'), Binding::widget("abort"));
    keymap.bind(&ctrl('L'), Binding::widget("clear-screen"));
    for digit in '1'..='9' {
        keymap.bind(&digit.to_string(), Binding::widget("digit-argument"));
    }
    bind_arrows(&mut keymap);
    keymap
}

#[must_use]
pub fn visual_keymap() -> KeyMap {
    let mut keymap = KeyMap::new(KeyMaps::VISUAL);

    keymap.bind("h", Binding::widget("backward-char"));
    keymap.bind("l", Binding::widget("forward-char"));
    keymap.bind("w", Binding::widget("vi-forward-word"));
    keymap.bind("b", Binding::widget("vi-backward-word"));
    keymap.bind("e", Binding::widget("vi-forward-word-end"));
    keymap.bind("0", Binding::widget("beginning-of-line"));
    keymap.bind("$", Binding::widget("end-of-line"));
    keymap.bind("f", Binding::widget("vi-find-next-char"));
    keymap.bind("F", Binding::widget("vi-find-prev-char"));
    keymap.bind("d", Binding::widget("vi-visual-delete"));
    keymap.bind("x", Binding::widget("vi-visual-delete"));
    keymap.bind("y", Binding::widget("vi-visual-yank"));
    keymap.bind("c", Binding::widget("vi-visual-change"));
    keymap.bind("o", Binding::widget("exchange-point-and-mark"));
    keymap.bind("v", Binding::widget("vi-cmd-mode"));
    keymap.bind("\u{1b}", Binding::widget("vi-cmd-mode"));
    keymap.bind(&ctrl('C'), Binding::widget("send-break"));
    keymap.bind(&ctrl('G'), Binding::widget("abort"));
    keymap
}

#[must_use]
pub fn menu_select_keymap() -> KeyMap {
    let mut keymap = KeyMap::new(KeyMaps::MENU);

    keymap.bind("\t", Binding::widget("menu-complete"));
    keymap.bind("\u{1b}[Z", Binding::widget("reverse-menu-complete"));
    keymap.bind("\u{1b}[C", Binding::widget("menu-complete"));
    keymap.bind("\u{1b}[D", Binding::widget("reverse-menu-complete"));
    keymap.bind("\u{1b}[B", Binding::widget("menu-complete"));
    keymap.bind("\u{1b}[A", Binding::widget("reverse-menu-complete"));
    keymap.bind("\r", Binding::widget("accept-line"));
    keymap.bind("\n", Binding::widget("accept-line"));
    keymap.bind(&ctrl('G'), Binding::widget("abort"));
    keymap
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lookup;

    #[test]
    fn test_default_keymaps_complete() {
        let keymaps = default_keymaps();
        assert_eq!(keymaps.active_name(), KeyMaps::EMACS);
        for name in [
            KeyMaps::EMACS,
            KeyMaps::VI_INSERT,
            KeyMaps::VI_CMD,
            KeyMaps::VISUAL,
            KeyMaps::MENU,
        ] {
            assert!(keymaps.get(name).is_some(), "missing keymap {name}");
        }
    }

    #[test]
    fn test_emacs_meta_b() {
        let keymap = emacs_keymap();
        assert_eq!(
            keymap.lookup("\u{1b}b"),
            Lookup::Complete(Binding::widget("backward-word"))
        );
    }

    #[test]
    fn test_vi_insert_esc_is_ambiguous_with_arrows() {
        let keymap = vi_insert_keymap();
        // ESC is bound (vi-cmd-mode) and is a prefix of ESC [ A etc.
        assert!(matches!(
            keymap.lookup("\u{1b}"),
            Lookup::CompleteAndPrefix(_)
        ));
    }

    #[test]
    fn test_vicmd_has_no_default() {
        let keymap = vi_cmd_keymap();
        assert!(keymap.default_binding().is_none());
        assert_eq!(keymap.lookup("q"), Lookup::NotFound);
    }
}
