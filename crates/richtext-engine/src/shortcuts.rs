//! Keyboard shortcuts.

use crate::commands::Command;

/// Platform-independent key of a shortcut chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Tab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    /// Cmd on macOS
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    /// Ctrl or Cmd, whichever the platform uses for shortcuts.
    pub fn primary(self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyChord {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(
            Key::Char(c),
            Modifiers {
                ctrl: true,
                ..Modifiers::default()
            },
        )
    }

    pub fn ctrl_shift(c: char) -> Self {
        Self::new(
            Key::Char(c),
            Modifiers {
                ctrl: true,
                shift: true,
                ..Modifiers::default()
            },
        )
    }

    pub fn tab() -> Self {
        Self::new(Key::Tab, Modifiers::default())
    }

    pub fn shift_tab() -> Self {
        Self::new(
            Key::Tab,
            Modifiers {
                shift: true,
                ..Modifiers::default()
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutAction {
    Run(Command),
    Undo,
    Redo,
}

/// The action bound to `chord`, if any. Tab only indents or outdents when
/// the caret is inside a list item, so it stays an ordinary key elsewhere.
pub fn resolve(chord: KeyChord, in_list_item: bool) -> Option<ShortcutAction> {
    let modifiers = chord.modifiers;
    match chord.key {
        Key::Tab if in_list_item && !modifiers.primary() => Some(ShortcutAction::Run(
            if modifiers.shift {
                Command::Outdent
            } else {
                Command::Indent
            },
        )),
        Key::Tab => None,
        Key::Char(c) if modifiers.primary() => match (c.to_ascii_lowercase(), modifiers.shift) {
            ('b', false) => Some(ShortcutAction::Run(Command::Bold)),
            ('i', false) => Some(ShortcutAction::Run(Command::Italic)),
            ('u', false) => Some(ShortcutAction::Run(Command::Underline)),
            ('z', false) => Some(ShortcutAction::Undo),
            ('z', true) | ('y', false) => Some(ShortcutAction::Redo),
            _ => None,
        },
        Key::Char(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(KeyChord::ctrl('b'), Some(ShortcutAction::Run(Command::Bold)))]
    #[case(KeyChord::ctrl('I'), Some(ShortcutAction::Run(Command::Italic)))]
    #[case(KeyChord::ctrl('u'), Some(ShortcutAction::Run(Command::Underline)))]
    #[case(KeyChord::ctrl('z'), Some(ShortcutAction::Undo))]
    #[case(KeyChord::ctrl_shift('z'), Some(ShortcutAction::Redo))]
    #[case(KeyChord::ctrl('y'), Some(ShortcutAction::Redo))]
    #[case(KeyChord::ctrl_shift('b'), None)]
    #[case(KeyChord::new(Key::Char('b'), Modifiers::default()), None)]
    fn test_resolve_chords(#[case] chord: KeyChord, #[case] expected: Option<ShortcutAction>) {
        assert_eq!(resolve(chord, false), expected);
    }

    #[test]
    fn test_meta_works_like_ctrl() {
        let chord = KeyChord::new(
            Key::Char('b'),
            Modifiers {
                meta: true,
                ..Modifiers::default()
            },
        );

        assert_eq!(resolve(chord, false), Some(ShortcutAction::Run(Command::Bold)));
    }

    #[test]
    fn test_tab_only_in_list_items() {
        assert_eq!(resolve(KeyChord::tab(), false), None);
        assert_eq!(
            resolve(KeyChord::tab(), true),
            Some(ShortcutAction::Run(Command::Indent))
        );
        assert_eq!(
            resolve(KeyChord::shift_tab(), true),
            Some(ShortcutAction::Run(Command::Outdent))
        );
    }
}
