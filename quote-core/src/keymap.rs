//! Keyboard shortcuts and the actions they map to.

use std::fmt;
use std::str::FromStr;

/// Actions reachable from a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Save,
    NewQuote,
    OpenLibrary,
    ExportPdf,
    AddItem,
    Revise,
    Dismiss,
}

impl fmt::Display for Action {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Action::Save => "save",
            Action::NewQuote => "new quote",
            Action::OpenLibrary => "open library",
            Action::ExportPdf => "export PDF",
            Action::AddItem => "add item",
            Action::Revise => "save revision",
            Action::Dismiss => "dismiss",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
}

/// A key press with its modifier state. Ctrl and Cmd are interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: Key,
    pub command: bool,
}

impl KeyChord {
    pub fn command(c: char) -> Self {
        Self {
            key: Key::Char(c),
            command: true,
        }
    }

    pub fn escape() -> Self {
        Self {
            key: Key::Escape,
            command: false,
        }
    }
}

impl FromStr for KeyChord {
    type Err = String;

    /// Accepts `esc`, `^s`, `ctrl+s`, `cmd+s` and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if matches!(lower.as_str(), "esc" | "escape") {
            return Ok(Self::escape());
        }
        let rest = lower
            .strip_prefix('^')
            .or_else(|| lower.strip_prefix("ctrl+"))
            .or_else(|| lower.strip_prefix("ctrl-"))
            .or_else(|| lower.strip_prefix("cmd+"))
            .or_else(|| lower.strip_prefix("meta+"))
            .ok_or_else(|| format!("not a shortcut: {s}"))?;
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Self::command(c)),
            _ => Err(format!("not a shortcut: {s}")),
        }
    }
}

/// Maps a chord to its action.
///
/// `revise_enabled` mirrors the revision button: the shortcut does nothing
/// until the quote has been saved once.
pub fn resolve(
    chord: KeyChord,
    revise_enabled: bool,
) -> Option<Action> {
    match chord.key {
        Key::Escape => Some(Action::Dismiss),
        Key::Char(_) if !chord.command => None,
        Key::Char(c) => match c.to_ascii_lowercase() {
            's' => Some(Action::Save),
            'n' => Some(Action::NewQuote),
            'l' => Some(Action::OpenLibrary),
            'p' => Some(Action::ExportPdf),
            'i' => Some(Action::AddItem),
            'r' if revise_enabled => Some(Action::Revise),
            _ => None,
        },
    }
}

/// Shortcut table for help output.
pub const BINDINGS: &[(&str, Action)] = &[
    ("Ctrl+S", Action::Save),
    ("Ctrl+N", Action::NewQuote),
    ("Ctrl+L", Action::OpenLibrary),
    ("Ctrl+P", Action::ExportPdf),
    ("Ctrl+I", Action::AddItem),
    ("Ctrl+R", Action::Revise),
    ("Esc", Action::Dismiss),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_chords_map_to_actions() {
        assert_eq!(resolve(KeyChord::command('s'), false), Some(Action::Save));
        assert_eq!(resolve(KeyChord::command('N'), false), Some(Action::NewQuote));
        assert_eq!(resolve(KeyChord::command('l'), false), Some(Action::OpenLibrary));
        assert_eq!(resolve(KeyChord::command('p'), false), Some(Action::ExportPdf));
        assert_eq!(resolve(KeyChord::command('i'), false), Some(Action::AddItem));
        assert_eq!(resolve(KeyChord::escape(), false), Some(Action::Dismiss));
    }

    #[test]
    fn revise_only_when_enabled() {
        assert_eq!(resolve(KeyChord::command('r'), false), None);
        assert_eq!(resolve(KeyChord::command('r'), true), Some(Action::Revise));
    }

    #[test]
    fn plain_keys_do_nothing() {
        let plain = KeyChord {
            key: Key::Char('s'),
            command: false,
        };
        assert_eq!(resolve(plain, true), None);
        assert_eq!(resolve(KeyChord::command('x'), true), None);
    }

    #[test]
    fn chords_parse_from_text() {
        assert_eq!("^s".parse::<KeyChord>(), Ok(KeyChord::command('s')));
        assert_eq!("Ctrl+R".parse::<KeyChord>(), Ok(KeyChord::command('r')));
        assert_eq!("cmd+p".parse::<KeyChord>(), Ok(KeyChord::command('p')));
        assert_eq!("Esc".parse::<KeyChord>(), Ok(KeyChord::escape()));
        assert!("s".parse::<KeyChord>().is_err());
        assert!("^sv".parse::<KeyChord>().is_err());
    }
}
