use crate::config::KeyBindingEntry;
use eframe::egui;
use log::warn;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyChordError {
    #[error("empty key chord")]
    Empty,
    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),
    #[error("unknown key `{0}`")]
    UnknownKey(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    DeleteSelection,
    Rename,
    SelectAll,
    SelectUp,
    SelectDown,
    SelectParent,
    SelectChild,
    Collapse,
    /// Forwarded untouched to collaborators.
    Named(String),
}

impl Action {
    pub fn from_name(name: &str) -> Self {
        match name {
            "delete-selection" => Action::DeleteSelection,
            "rename" => Action::Rename,
            "select-all" => Action::SelectAll,
            "select-up" => Action::SelectUp,
            "select-down" => Action::SelectDown,
            "select-parent" => Action::SelectParent,
            "select-child" => Action::SelectChild,
            "collapse" => Action::Collapse,
            other => Action::Named(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Action::DeleteSelection => "delete-selection",
            Action::Rename => "rename",
            Action::SelectAll => "select-all",
            Action::SelectUp => "select-up",
            Action::SelectDown => "select-down",
            Action::SelectParent => "select-parent",
            Action::SelectChild => "select-child",
            Action::Collapse => "collapse",
            Action::Named(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: egui::Key,
    pub modifiers: egui::Modifiers,
}

impl KeyChord {
    pub const fn plain(key: egui::Key) -> Self {
        Self {
            key,
            modifiers: egui::Modifiers::NONE,
        }
    }

    pub const fn command(key: egui::Key) -> Self {
        Self {
            key,
            modifiers: egui::Modifiers::COMMAND,
        }
    }

    /// Parses chords such as `"Delete"`, `"F2"` or `"Ctrl+Shift+E"`.
    pub fn parse(text: &str) -> Result<Self, KeyChordError> {
        let parts: Vec<&str> = text
            .split('+')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        let Some((key_name, mods)) = parts.split_last() else {
            return Err(KeyChordError::Empty);
        };

        let mut modifiers = egui::Modifiers::NONE;
        for m in mods {
            match m.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "cmd" | "command" => modifiers.command = true,
                "shift" => modifiers.shift = true,
                "alt" | "option" => modifiers.alt = true,
                _ => return Err(KeyChordError::UnknownModifier((*m).to_string())),
            }
        }

        let key = egui::Key::from_name(key_name)
            .or_else(|| egui::Key::from_name(&key_name.to_ascii_uppercase()))
            .ok_or_else(|| KeyChordError::UnknownKey((*key_name).to_string()))?;
        Ok(Self { key, modifiers })
    }

    /// Folds Ctrl into the platform command key.
    pub fn normalized(self) -> Self {
        let mut modifiers = self.modifiers;
        modifiers.command |= modifiers.ctrl || modifiers.mac_cmd;
        modifiers.ctrl = false;
        modifiers.mac_cmd = false;
        Self {
            key: self.key,
            modifiers,
        }
    }

    /// Ctrl and the platform command key are treated as the same modifier.
    pub fn matches(&self, key: egui::Key, modifiers: egui::Modifiers) -> bool {
        let want_cmd = self.modifiers.ctrl || self.modifiers.command;
        let have_cmd = modifiers.ctrl || modifiers.command || modifiers.mac_cmd;
        self.key == key
            && want_cmd == have_cmd
            && self.modifiers.shift == modifiers.shift
            && self.modifiers.alt == modifiers.alt
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.ctrl || self.modifiers.command {
            f.write_str("Ctrl+")?;
        }
        if self.modifiers.alt {
            f.write_str("Alt+")?;
        }
        if self.modifiers.shift {
            f.write_str("Shift+")?;
        }
        f.write_str(self.key.name())
    }
}

#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: Vec<(KeyChord, Action)>,
}

impl Default for Keymap {
    fn default() -> Self {
        use egui::Key;

        let mut map = Self::empty();
        map.bind(KeyChord::plain(Key::Delete), Action::DeleteSelection);
        map.bind(KeyChord::plain(Key::Backspace), Action::DeleteSelection);
        map.bind(KeyChord::plain(Key::F2), Action::Rename);
        map.bind(KeyChord::command(Key::R), Action::Rename);
        map.bind(KeyChord::command(Key::A), Action::SelectAll);
        map.bind(KeyChord::plain(Key::ArrowUp), Action::SelectUp);
        map.bind(KeyChord::plain(Key::ArrowDown), Action::SelectDown);
        map.bind(KeyChord::plain(Key::ArrowLeft), Action::SelectParent);
        map.bind(KeyChord::plain(Key::ArrowRight), Action::SelectChild);
        map.bind(KeyChord::plain(Key::Escape), Action::Collapse);
        for (key, name) in [
            (Key::E, "extract"),
            (Key::V, "visualize"),
            (Key::S, "save"),
            (Key::O, "open"),
            (Key::N, "new-network"),
        ] {
            map.bind(KeyChord::plain(key), Action::Named(name.to_string()));
        }
        map
    }
}

impl Keymap {
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Binds `chord`, replacing any action previously bound to it.
    pub fn bind(&mut self, chord: KeyChord, action: Action) {
        let chord = chord.normalized();
        self.bindings.retain(|(c, _)| *c != chord);
        self.bindings.push((chord, action));
    }

    pub fn unbind(&mut self, chord: KeyChord) {
        let chord = chord.normalized();
        self.bindings.retain(|(c, _)| *c != chord);
    }

    pub fn lookup(&self, key: egui::Key, modifiers: egui::Modifiers) -> Option<&Action> {
        self.bindings
            .iter()
            .rev()
            .find(|(chord, _)| chord.matches(key, modifiers))
            .map(|(_, action)| action)
    }

    pub fn chords_for(&self, action: &Action) -> Vec<KeyChord> {
        self.bindings
            .iter()
            .filter(|(_, a)| a == action)
            .map(|(c, _)| *c)
            .collect()
    }

    /// Applies configured overrides; malformed entries are skipped.
    pub fn apply_overrides(&mut self, entries: &[KeyBindingEntry]) -> usize {
        let mut applied = 0;
        for entry in entries {
            match KeyChord::parse(&entry.chord) {
                Ok(chord) => {
                    self.bind(chord, Action::from_name(&entry.action));
                    applied += 1;
                }
                Err(err) => warn!("ignoring key binding `{}`: {err}", entry.chord),
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Key, Modifiers};

    #[test]
    fn parses_modifiers_and_keys() {
        let chord = KeyChord::parse("Ctrl+Shift+E").expect("parse");
        assert_eq!(chord.key, Key::E);
        assert!(chord.modifiers.command && chord.modifiers.shift && !chord.modifiers.alt);
        assert_eq!(chord.to_string(), "Ctrl+Shift+E");

        assert_eq!(KeyChord::parse("f2").map(|c| c.key), Ok(Key::F2));
        assert_eq!(KeyChord::parse(""), Err(KeyChordError::Empty));
        assert_eq!(
            KeyChord::parse("Hyper+E"),
            Err(KeyChordError::UnknownModifier("Hyper".into()))
        );
        assert!(matches!(
            KeyChord::parse("Ctrl+Nope"),
            Err(KeyChordError::UnknownKey(_))
        ));
    }

    #[test]
    fn default_bindings_cover_delete_and_rename() {
        let map = Keymap::default();
        assert_eq!(
            map.lookup(Key::Delete, Modifiers::NONE),
            Some(&Action::DeleteSelection)
        );
        assert_eq!(
            map.lookup(Key::Backspace, Modifiers::NONE),
            Some(&Action::DeleteSelection)
        );
        assert_eq!(map.lookup(Key::F2, Modifiers::NONE), Some(&Action::Rename));
        assert_eq!(
            map.lookup(Key::E, Modifiers::NONE),
            Some(&Action::Named("extract".into()))
        );
        assert_eq!(map.lookup(Key::E, Modifiers::SHIFT), None);
    }

    #[test]
    fn ctrl_matches_command_modifier() {
        let map = Keymap::default();
        assert_eq!(map.lookup(Key::A, Modifiers::CTRL), Some(&Action::SelectAll));
        assert_eq!(map.lookup(Key::A, Modifiers::COMMAND), Some(&Action::SelectAll));
    }

    #[test]
    fn overrides_replace_existing_chords() {
        let mut map = Keymap::default();
        let applied = map.apply_overrides(&[
            KeyBindingEntry {
                chord: "E".into(),
                action: "rename".into(),
            },
            KeyBindingEntry {
                chord: "Bogus+Q".into(),
                action: "save".into(),
            },
        ]);
        assert_eq!(applied, 1);
        assert_eq!(map.lookup(Key::E, Modifiers::NONE), Some(&Action::Rename));
        assert_eq!(map.chords_for(&Action::Rename).len(), 3);
    }

    #[test]
    fn ctrl_override_replaces_the_command_default() {
        let mut map = Keymap::default();
        let applied = map.apply_overrides(&[KeyBindingEntry {
            chord: "Ctrl+A".into(),
            action: "save".into(),
        }]);
        assert_eq!(applied, 1);
        assert!(map.chords_for(&Action::SelectAll).is_empty());
        assert_eq!(
            map.chords_for(&Action::Named("save".into())),
            vec![KeyChord::plain(Key::S), KeyChord::command(Key::A)]
        );

        map.unbind(KeyChord {
            key: Key::A,
            modifiers: Modifiers::CTRL,
        });
        assert_eq!(map.lookup(Key::A, Modifiers::CTRL), None);
    }
}
