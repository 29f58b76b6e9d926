//! Symbol table between portable key/button names and `rdev` identifiers.
//!
//! Recordings store keys as either a single printable character (`"a"`, `"%"`)
//! or a symbolic name (`"space"`, `"f5"`, `"shift_r"`), and buttons as
//! `"left"`, `"right"`, `"middle"` or `"button<N>"`. Nothing host-specific is
//! ever written to disk.

use crate::{MacroError, MouseButton, Result};
use rdev::{Button, Key};

/// Canonical special-key names. Each name maps to exactly one key and back.
pub const SPECIAL_KEYS: &[(&str, Key)] = &[
    ("space", Key::Space),
    ("esc", Key::Escape),
    ("enter", Key::Return),
    ("backspace", Key::Backspace),
    ("delete", Key::Delete),
    ("f1", Key::F1),
    ("f2", Key::F2),
    ("f3", Key::F3),
    ("f4", Key::F4),
    ("f5", Key::F5),
    ("f6", Key::F6),
    ("f7", Key::F7),
    ("f8", Key::F8),
    ("f9", Key::F9),
    ("f10", Key::F10),
    ("f11", Key::F11),
    ("f12", Key::F12),
    ("print_screen", Key::PrintScreen),
    ("home", Key::Home),
    ("tab", Key::Tab),
    ("page_up", Key::PageUp),
    ("page_down", Key::PageDown),
    ("caps_lock", Key::CapsLock),
    ("shift", Key::ShiftLeft),
    ("shift_r", Key::ShiftRight),
    ("end", Key::End),
    ("right", Key::RightArrow),
    ("down", Key::DownArrow),
    ("up", Key::UpArrow),
    ("left", Key::LeftArrow),
    ("ctrl_l", Key::ControlLeft),
    ("ctrl_r", Key::ControlRight),
    ("alt_gr", Key::AltGr),
    ("alt_l", Key::Alt),
    ("cmd", Key::MetaLeft),
    ("cmd_r", Key::MetaRight),
    ("insert", Key::Insert),
    ("num_lock", Key::NumLock),
    ("scroll_lock", Key::ScrollLock),
    ("pause", Key::Pause),
];

/// Alternative spellings accepted when reading hand-edited recordings
const KEY_ALIASES: &[(&str, &str)] = &[
    ("alt", "alt_l"),
    ("ctrl", "ctrl_l"),
    ("cmd_l", "cmd"),
    ("return", "enter"),
    ("escape", "esc"),
];

/// US-layout character keys: (unshifted, shifted, key)
const CHARACTER_KEYS: &[(char, char, Key)] = &[
    ('a', 'A', Key::KeyA),
    ('b', 'B', Key::KeyB),
    ('c', 'C', Key::KeyC),
    ('d', 'D', Key::KeyD),
    ('e', 'E', Key::KeyE),
    ('f', 'F', Key::KeyF),
    ('g', 'G', Key::KeyG),
    ('h', 'H', Key::KeyH),
    ('i', 'I', Key::KeyI),
    ('j', 'J', Key::KeyJ),
    ('k', 'K', Key::KeyK),
    ('l', 'L', Key::KeyL),
    ('m', 'M', Key::KeyM),
    ('n', 'N', Key::KeyN),
    ('o', 'O', Key::KeyO),
    ('p', 'P', Key::KeyP),
    ('q', 'Q', Key::KeyQ),
    ('r', 'R', Key::KeyR),
    ('s', 'S', Key::KeyS),
    ('t', 'T', Key::KeyT),
    ('u', 'U', Key::KeyU),
    ('v', 'V', Key::KeyV),
    ('w', 'W', Key::KeyW),
    ('x', 'X', Key::KeyX),
    ('y', 'Y', Key::KeyY),
    ('z', 'Z', Key::KeyZ),
    ('1', '!', Key::Num1),
    ('2', '@', Key::Num2),
    ('3', '#', Key::Num3),
    ('4', '$', Key::Num4),
    ('5', '%', Key::Num5),
    ('6', '^', Key::Num6),
    ('7', '&', Key::Num7),
    ('8', '*', Key::Num8),
    ('9', '(', Key::Num9),
    ('0', ')', Key::Num0),
    ('-', '_', Key::Minus),
    ('=', '+', Key::Equal),
    ('[', '{', Key::LeftBracket),
    (']', '}', Key::RightBracket),
    (';', ':', Key::SemiColon),
    ('\'', '"', Key::Quote),
    ('`', '~', Key::BackQuote),
    ('\\', '|', Key::BackSlash),
    (',', '<', Key::Comma),
    ('.', '>', Key::Dot),
    ('/', '?', Key::Slash),
    (' ', ' ', Key::Space),
];

/// Look up a special key by canonical name or alias
pub fn special_key(name: &str) -> Option<Key> {
    let canonical = KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(name);

    SPECIAL_KEYS
        .iter()
        .find(|(special, _)| *special == canonical)
        .map(|(_, key)| *key)
}

/// The canonical name of a special key
pub fn special_name(key: Key) -> Option<&'static str> {
    SPECIAL_KEYS
        .iter()
        .find(|(_, special)| *special == key)
        .map(|(name, _)| *name)
}

/// The key that types `c` on a US layout. Shifted symbols map to their base key.
pub fn character_key(c: char) -> Option<Key> {
    CHARACTER_KEYS
        .iter()
        .find(|(plain, shifted, _)| *plain == c || *shifted == c)
        .map(|(_, _, key)| *key)
}

/// The unshifted character a key types on a US layout
pub fn key_character(key: Key) -> Option<char> {
    CHARACTER_KEYS
        .iter()
        .find(|(_, _, k)| *k == key)
        .map(|(plain, _, _)| *plain)
}

/// Resolve a recorded key string to a host key.
///
/// Special names win over characters; a single character is looked up on the
/// US layout; anything else is [`MacroError::UnmappableKey`].
pub fn resolve_key(name: &str) -> Result<Key> {
    if let Some(key) = special_key(name) {
        return Ok(key);
    }

    let mut chars = name.chars();
    let key = match (chars.next(), chars.next()) {
        (Some(c), None) => character_key(c),
        _ => None,
    };
    match key {
        Some(key) => Ok(key),
        None => Err(MacroError::UnmappableKey(name.to_string())),
    }
}

/// The string recorded for a key notification.
///
/// `typed` is the text the hook reported for the key press, if any.
pub fn key_label(key: Key, typed: Option<&str>) -> String {
    if let Some(name) = special_name(key) {
        return name.to_string();
    }

    if let Some(text) = typed {
        let mut chars = text.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if !c.is_control() {
                return text.to_string();
            }
        }
    }

    match key_character(key) {
        Some(c) => c.to_string(),
        None => format!("{:?}", key),
    }
}

impl From<Button> for MouseButton {
    fn from(button: Button) -> Self {
        match button {
            Button::Left => MouseButton::Left,
            Button::Right => MouseButton::Right,
            Button::Middle => MouseButton::Middle,
            Button::Unknown(code) => MouseButton::Other(code),
        }
    }
}

impl From<MouseButton> for Button {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
            MouseButton::Middle => Button::Middle,
            MouseButton::Other(code) => Button::Unknown(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_keys_resolve_both_ways() {
        for (name, key) in SPECIAL_KEYS {
            assert_eq!(special_key(name), Some(*key), "name {}", name);
            assert_eq!(special_name(*key), Some(*name), "key {:?}", key);
        }
    }

    #[test]
    fn test_special_names_are_unique() {
        for (i, (name, key)) in SPECIAL_KEYS.iter().enumerate() {
            for (other_name, other_key) in &SPECIAL_KEYS[i + 1..] {
                assert_ne!(name, other_name);
                assert_ne!(key, other_key, "{} and {} share a key", name, other_name);
            }
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!(special_key("alt"), Some(Key::Alt));
        assert_eq!(special_key("escape"), Some(Key::Escape));
        assert_eq!(special_name(Key::Alt), Some("alt_l"));
    }

    #[test]
    fn test_resolve_characters() {
        assert_eq!(resolve_key("a").unwrap(), Key::KeyA);
        assert_eq!(resolve_key("A").unwrap(), Key::KeyA);
        assert_eq!(resolve_key("%").unwrap(), Key::Num5);
        assert_eq!(resolve_key("?").unwrap(), Key::Slash);
        assert_eq!(resolve_key("f5").unwrap(), Key::F5);
    }

    #[test]
    fn test_resolve_rejects_unknown_names() {
        assert!(matches!(
            resolve_key("unknown_multi_char_key"),
            Err(MacroError::UnmappableKey(name)) if name == "unknown_multi_char_key"
        ));
        assert!(matches!(
            resolve_key("é"),
            Err(MacroError::UnmappableKey(_))
        ));
        assert!(matches!(resolve_key(""), Err(MacroError::UnmappableKey(_))));
    }

    #[test]
    fn test_key_label_policy() {
        // Named keys use their symbolic name even when the hook reports text
        assert_eq!(key_label(Key::Space, Some(" ")), "space");
        assert_eq!(key_label(Key::Return, Some("\r")), "enter");

        // Printable keys use the typed character
        assert_eq!(key_label(Key::KeyA, Some("A")), "A");

        // Control text falls back to the layout character
        assert_eq!(key_label(Key::KeyC, Some("\u{3}")), "c");

        // Releases carry no text
        assert_eq!(key_label(Key::Num5, None), "5");

        // Unmapped keys keep their raw representation
        assert_eq!(key_label(Key::Unknown(250), None), "Unknown(250)");
        assert_eq!(key_label(Key::KpReturn, None), "KpReturn");
    }

    #[test]
    fn test_button_conversion() {
        assert_eq!(MouseButton::from(Button::Unknown(8)), MouseButton::Other(8));
        assert_eq!(Button::from(MouseButton::Right), Button::Right);
    }
}
