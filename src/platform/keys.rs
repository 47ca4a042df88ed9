//! Platform-neutral key identifiers for synthetic keystrokes

use std::fmt;
use std::str::FromStr;

/// A key that can be sent to the emulator window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character; upper-case letters and shifted symbols
    /// are sent with Shift held
    Char(char),
    Return,
    Escape,
    Tab,
    Backspace,
    Space,
    Shift,
    Control,
    Alt,
    AltGr,
    /// Function key F1..F12
    Function(u8),
    Up,
    Down,
    Left,
    Right,
}

/// How a list of keys is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// Press and release each key in turn, like typing
    Sequence,
    /// Press every key, then release all of them (shortcuts)
    Together,
}

impl Key {
    /// Convert text into the key presses needed to type it
    pub fn from_text(text: &str) -> Vec<Key> {
        text.chars()
            .map(|c| match c {
                '\n' | '\r' => Key::Return,
                '\t' => Key::Tab,
                ' ' => Key::Space,
                other => Key::Char(other),
            })
            .collect()
    }

    /// Parse a shortcut such as `altgr+l` or `ctrl+shift+f1`
    pub fn parse_combo(combo: &str) -> Result<Vec<Key>, ParseKeyError> {
        combo.split('+').map(str::parse).collect()
    }

    /// Whether this key is a modifier that stays held in a chord
    pub fn is_modifier(&self) -> bool {
        matches!(self, Key::Shift | Key::Control | Key::Alt | Key::AltGr)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Return => write!(f, "return"),
            Key::Escape => write!(f, "escape"),
            Key::Tab => write!(f, "tab"),
            Key::Backspace => write!(f, "backspace"),
            Key::Space => write!(f, "space"),
            Key::Shift => write!(f, "shift"),
            Key::Control => write!(f, "ctrl"),
            Key::Alt => write!(f, "alt"),
            Key::AltGr => write!(f, "altgr"),
            Key::Function(n) => write!(f, "f{}", n),
            Key::Up => write!(f, "up"),
            Key::Down => write!(f, "down"),
            Key::Left => write!(f, "left"),
            Key::Right => write!(f, "right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown key name '{0}'")]
pub struct ParseKeyError(pub String);

impl FromStr for Key {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Key::Char(c));
        }

        let key = match name.to_lowercase().as_str() {
            "return" | "enter" => Key::Return,
            "esc" | "escape" => Key::Escape,
            "tab" => Key::Tab,
            "backspace" | "bs" => Key::Backspace,
            "space" => Key::Space,
            "shift" => Key::Shift,
            "ctrl" | "control" => Key::Control,
            "alt" => Key::Alt,
            "altgr" => Key::AltGr,
            "up" => Key::Up,
            "down" => Key::Down,
            "left" => Key::Left,
            "right" => Key::Right,
            lower => match lower.strip_prefix('f').map(str::parse::<u8>) {
                Some(Ok(n)) if (1..=12).contains(&n) => Key::Function(n),
                _ => return Err(ParseKeyError(name.to_string())),
            },
        };
        Ok(key)
    }
}
