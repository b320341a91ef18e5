//! Shortcut patterns and physical key events.
//!
//! A pattern is zero or more modifiers joined by `+`, followed by a key
//! token (`CTRL+B`, `shift+enter`) or a physical code in angle brackets
//! (`META+<KeyZ>`). `CMD` is an alias for `META`. `CTRL++` binds the plus
//! key itself.

use crate::error::{KeymapError, KeymapResult};
use bitflags::bitflags;
use smol_str::SmolStr;
use std::fmt;
use std::str::FromStr;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyModifiers: u8 {
        const CTRL = 1 << 0;
        const ALT = 1 << 1;
        const SHIFT = 1 << 2;
        const META = 1 << 3;
    }
}

impl KeyModifiers {
    fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "CTRL" => Some(Self::CTRL),
            "ALT" => Some(Self::ALT),
            "SHIFT" => Some(Self::SHIFT),
            "META" | "CMD" => Some(Self::META),
            _ => None,
        }
    }
}

/// What a shortcut matches on besides the modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Logical key, stored uppercase.
    Key(SmolStr),
    /// Physical key code, compared as written.
    Code(SmolStr),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub modifiers: KeyModifiers,
    pub trigger: Trigger,
}

impl Shortcut {
    pub fn parse(pattern: &str) -> KeymapResult<Self> {
        let trimmed = pattern.trim();
        let (prefix, last) = if trimmed == "+" {
            ("", "+")
        } else if let Some(prefix) = trimmed.strip_suffix("++") {
            (prefix, "+")
        } else {
            trimmed.rsplit_once('+').unwrap_or(("", trimmed))
        };

        let mut modifiers = KeyModifiers::empty();
        for token in prefix.split('+').map(str::trim).filter(|token| !token.is_empty()) {
            modifiers |= KeyModifiers::from_token(token).ok_or_else(|| KeymapError::UnknownModifier {
                pattern: pattern.to_string(),
                modifier: token.to_string(),
            })?;
        }

        let last = last.trim();
        if last.is_empty() || KeyModifiers::from_token(last).is_some() {
            return Err(KeymapError::MissingKey(pattern.to_string()));
        }
        let trigger = match last.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) {
            Some("") => return Err(KeymapError::EmptyCode(pattern.to_string())),
            Some(code) => Trigger::Code(SmolStr::new(code)),
            None => Trigger::Key(SmolStr::new(last.to_uppercase())),
        };
        Ok(Self { modifiers, trigger })
    }

    /// Modifiers must match exactly.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        if self.modifiers != event.modifiers {
            return false;
        }
        match &self.trigger {
            Trigger::Key(key) => !event.key.is_empty() && event.key.to_uppercase() == key.as_str(),
            Trigger::Code(code) => event.code == *code,
        }
    }
}

impl FromStr for Shortcut {
    type Err = KeymapError;

    fn from_str(pattern: &str) -> KeymapResult<Self> {
        Self::parse(pattern)
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, flag) in [
            ("CTRL", KeyModifiers::CTRL),
            ("ALT", KeyModifiers::ALT),
            ("SHIFT", KeyModifiers::SHIFT),
            ("META", KeyModifiers::META),
        ] {
            if self.modifiers.contains(flag) {
                write!(f, "{}+", name)?;
            }
        }
        match &self.trigger {
            Trigger::Key(key) => write!(f, "{}", key),
            Trigger::Code(code) => write!(f, "<{}>", code),
        }
    }
}

/// A physical key press.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyEvent {
    pub key: SmolStr,
    pub code: SmolStr,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<SmolStr>, code: impl Into<SmolStr>) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            modifiers: KeyModifiers::empty(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: KeyModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// The event a shortcut describes; a code shortcut yields an event with
/// only the code set.
impl From<&Shortcut> for KeyEvent {
    fn from(shortcut: &Shortcut) -> Self {
        let event = match &shortcut.trigger {
            Trigger::Key(key) => KeyEvent::new(key.clone(), ""),
            Trigger::Code(code) => KeyEvent::new("", code.clone()),
        };
        event.with_modifiers(shortcut.modifiers)
    }
}
