//! Shortcut descriptors: chords and chord sequences.
//!
//! A [`Chord`] is a set of keys plus required modifiers that must all be
//! held at the same instant (Ctrl+R).  A [`ShortcutSpec`] is one chord, or
//! an ordered sequence of chords that must be satisfied one after another
//! ("Ctrl+K, Ctrl+C"), optionally within a per-step timeout.
//!
//! Descriptors parse from the human-readable form used in Turtlepad's
//! keybinding configuration:
//!
//! - Steps are separated by commas.
//! - Within a step, tokens are separated by `+`.  Modifier tokens
//!   (`Ctrl`, `Alt`, `Shift`, `Meta` and their aliases) set required
//!   modifiers; every other token is looked up as a key name and added to
//!   the step's key set.
//!
//! Matching semantics live in the engine crate; this crate only describes
//! *what* a shortcut is.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::code::KeyCode;
use crate::modifiers::ModifierFlags;

/// A simultaneous key combination: required modifiers plus required keys.
///
/// Matching tolerates *extra* modifiers (Ctrl+Shift+R satisfies a Ctrl+R
/// chord) but every key in `keys` must be held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    /// Modifiers that must be held (either side satisfies).
    pub modifiers: ModifierFlags,
    /// Non-modifier keys that must all be held.
    pub keys: Vec<KeyCode>,
}

impl Chord {
    /// A chord of a single key with no modifiers.
    pub fn key(key: KeyCode) -> Self {
        Self {
            modifiers: ModifierFlags::NONE,
            keys: vec![key],
        }
    }

    /// A Ctrl+key chord.
    pub fn ctrl(key: KeyCode) -> Self {
        Self {
            modifiers: ModifierFlags(ModifierFlags::LEFT_CTRL),
            keys: vec![key],
        }
    }

    /// An Alt+key chord.
    pub fn alt(key: KeyCode) -> Self {
        Self {
            modifiers: ModifierFlags(ModifierFlags::LEFT_ALT),
            keys: vec![key],
        }
    }

    /// A Shift+key chord.
    pub fn shift(key: KeyCode) -> Self {
        Self {
            modifiers: ModifierFlags(ModifierFlags::LEFT_SHIFT),
            keys: vec![key],
        }
    }

    /// A Ctrl+Shift+key chord.
    pub fn ctrl_shift(key: KeyCode) -> Self {
        Self {
            modifiers: ModifierFlags(ModifierFlags::LEFT_CTRL | ModifierFlags::LEFT_SHIFT),
            keys: vec![key],
        }
    }

    /// Returns `true` if `key` is one of this chord's required keys.
    pub fn contains_key(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = Vec::new();
        if self.modifiers.ctrl() {
            parts.push("Ctrl");
        }
        if self.modifiers.alt() {
            parts.push("Alt");
        }
        if self.modifiers.shift() {
            parts.push("Shift");
        }
        if self.modifiers.meta() {
            parts.push("Meta");
        }
        for key in &self.keys {
            parts.push(key.name());
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// A shortcut: one chord or an ordered sequence of chords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutSpec {
    /// The chords to satisfy, in order.
    pub steps: Vec<Chord>,
    /// Maximum gap allowed between consecutive satisfied steps.
    ///
    /// `None` means a started sequence never expires.  Ignored for
    /// single-chord shortcuts.
    pub step_timeout: Option<Duration>,
}

impl ShortcutSpec {
    /// A single-chord shortcut.
    pub fn chord(chord: Chord) -> Self {
        Self {
            steps: vec![chord],
            step_timeout: None,
        }
    }

    /// A multi-step sequence with the given per-step timeout.
    pub fn sequence(steps: Vec<Chord>, step_timeout: Duration) -> Self {
        Self {
            steps,
            step_timeout: Some(step_timeout),
        }
    }

    /// Returns the builder with a different step timeout.
    pub fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Returns `true` for a single-chord shortcut (the armed/latched regime).
    pub fn is_chord_only(&self) -> bool {
        self.steps.len() == 1
    }
}

impl fmt::Display for ShortcutSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<String> = self.steps.iter().map(Chord::to_string).collect();
        write!(f, "{}", steps.join(", "))
    }
}

/// Error type for parsing shortcut strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortcutParseError {
    /// The string (or one of its steps) is empty.
    #[error("empty shortcut")]
    Empty,
    /// A step contains only modifiers.
    #[error("step {0} has no key (only modifiers)")]
    NoKey(usize),
    /// A token is not a modifier and not a known key name.
    #[error("unknown key: {0}")]
    UnknownKey(String),
}

impl FromStr for Chord {
    type Err = ShortcutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_step(s, 0)
    }
}

impl FromStr for ShortcutSpec {
    type Err = ShortcutParseError;

    /// Parses a shortcut like `"Ctrl+R"` or `"Ctrl+K, Ctrl+C"`.
    ///
    /// The parsed spec carries no step timeout; callers attach one via
    /// [`ShortcutSpec::with_step_timeout`] (the engine applies its
    /// configured default to sequences registered without one).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ShortcutParseError::Empty);
        }
        let steps = s
            .split(',')
            .enumerate()
            .map(|(i, step)| parse_step(step, i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ShortcutSpec {
            steps,
            step_timeout: None,
        })
    }
}

fn parse_step(s: &str, index: usize) -> Result<Chord, ShortcutParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ShortcutParseError::Empty);
    }

    let mut modifiers = ModifierFlags::NONE;
    let mut keys = Vec::new();

    for part in s.split('+') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => modifiers.insert(ModifierFlags::LEFT_CTRL),
            "alt" | "option" => modifiers.insert(ModifierFlags::LEFT_ALT),
            "shift" => modifiers.insert(ModifierFlags::LEFT_SHIFT),
            "meta" | "cmd" | "command" | "win" | "super" => {
                modifiers.insert(ModifierFlags::LEFT_META)
            }
            _ => match KeyCode::from_name(part) {
                Some(key) => keys.push(key),
                None => return Err(ShortcutParseError::UnknownKey(part.to_string())),
            },
        }
    }

    if keys.is_empty() {
        return Err(ShortcutParseError::NoKey(index));
    }

    Ok(Chord { modifiers, keys })
}
