//! Normalized key identities.
//!
//! Every raw platform notification is translated to a [`KeyCode`] before the
//! engine sees it.  The numeric values are USB HID usage IDs (page 0x07,
//! Keyboard/Keypad page), the same codes a USB keyboard reports on the wire.
//!
//! # Why HID codes?
//!
//! HID usage IDs identify **physical key positions**, not characters.  The
//! key that sits where QWERTY has "A" reports usage 0x04 on every layout;
//! which *character* it produces is a separate question answered by the text
//! input path.  Using position codes means `IsDown(KeyCode::KeyA)` works the
//! same for a child typing on an AZERTY keyboard, and it gives every
//! platform adapter one unambiguous target to translate into.
//!
//! Keys with no standard mapping normalize to [`KeyCode::Unknown`] (0x0000).

use serde::{Deserialize, Serialize};

use crate::modifiers::ModifierFlags;

/// Normalized key identity (USB HID usage ID, page 0x07).
///
/// The numeric value of each variant is its HID usage ID.
/// [`KeyCode::Unknown`] represents any key with no mapping; the engine
/// tracks it like any other key but adapters should avoid emitting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum KeyCode {
    Unknown = 0x0000,

    // Letters (HID 0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (HID 0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Whitespace and control (HID 0x28–0x2C)
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,

    // Punctuation (HID 0x2D–0x38)
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Grave = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,

    // Locks (HID 0x39, 0x47, 0x53)
    CapsLock = 0x39,
    ScrollLock = 0x47,
    NumLock = 0x53,

    // Function keys (HID 0x3A–0x45)
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation and editing (HID 0x46, 0x49–0x52)
    PrintScreen = 0x46,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,

    // Modifiers (HID 0xE0–0xE7)
    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    MetaLeft = 0xE3,
    ControlRight = 0xE4,
    ShiftRight = 0xE5,
    AltRight = 0xE6,
    MetaRight = 0xE7,
}

impl KeyCode {
    /// Returns the [`ModifierFlags`] bit this key contributes while held,
    /// or `None` if the key is not a modifier.
    pub fn modifier_flag(self) -> Option<u8> {
        match self {
            KeyCode::ControlLeft => Some(ModifierFlags::LEFT_CTRL),
            KeyCode::ControlRight => Some(ModifierFlags::RIGHT_CTRL),
            KeyCode::ShiftLeft => Some(ModifierFlags::LEFT_SHIFT),
            KeyCode::ShiftRight => Some(ModifierFlags::RIGHT_SHIFT),
            KeyCode::AltLeft => Some(ModifierFlags::LEFT_ALT),
            KeyCode::AltRight => Some(ModifierFlags::RIGHT_ALT),
            KeyCode::MetaLeft => Some(ModifierFlags::LEFT_META),
            KeyCode::MetaRight => Some(ModifierFlags::RIGHT_META),
            _ => None,
        }
    }

    /// Returns `true` if this key is a modifier (Ctrl/Shift/Alt/Meta).
    pub fn is_modifier(self) -> bool {
        self.modifier_flag().is_some()
    }

    /// Canonical display name, as accepted by [`KeyCode::from_name`].
    pub fn name(self) -> &'static str {
        match self {
            KeyCode::Unknown => "Unknown",
            KeyCode::KeyA => "A",
            KeyCode::KeyB => "B",
            KeyCode::KeyC => "C",
            KeyCode::KeyD => "D",
            KeyCode::KeyE => "E",
            KeyCode::KeyF => "F",
            KeyCode::KeyG => "G",
            KeyCode::KeyH => "H",
            KeyCode::KeyI => "I",
            KeyCode::KeyJ => "J",
            KeyCode::KeyK => "K",
            KeyCode::KeyL => "L",
            KeyCode::KeyM => "M",
            KeyCode::KeyN => "N",
            KeyCode::KeyO => "O",
            KeyCode::KeyP => "P",
            KeyCode::KeyQ => "Q",
            KeyCode::KeyR => "R",
            KeyCode::KeyS => "S",
            KeyCode::KeyT => "T",
            KeyCode::KeyU => "U",
            KeyCode::KeyV => "V",
            KeyCode::KeyW => "W",
            KeyCode::KeyX => "X",
            KeyCode::KeyY => "Y",
            KeyCode::KeyZ => "Z",
            KeyCode::Digit0 => "0",
            KeyCode::Digit1 => "1",
            KeyCode::Digit2 => "2",
            KeyCode::Digit3 => "3",
            KeyCode::Digit4 => "4",
            KeyCode::Digit5 => "5",
            KeyCode::Digit6 => "6",
            KeyCode::Digit7 => "7",
            KeyCode::Digit8 => "8",
            KeyCode::Digit9 => "9",
            KeyCode::Enter => "Enter",
            KeyCode::Escape => "Escape",
            KeyCode::Backspace => "Backspace",
            KeyCode::Tab => "Tab",
            KeyCode::Space => "Space",
            KeyCode::Minus => "-",
            KeyCode::Equal => "=",
            KeyCode::BracketLeft => "[",
            KeyCode::BracketRight => "]",
            KeyCode::Backslash => "\\",
            KeyCode::Semicolon => ";",
            KeyCode::Quote => "'",
            KeyCode::Grave => "`",
            KeyCode::Comma => ",",
            KeyCode::Period => ".",
            KeyCode::Slash => "/",
            KeyCode::CapsLock => "CapsLock",
            KeyCode::ScrollLock => "ScrollLock",
            KeyCode::NumLock => "NumLock",
            KeyCode::F1 => "F1",
            KeyCode::F2 => "F2",
            KeyCode::F3 => "F3",
            KeyCode::F4 => "F4",
            KeyCode::F5 => "F5",
            KeyCode::F6 => "F6",
            KeyCode::F7 => "F7",
            KeyCode::F8 => "F8",
            KeyCode::F9 => "F9",
            KeyCode::F10 => "F10",
            KeyCode::F11 => "F11",
            KeyCode::F12 => "F12",
            KeyCode::PrintScreen => "PrintScreen",
            KeyCode::Insert => "Insert",
            KeyCode::Home => "Home",
            KeyCode::PageUp => "PageUp",
            KeyCode::Delete => "Delete",
            KeyCode::End => "End",
            KeyCode::PageDown => "PageDown",
            KeyCode::ArrowRight => "Right",
            KeyCode::ArrowLeft => "Left",
            KeyCode::ArrowDown => "Down",
            KeyCode::ArrowUp => "Up",
            KeyCode::ControlLeft => "LeftCtrl",
            KeyCode::ControlRight => "RightCtrl",
            KeyCode::ShiftLeft => "LeftShift",
            KeyCode::ShiftRight => "RightShift",
            KeyCode::AltLeft => "LeftAlt",
            KeyCode::AltRight => "RightAlt",
            KeyCode::MetaLeft => "LeftMeta",
            KeyCode::MetaRight => "RightMeta",
        }
    }

    /// Case-insensitive lookup of a key by name.
    ///
    /// Accepts the canonical names from [`KeyCode::name`] plus common
    /// aliases ("Esc", "Return", "Del", "PgUp", "ArrowLeft", ...).
    pub fn from_name(s: &str) -> Option<KeyCode> {
        let s = s.trim();

        // Single character keys: letters, digits, punctuation.
        if s.chars().count() == 1 {
            let ch = s.chars().next()?;
            return match ch.to_ascii_uppercase() {
                'A' => Some(KeyCode::KeyA),
                'B' => Some(KeyCode::KeyB),
                'C' => Some(KeyCode::KeyC),
                'D' => Some(KeyCode::KeyD),
                'E' => Some(KeyCode::KeyE),
                'F' => Some(KeyCode::KeyF),
                'G' => Some(KeyCode::KeyG),
                'H' => Some(KeyCode::KeyH),
                'I' => Some(KeyCode::KeyI),
                'J' => Some(KeyCode::KeyJ),
                'K' => Some(KeyCode::KeyK),
                'L' => Some(KeyCode::KeyL),
                'M' => Some(KeyCode::KeyM),
                'N' => Some(KeyCode::KeyN),
                'O' => Some(KeyCode::KeyO),
                'P' => Some(KeyCode::KeyP),
                'Q' => Some(KeyCode::KeyQ),
                'R' => Some(KeyCode::KeyR),
                'S' => Some(KeyCode::KeyS),
                'T' => Some(KeyCode::KeyT),
                'U' => Some(KeyCode::KeyU),
                'V' => Some(KeyCode::KeyV),
                'W' => Some(KeyCode::KeyW),
                'X' => Some(KeyCode::KeyX),
                'Y' => Some(KeyCode::KeyY),
                'Z' => Some(KeyCode::KeyZ),
                '0' => Some(KeyCode::Digit0),
                '1' => Some(KeyCode::Digit1),
                '2' => Some(KeyCode::Digit2),
                '3' => Some(KeyCode::Digit3),
                '4' => Some(KeyCode::Digit4),
                '5' => Some(KeyCode::Digit5),
                '6' => Some(KeyCode::Digit6),
                '7' => Some(KeyCode::Digit7),
                '8' => Some(KeyCode::Digit8),
                '9' => Some(KeyCode::Digit9),
                '-' => Some(KeyCode::Minus),
                '=' => Some(KeyCode::Equal),
                '[' => Some(KeyCode::BracketLeft),
                ']' => Some(KeyCode::BracketRight),
                '\\' => Some(KeyCode::Backslash),
                ';' => Some(KeyCode::Semicolon),
                '\'' => Some(KeyCode::Quote),
                '`' => Some(KeyCode::Grave),
                ',' => Some(KeyCode::Comma),
                '.' => Some(KeyCode::Period),
                '/' => Some(KeyCode::Slash),
                _ => None,
            };
        }

        match s.to_ascii_lowercase().as_str() {
            "enter" | "return" => Some(KeyCode::Enter),
            "escape" | "esc" => Some(KeyCode::Escape),
            "backspace" | "back" => Some(KeyCode::Backspace),
            "tab" => Some(KeyCode::Tab),
            "space" | "spacebar" => Some(KeyCode::Space),
            "capslock" => Some(KeyCode::CapsLock),
            "scrolllock" => Some(KeyCode::ScrollLock),
            "numlock" => Some(KeyCode::NumLock),
            "f1" => Some(KeyCode::F1),
            "f2" => Some(KeyCode::F2),
            "f3" => Some(KeyCode::F3),
            "f4" => Some(KeyCode::F4),
            "f5" => Some(KeyCode::F5),
            "f6" => Some(KeyCode::F6),
            "f7" => Some(KeyCode::F7),
            "f8" => Some(KeyCode::F8),
            "f9" => Some(KeyCode::F9),
            "f10" => Some(KeyCode::F10),
            "f11" => Some(KeyCode::F11),
            "f12" => Some(KeyCode::F12),
            "printscreen" | "prtsc" => Some(KeyCode::PrintScreen),
            "insert" | "ins" => Some(KeyCode::Insert),
            "home" => Some(KeyCode::Home),
            "pageup" | "pgup" => Some(KeyCode::PageUp),
            "delete" | "del" => Some(KeyCode::Delete),
            "end" => Some(KeyCode::End),
            "pagedown" | "pgdn" => Some(KeyCode::PageDown),
            "right" | "arrowright" => Some(KeyCode::ArrowRight),
            "left" | "arrowleft" => Some(KeyCode::ArrowLeft),
            "down" | "arrowdown" => Some(KeyCode::ArrowDown),
            "up" | "arrowup" => Some(KeyCode::ArrowUp),
            "leftctrl" | "lctrl" => Some(KeyCode::ControlLeft),
            "rightctrl" | "rctrl" => Some(KeyCode::ControlRight),
            "leftshift" | "lshift" => Some(KeyCode::ShiftLeft),
            "rightshift" | "rshift" => Some(KeyCode::ShiftRight),
            "leftalt" | "lalt" => Some(KeyCode::AltLeft),
            "rightalt" | "ralt" => Some(KeyCode::AltRight),
            "leftmeta" | "lmeta" => Some(KeyCode::MetaLeft),
            "rightmeta" | "rmeta" => Some(KeyCode::MetaRight),
            _ => None,
        }
    }
}
