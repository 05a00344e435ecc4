//! # turtlepad-keys
//!
//! Shared key vocabulary for the Turtlepad input engine: key identities,
//! modifier flags, lock-key states, and shortcut descriptors.
//!
//! This crate has zero dependencies on OS APIs, UI toolkits, or threads.
//! It is used by the engine crate (`turtlepad-input`) and by any host
//! embedding Turtlepad that needs to talk about keys.
//!
//! # Architecture overview
//!
//! Turtlepad is a coding environment for children: a script editor plus
//! drawing, sound, and keyboard APIs that children's programs call.  When a
//! child's program asks "is the R key down right now?", everything involved
//! has to agree on what "the R key" *is* — independently of the operating
//! system, the keyboard layout (QWERTY, AZERTY, ...), or the UI toolkit that
//! delivered the raw event.
//!
//! This crate defines that shared language:
//!
//! - **[`KeyCode`]** – one name per physical key, numbered with USB HID
//!   usage IDs so every platform adapter normalizes to the same code.
//!
//! - **[`ModifierFlags`]** – a compact bitset recording which of
//!   Ctrl/Shift/Alt/Meta are held, with left and right keys tracked
//!   separately.
//!
//! - **[`Chord`] and [`ShortcutSpec`]** – descriptions of hotkeys: a chord
//!   is "these modifiers plus these keys, all held at once" (Ctrl+R); a
//!   shortcut is one chord or an ordered sequence of chords (the classic
//!   two-step "Ctrl+K, Ctrl+C" style), optionally with a per-step timeout.
//!
//! Shortcut descriptors parse from human-readable strings, because that is
//! how an educational environment stores its bindings:
//!
//! ```rust
//! use turtlepad_keys::ShortcutSpec;
//!
//! let run: ShortcutSpec = "Ctrl+R".parse().unwrap();
//! assert!(run.is_chord_only());
//!
//! let comment: ShortcutSpec = "Ctrl+K, Ctrl+C".parse().unwrap();
//! assert_eq!(comment.steps.len(), 2);
//! ```

pub mod code;
pub mod modifiers;
pub mod shortcut;

pub use code::KeyCode;
pub use modifiers::{LockStates, ModifierFlags};
pub use shortcut::{Chord, ShortcutParseError, ShortcutSpec};
