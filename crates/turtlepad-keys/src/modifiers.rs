//! Modifier and lock-key state.
//!
//! [`ModifierFlags`] packs the eight modifier keys (left/right
//! Ctrl/Shift/Alt/Meta) into a single byte.  Left and right are tracked
//! separately so the engine can keep an exact held-set, while the logical
//! accessors (`ctrl()`, `shift()`, ...) answer the question scripts and
//! shortcuts actually ask: "is Ctrl held, either side?"

use serde::{Deserialize, Serialize};

/// Bitset of held modifier keys.
///
/// Bit layout matches the order of the associated constants; the wrapped
/// byte is public so adapters can build a value directly from platform
/// modifier masks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierFlags(pub u8);

impl ModifierFlags {
    pub const LEFT_CTRL: u8 = 1 << 0;
    pub const RIGHT_CTRL: u8 = 1 << 1;
    pub const LEFT_SHIFT: u8 = 1 << 2;
    pub const RIGHT_SHIFT: u8 = 1 << 3;
    pub const LEFT_ALT: u8 = 1 << 4;
    pub const RIGHT_ALT: u8 = 1 << 5;
    pub const LEFT_META: u8 = 1 << 6;
    pub const RIGHT_META: u8 = 1 << 7;

    /// No modifiers held.
    pub const NONE: ModifierFlags = ModifierFlags(0);

    /// Returns `true` if either Ctrl modifier is active.
    pub fn ctrl(&self) -> bool {
        self.0 & (Self::LEFT_CTRL | Self::RIGHT_CTRL) != 0
    }

    /// Returns `true` if either Shift modifier is active.
    pub fn shift(&self) -> bool {
        self.0 & (Self::LEFT_SHIFT | Self::RIGHT_SHIFT) != 0
    }

    /// Returns `true` if either Alt modifier is active.
    pub fn alt(&self) -> bool {
        self.0 & (Self::LEFT_ALT | Self::RIGHT_ALT) != 0
    }

    /// Returns `true` if either Meta (Win/Cmd/Super) modifier is active.
    pub fn meta(&self) -> bool {
        self.0 & (Self::LEFT_META | Self::RIGHT_META) != 0
    }

    /// Returns `true` if no modifier is held.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Sets the given bit(s).
    pub fn insert(&mut self, bits: u8) {
        self.0 |= bits;
    }

    /// Clears the given bit(s).
    pub fn remove(&mut self, bits: u8) {
        self.0 &= !bits;
    }

    /// Returns `true` if this set satisfies `required` at the logical level.
    ///
    /// For each of Ctrl/Shift/Alt/Meta: if `required` holds it on either
    /// side, `self` must hold it on either side.  Modifiers held by `self`
    /// beyond the requirement are tolerated, which is what lets Ctrl+Shift+R
    /// trigger a Ctrl+R shortcut.
    pub fn covers(&self, required: ModifierFlags) -> bool {
        (!required.ctrl() || self.ctrl())
            && (!required.shift() || self.shift())
            && (!required.alt() || self.alt())
            && (!required.meta() || self.meta())
    }
}

/// Lock-key toggle states (Caps/Num/Scroll), sampled from the platform at
/// notification time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStates {
    pub caps_lock: bool,
    pub num_lock: bool,
    pub scroll_lock: bool,
}
