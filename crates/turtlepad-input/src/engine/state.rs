//! The key state store: ground truth of what the keyboard is doing.
//!
//! Owns the down-set, the single-shot edge sets, per-key auto-repeat
//! counters, the bounded text buffer, the wholesale-swapped snapshot, and
//! the two pulses ("current key press" / "current text input").
//!
//! This type is pure data plus mutators; it is always accessed through the
//! engine's state mutex and never takes a lock itself.  Every mutator is a
//! single atomic unit of state change — a concurrent reader (through the
//! engine) sees either all of a notification's effects or none of them.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use turtlepad_keys::{KeyCode, LockStates, ModifierFlags};

use super::pulse::Pulse;

/// Immutable capture of keyboard state at one notification.
///
/// Replaced wholesale (as a fresh `Arc`) on every key-down and key-up, so a
/// reader can never observe a torn snapshot: it either has the old one or
/// the new one, each internally consistent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardSnapshot {
    /// Modifiers held at capture time.
    pub modifiers: ModifierFlags,
    /// Lock-key toggle states at capture time.
    pub locks: LockStates,
    /// The key of the most recent key-down notification.
    pub last_down: Option<KeyCode>,
    /// The key of the most recent key-up notification.
    pub last_up: Option<KeyCode>,
    /// All keys held at capture time.
    pub held: HashSet<KeyCode>,
}

impl KeyboardSnapshot {
    /// Returns `true` if `key` was held when this snapshot was captured.
    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }
}

/// Result of applying a key-down to the store.
#[derive(Debug, Clone, Copy)]
pub(crate) struct KeyDownOutcome {
    /// `true` if the key was not already in the down-set (a fresh press).
    pub newly_pressed: bool,
    /// Version the deferred key-pulse clear must present to expire.
    pub pulse_version: u64,
}

pub(crate) struct KeyStateStore {
    down: HashSet<KeyCode>,
    pressed_edges: HashSet<KeyCode>,
    released_edges: HashSet<KeyCode>,
    repeat_counts: HashMap<KeyCode, u32>,
    text: VecDeque<char>,
    text_capacity: usize,
    snapshot: Arc<KeyboardSnapshot>,
    pub(crate) key_pulse: Pulse<KeyCode>,
    pub(crate) text_pulse: Pulse<String>,
    last_key: Option<KeyCode>,
    last_text: Option<String>,
}

impl KeyStateStore {
    pub(crate) fn new(text_capacity: usize) -> Self {
        Self {
            down: HashSet::new(),
            pressed_edges: HashSet::new(),
            released_edges: HashSet::new(),
            repeat_counts: HashMap::new(),
            text: VecDeque::new(),
            text_capacity,
            snapshot: Arc::new(KeyboardSnapshot::default()),
            key_pulse: Pulse::default(),
            text_pulse: Pulse::default(),
            last_key: None,
            last_text: None,
        }
    }

    // ── Notification mutators ────────────────────────────────────────────────

    /// Applies a key-down notification.
    ///
    /// Non-repeat downs add the key to the down-set and, if newly added, to
    /// the pressed-edge set.  Repeats only advance the repeat counter.  The
    /// snapshot is replaced either way; `locks: None` keeps the previous
    /// lock states (the platform probe failed, which is non-fatal).
    pub(crate) fn apply_key_down(
        &mut self,
        key: KeyCode,
        modifiers: ModifierFlags,
        is_repeat: bool,
        locks: Option<LockStates>,
    ) -> KeyDownOutcome {
        let mut newly_pressed = false;
        if !is_repeat {
            newly_pressed = self.down.insert(key);
            if newly_pressed {
                self.pressed_edges.insert(key);
            }
            self.repeat_counts.insert(key, 0);
        } else {
            *self.repeat_counts.entry(key).or_insert(0) += 1;
        }

        self.last_key = Some(key);
        let pulse_version = self.key_pulse.set(key);
        self.replace_snapshot(modifiers, locks, Some(key), self.snapshot.last_up);

        KeyDownOutcome {
            newly_pressed,
            pulse_version,
        }
    }

    /// Applies a key-up notification.  Returns `true` if the key was held.
    pub(crate) fn apply_key_up(
        &mut self,
        key: KeyCode,
        modifiers: ModifierFlags,
        locks: Option<LockStates>,
    ) -> bool {
        let was_down = self.down.remove(&key);
        if was_down {
            self.released_edges.insert(key);
        }
        self.repeat_counts.remove(&key);
        self.replace_snapshot(modifiers, locks, self.snapshot.last_down, Some(key));
        was_down
    }

    /// Appends composed text to the buffer, evicting the oldest characters
    /// on overflow.  Returns the text-pulse version for the deferred clear.
    pub(crate) fn push_text(&mut self, text: &str) -> u64 {
        self.text.extend(text.chars());
        // Trim after appending so the bound also holds for capacity 0.
        while self.text.len() > self.text_capacity {
            self.text.pop_front();
        }
        self.last_text = Some(text.to_string());
        self.text_pulse.set(text.to_string())
    }

    fn replace_snapshot(
        &mut self,
        modifiers: ModifierFlags,
        locks: Option<LockStates>,
        last_down: Option<KeyCode>,
        last_up: Option<KeyCode>,
    ) {
        self.snapshot = Arc::new(KeyboardSnapshot {
            modifiers,
            locks: locks.unwrap_or(self.snapshot.locks),
            last_down,
            last_up,
            held: self.down.clone(),
        });
    }

    // ── Polling accessors ────────────────────────────────────────────────────

    pub(crate) fn is_down(&self, key: KeyCode) -> bool {
        self.down.contains(&key)
    }

    /// Consumes the pressed edge for `key`: true at most once per transition.
    pub(crate) fn take_pressed(&mut self, key: KeyCode) -> bool {
        self.pressed_edges.remove(&key)
    }

    /// Consumes the released edge for `key`.
    pub(crate) fn take_released(&mut self, key: KeyCode) -> bool {
        self.released_edges.remove(&key)
    }

    pub(crate) fn repeat_count(&self, key: KeyCode) -> u32 {
        self.repeat_counts.get(&key).copied().unwrap_or(0)
    }

    /// Returns and clears the entire text buffer.
    pub(crate) fn read_text(&mut self) -> String {
        self.text.drain(..).collect()
    }

    /// Returns and removes the oldest buffered character.
    pub(crate) fn read_char(&mut self) -> Option<char> {
        self.text.pop_front()
    }

    pub(crate) fn snapshot(&self) -> Arc<KeyboardSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub(crate) fn last_key(&self) -> Option<KeyCode> {
        self.last_key
    }

    pub(crate) fn last_text(&self) -> Option<String> {
        self.last_text.clone()
    }

    /// Clears everything back to the freshly-initialized state.
    pub(crate) fn clear(&mut self) {
        self.down.clear();
        self.pressed_edges.clear();
        self.released_edges.clear();
        self.repeat_counts.clear();
        self.text.clear();
        self.snapshot = Arc::new(KeyboardSnapshot::default());
        self.key_pulse.reset();
        self.text_pulse.reset();
        self.last_key = None;
        self.last_text = None;
    }
}
