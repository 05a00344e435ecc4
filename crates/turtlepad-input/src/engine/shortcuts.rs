//! The shortcut matcher: a small state machine per registration.
//!
//! Driven by every *non-repeat* key-down notification (auto-repeat is
//! ignored so a held hotkey cannot machine-gun).  Each registration is one
//! of two regimes:
//!
//! - **Chord-only** (one step, e.g. Ctrl+R): fires when its chord becomes
//!   satisfied by the key that was just pressed, then *arms* — it will not
//!   fire again until the chord stops being satisfied (release) and is
//!   pressed anew.  Key-ups disarm any armed chord whose predicate no
//!   longer holds; that is what re-enables firing after release+re-press.
//!
//! - **Sequence** (multiple steps, e.g. Ctrl+K then Ctrl+C): tracks the next
//!   expected step and the time the previous step was accepted.  A step
//!   arriving after the per-step timeout resets progress.  A key-down that
//!   fails the current step is immediately re-tried as step 0, so a
//!   sequence can restart mid-evaluation without an intervening miss.
//!
//! All registrations are evaluated independently on every key-down, in
//! insertion order; at most one fired id is reported per notification
//! (first match wins).

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, trace};
use turtlepad_keys::{Chord, KeyCode, ShortcutSpec};

use super::state::KeyboardSnapshot;

/// Handle for a registered shortcut.
///
/// Ids are assigned monotonically starting at 1 and never reused while the
/// registration lives; 0 is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortcutId(pub u64);

/// Error type for shortcut registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortcutError {
    /// The spec has no steps at all.
    #[error("shortcut has no steps")]
    EmptySequence,
    /// A step requires no keys, so it could never be satisfied.
    #[error("step {step} has an empty key set")]
    EmptyChord { step: usize },
}

/// One registered shortcut plus its matcher state.
struct ShortcutEntry {
    id: ShortcutId,
    spec: ShortcutSpec,
    /// Next expected step index (sequences only; stays 0 for chords).
    progress: usize,
    /// When the previous step was accepted (sequences only).
    last_step_at: Option<Instant>,
    /// Latched after firing (chord-only regime).
    armed: bool,
}

/// The registration table and matcher.  Guarded by the engine's shortcut
/// mutex; never touched under the state lock.
pub(crate) struct ShortcutTable {
    entries: Vec<ShortcutEntry>,
    next_id: u64,
}

impl ShortcutTable {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Registers a shortcut, validating it per the caller-input rules.
    pub(crate) fn register(&mut self, spec: ShortcutSpec) -> Result<ShortcutId, ShortcutError> {
        if spec.steps.is_empty() {
            return Err(ShortcutError::EmptySequence);
        }
        if let Some(step) = spec.steps.iter().position(|c| c.keys.is_empty()) {
            return Err(ShortcutError::EmptyChord { step });
        }

        let id = ShortcutId(self.next_id);
        self.next_id += 1;
        debug!(id = id.0, shortcut = %spec, "shortcut registered");
        self.entries.push(ShortcutEntry {
            id,
            spec,
            progress: 0,
            last_step_at: None,
            armed: false,
        });
        Ok(id)
    }

    /// Removes a registration.  Returns `false` if the id is unknown.
    pub(crate) fn unregister(&mut self, id: ShortcutId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops all registrations (engine re-initialization).
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Evaluates every registration against a fresh non-repeat key-down.
    ///
    /// `snapshot` is the state captured *after* the down was applied, so
    /// `trigger` is always in its held-set.  Returns the first fired id.
    pub(crate) fn on_key_down(
        &mut self,
        trigger: KeyCode,
        snapshot: &KeyboardSnapshot,
        now: Instant,
    ) -> Option<ShortcutId> {
        let mut fired = None;
        for entry in &mut self.entries {
            let hit = if entry.spec.is_chord_only() {
                entry.eval_chord(trigger, snapshot)
            } else {
                entry.eval_sequence(snapshot, now)
            };
            if hit && fired.is_none() {
                fired = Some(entry.id);
            }
        }
        if let Some(id) = fired {
            debug!(id = id.0, key = ?trigger, "shortcut fired");
        }
        fired
    }

    /// Re-evaluates armed chord-only registrations after a key-up and
    /// disarms those whose chord no longer holds.
    pub(crate) fn on_key_up(&mut self, snapshot: &KeyboardSnapshot) {
        for entry in &mut self.entries {
            if entry.armed
                && entry.spec.is_chord_only()
                && !chord_matches(&entry.spec.steps[0], snapshot, None)
            {
                trace!(id = entry.id.0, "chord released; disarmed");
                entry.armed = false;
            }
        }
    }
}

impl ShortcutEntry {
    /// Chord-only regime: arm-and-latch.  Returns `true` on fire.
    fn eval_chord(&mut self, trigger: KeyCode, snapshot: &KeyboardSnapshot) -> bool {
        if !chord_matches(&self.spec.steps[0], snapshot, Some(trigger)) {
            self.armed = false;
            return false;
        }
        if self.armed {
            // Still held since the last fire; no re-fire.
            return false;
        }
        self.armed = true;
        true
    }

    /// Sequence regime: advance, fire on completion, or restart as step 0.
    fn eval_sequence(&mut self, snapshot: &KeyboardSnapshot, now: Instant) -> bool {
        if self.progress > 0 {
            if let (Some(timeout), Some(last)) = (self.spec.step_timeout, self.last_step_at) {
                if now.duration_since(last) > timeout {
                    trace!(id = self.id.0, "sequence step timed out; progress reset");
                    self.progress = 0;
                }
            }
        }

        if chord_matches(&self.spec.steps[self.progress], snapshot, None) {
            self.progress += 1;
            self.last_step_at = Some(now);
            if self.progress == self.spec.steps.len() {
                self.progress = 0;
                return true;
            }
            return false;
        }

        // The current step missed; this key-down may still begin a fresh run.
        if self.progress > 0 {
            if chord_matches(&self.spec.steps[0], snapshot, None) {
                self.progress = 1;
                self.last_step_at = Some(now);
            } else {
                self.progress = 0;
            }
        }
        false
    }
}

/// The single-chord predicate from the matching rules.
///
/// Modifiers must cover the chord's requirement (extras tolerated), every
/// chord key must be held, and — when `trigger` is given (chord-only
/// registrations) — the triggering key must itself belong to the chord, so
/// an unrelated press cannot re-confirm a chord that is merely being held.
/// An empty key set never matches.
fn chord_matches(chord: &Chord, snapshot: &KeyboardSnapshot, trigger: Option<KeyCode>) -> bool {
    if chord.keys.is_empty() {
        return false;
    }
    if !snapshot.modifiers.covers(chord.modifiers) {
        return false;
    }
    if let Some(trigger) = trigger {
        if !chord.contains_key(trigger) {
            return false;
        }
    }
    chord.keys.iter().all(|k| snapshot.is_held(*k))
}
