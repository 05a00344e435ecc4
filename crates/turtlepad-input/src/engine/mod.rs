//! The keyboard engine facade.
//!
//! [`KeyboardEngine`] owns everything in one place: the key state store,
//! the shortcut table, the subscriber registry, the delivery worker, and
//! the binding to an input source.  It is an explicit instance — create as
//! many as you like (one per test, one per window) and drop them cleanly —
//! rather than a process-wide static.
//!
//! # Locking discipline
//!
//! Two independent `std::sync::Mutex`es: one for the state store, one for
//! the shortcut table.  They are never held at the same time — shortcut
//! evaluation receives a snapshot *copied out* under the state lock, which
//! is released before the shortcut lock is taken.  No user callback and no
//! I/O ever runs under either lock.  Polling accessors block only for the
//! brief critical section.
//!
//! # Threads and tasks
//!
//! - The producer (host UI thread or the pump thread started by
//!   [`KeyboardEngine::bind`]) calls the `notify_*` entry points.
//! - The delivery worker task invokes subscribers, one at a time, off the
//!   producer thread.
//! - Pulse-expiry tasks sleep for the configured window, then clear the
//!   pulse only if their version is still current.  They hold a `Weak`
//!   engine reference, so a dropped engine is never kept alive (or
//!   revived) by a pending timer.

use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use turtlepad_keys::{KeyCode, LockStates, ModifierFlags, ShortcutSpec};

use crate::config::EngineConfig;
use crate::source::{InputSource, RawKeyEvent};

pub mod delivery;
pub mod pulse;
pub mod shortcuts;
pub mod state;

use delivery::{DeliveryWorker, EngineEvent, EventKind, Subscribers, SubscriptionId};
use shortcuts::{ShortcutError, ShortcutId, ShortcutTable};
use state::{KeyStateStore, KeyboardSnapshot};

/// Error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine was created outside a tokio runtime context.
    #[error("no tokio runtime context; create the engine inside a runtime")]
    NoRuntime,

    /// A shortcut registration was malformed.
    #[error(transparent)]
    InvalidShortcut(#[from] ShortcutError),

    /// The input source failed to start.
    #[error("input source failed to start: {0}")]
    Source(#[from] crate::source::CaptureError),
}

/// An active input-source binding: the source plus its pump thread.
struct Binding {
    source: Arc<dyn InputSource>,
    pump: thread::JoinHandle<()>,
}

struct EngineShared {
    pulse_window: Duration,
    default_step_timeout: Duration,
    state: Mutex<KeyStateStore>,
    shortcuts: Mutex<ShortcutTable>,
    subscribers: Arc<Mutex<Subscribers>>,
    delivery: Mutex<Option<DeliveryWorker>>,
    binding: Mutex<Option<Binding>>,
    runtime: Handle,
}

impl Drop for EngineShared {
    fn drop(&mut self) {
        // Closing the source lets the pump thread exit on its own; the
        // pulse tasks fail their Weak upgrade and fall through.
        if let Ok(mut binding) = self.binding.lock() {
            if let Some(binding) = binding.take() {
                binding.source.stop();
            }
        }
        if let Ok(mut delivery) = self.delivery.lock() {
            if let Some(worker) = delivery.take() {
                worker.abort();
            }
        }
    }
}

enum PulseKind {
    Key,
    Text,
}

/// The Turtlepad keyboard input engine.
///
/// Cheap to clone; clones share the same underlying engine, which is how
/// the polling surface is handed to a script thread while the producer
/// keeps feeding notifications.
#[derive(Clone)]
pub struct KeyboardEngine {
    shared: Arc<EngineShared>,
}

impl KeyboardEngine {
    /// Creates an engine and starts its delivery worker.
    ///
    /// Must be called from within a tokio runtime context (the worker and
    /// the pulse-expiry timers are spawned onto it).
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        let subscribers = Arc::new(Mutex::new(Subscribers::new()));
        let delivery = DeliveryWorker::spawn(&runtime, Arc::clone(&subscribers));

        Ok(Self {
            shared: Arc::new(EngineShared {
                pulse_window: config.pulse_window(),
                default_step_timeout: config.default_step_timeout(),
                state: Mutex::new(KeyStateStore::new(config.input.text_buffer_capacity)),
                shortcuts: Mutex::new(ShortcutTable::new()),
                subscribers,
                delivery: Mutex::new(Some(delivery)),
                binding: Mutex::new(None),
                runtime,
            }),
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Binds the engine to an input source, replacing any previous binding.
    ///
    /// The previous source is stopped and its pump joined, the previous
    /// delivery worker is stopped and drained, all key state and shortcut
    /// registrations are cleared, and only then does the fresh worker and
    /// pump start — no callback from the old binding can fire afterwards.
    pub async fn bind(&self, source: Arc<dyn InputSource>) -> Result<(), EngineError> {
        self.stop_binding();

        let old_worker = self
            .shared
            .delivery
            .lock()
            .expect("delivery handle lock poisoned")
            .take();
        if let Some(worker) = old_worker {
            worker.shutdown().await;
        }

        self.shared
            .state
            .lock()
            .expect("keyboard state lock poisoned")
            .clear();
        self.shared
            .shortcuts
            .lock()
            .expect("shortcut table lock poisoned")
            .clear();

        *self
            .shared
            .delivery
            .lock()
            .expect("delivery handle lock poisoned") = Some(DeliveryWorker::spawn(
            &self.shared.runtime,
            Arc::clone(&self.shared.subscribers),
        ));

        let rx = source.start()?;
        let weak = Arc::downgrade(&self.shared);
        let pump_source = Arc::clone(&source);
        let pump = thread::Builder::new()
            .name("turtlepad-input-pump".to_string())
            .spawn(move || pump_loop(weak, pump_source, rx))
            .expect("failed to spawn input pump thread");

        *self
            .shared
            .binding
            .lock()
            .expect("binding lock poisoned") = Some(Binding { source, pump });
        info!("keyboard engine bound to input source");
        Ok(())
    }

    /// Stops the input source and the delivery worker, discarding any
    /// events still queued.  The polling surface keeps working on the
    /// final state.
    pub async fn shutdown(&self) {
        self.stop_binding();
        let worker = self
            .shared
            .delivery
            .lock()
            .expect("delivery handle lock poisoned")
            .take();
        if let Some(worker) = worker {
            worker.shutdown().await;
        }
        info!("keyboard engine shut down");
    }

    /// Waits until every event published before this call has been
    /// delivered to subscribers.
    pub async fn flush(&self) {
        let pending = {
            let delivery = self
                .shared
                .delivery
                .lock()
                .expect("delivery handle lock poisoned");
            delivery.as_ref().and_then(|worker| worker.flush_request())
        };
        if let Some(pending) = pending {
            let _ = pending.await;
        }
    }

    fn stop_binding(&self) {
        let binding = self
            .shared
            .binding
            .lock()
            .expect("binding lock poisoned")
            .take();
        if let Some(binding) = binding {
            binding.source.stop();
            if binding.pump.join().is_err() {
                warn!("input pump thread panicked during unbind");
            }
        }
    }

    // ── Notification entry points (the adapter contract) ─────────────────────

    /// Handles a key-down notification.
    ///
    /// `locks: None` means the platform probe failed; the previous lock
    /// states are kept (non-fatal).  Repeats update counters and events but
    /// never create edges or drive the shortcut matcher.
    pub fn notify_key_down(
        &self,
        key: KeyCode,
        modifiers: ModifierFlags,
        is_repeat: bool,
        locks: Option<LockStates>,
        now: Instant,
    ) {
        let (outcome, snapshot) = {
            let mut state = self
                .shared
                .state
                .lock()
                .expect("keyboard state lock poisoned");
            let outcome = state.apply_key_down(key, modifiers, is_repeat, locks);
            (outcome, state.snapshot())
        };
        self.schedule_pulse_expiry(PulseKind::Key, outcome.pulse_version);

        let fired = if is_repeat {
            None
        } else {
            self.shared
                .shortcuts
                .lock()
                .expect("shortcut table lock poisoned")
                .on_key_down(key, &snapshot, now)
        };

        debug!(?key, is_repeat, fresh = outcome.newly_pressed, "key down");
        self.publish(EngineEvent::KeyDown {
            key,
            modifiers,
            is_repeat,
        });
        if let Some(id) = fired {
            self.publish(EngineEvent::ShortcutFired { id });
        }
    }

    /// Handles a key-up notification.
    ///
    /// The timestamp mirrors the key-down signature; the up-path of the
    /// matcher is purely predicate-based and does not consume it.
    pub fn notify_key_up(
        &self,
        key: KeyCode,
        modifiers: ModifierFlags,
        locks: Option<LockStates>,
        _now: Instant,
    ) {
        let snapshot = {
            let mut state = self
                .shared
                .state
                .lock()
                .expect("keyboard state lock poisoned");
            state.apply_key_up(key, modifiers, locks);
            state.snapshot()
        };

        self.shared
            .shortcuts
            .lock()
            .expect("shortcut table lock poisoned")
            .on_key_up(&snapshot);

        debug!(?key, "key up");
        self.publish(EngineEvent::KeyUp { key, modifiers });
    }

    /// Handles a text-composition notification.
    pub fn notify_text(&self, text: &str, modifiers: ModifierFlags) {
        let version = {
            let mut state = self
                .shared
                .state
                .lock()
                .expect("keyboard state lock poisoned");
            state.push_text(text)
        };
        self.schedule_pulse_expiry(PulseKind::Text, version);

        debug!(text, "text input");
        self.publish(EngineEvent::TextInput {
            text: text.to_string(),
            modifiers,
        });
    }

    fn schedule_pulse_expiry(&self, kind: PulseKind, version: u64) {
        let weak: Weak<EngineShared> = Arc::downgrade(&self.shared);
        let window = self.shared.pulse_window;
        self.shared.runtime.spawn(async move {
            tokio::time::sleep(window).await;
            if let Some(shared) = weak.upgrade() {
                let mut state = shared.state.lock().expect("keyboard state lock poisoned");
                match kind {
                    PulseKind::Key => state.key_pulse.expire(version),
                    PulseKind::Text => state.text_pulse.expire(version),
                };
            }
        });
    }

    fn publish(&self, event: EngineEvent) {
        let delivery = self
            .shared
            .delivery
            .lock()
            .expect("delivery handle lock poisoned");
        if let Some(worker) = delivery.as_ref() {
            worker.publish(event);
        }
    }

    // ── Polling surface ──────────────────────────────────────────────────────

    /// Returns `true` while `key` is held.  Non-consuming.
    pub fn is_down(&self, key: KeyCode) -> bool {
        self.shared
            .state
            .lock()
            .expect("keyboard state lock poisoned")
            .is_down(key)
    }

    /// Returns `true` while `key` is not held.
    pub fn is_up(&self, key: KeyCode) -> bool {
        !self.is_down(key)
    }

    /// Consumes and returns the pressed edge for `key`: true at most once
    /// per down-transition.
    pub fn was_pressed(&self, key: KeyCode) -> bool {
        self.shared
            .state
            .lock()
            .expect("keyboard state lock poisoned")
            .take_pressed(key)
    }

    /// Consumes and returns the released edge for `key`.
    pub fn was_released(&self, key: KeyCode) -> bool {
        self.shared
            .state
            .lock()
            .expect("keyboard state lock poisoned")
            .take_released(key)
    }

    /// Number of auto-repeat notifications since the last fresh down.
    pub fn repeat_count(&self, key: KeyCode) -> u32 {
        self.shared
            .state
            .lock()
            .expect("keyboard state lock poisoned")
            .repeat_count(key)
    }

    /// Returns and clears the entire buffered text atomically.
    pub fn read_text(&self) -> String {
        self.shared
            .state
            .lock()
            .expect("keyboard state lock poisoned")
            .read_text()
    }

    /// Returns and removes the oldest buffered character.
    pub fn read_char(&self) -> Option<char> {
        self.shared
            .state
            .lock()
            .expect("keyboard state lock poisoned")
            .read_char()
    }

    /// The current keyboard snapshot.  Never torn: swapped wholesale on
    /// every down/up notification.
    pub fn current_state(&self) -> Arc<KeyboardSnapshot> {
        self.shared
            .state
            .lock()
            .expect("keyboard state lock poisoned")
            .snapshot()
    }

    /// The key pressed within the last pulse window, if any.
    pub fn current_key_press(&self) -> Option<KeyCode> {
        self.shared
            .state
            .lock()
            .expect("keyboard state lock poisoned")
            .key_pulse
            .get()
            .copied()
    }

    /// The most recent key-down ever seen (does not expire).
    pub fn last_key_press(&self) -> Option<KeyCode> {
        self.shared
            .state
            .lock()
            .expect("keyboard state lock poisoned")
            .last_key()
    }

    /// The text composed within the last pulse window, if any.
    pub fn current_text_input(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .expect("keyboard state lock poisoned")
            .text_pulse
            .get()
            .cloned()
    }

    /// The most recent composed text ever seen (does not expire).
    pub fn last_text_input(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .expect("keyboard state lock poisoned")
            .last_text()
    }

    // ── Shortcuts ────────────────────────────────────────────────────────────

    /// Registers a shortcut and returns its id.
    ///
    /// Sequences registered without a step timeout get the configured
    /// default.  Malformed specs (no steps, a step with no keys) are
    /// rejected.
    pub fn register_shortcut(&self, mut spec: ShortcutSpec) -> Result<ShortcutId, EngineError> {
        if spec.steps.len() > 1 && spec.step_timeout.is_none() {
            spec.step_timeout = Some(self.shared.default_step_timeout);
        }
        Ok(self
            .shared
            .shortcuts
            .lock()
            .expect("shortcut table lock poisoned")
            .register(spec)?)
    }

    /// Removes a shortcut registration.  Returns `false` for unknown ids.
    pub fn unregister_shortcut(&self, id: ShortcutId) -> bool {
        self.shared
            .shortcuts
            .lock()
            .expect("shortcut table lock poisoned")
            .unregister(id)
    }

    /// Number of live shortcut registrations.
    pub fn shortcut_count(&self) -> usize {
        self.shared
            .shortcuts
            .lock()
            .expect("shortcut table lock poisoned")
            .len()
    }

    // ── Subscriptions ────────────────────────────────────────────────────────

    /// Subscribes `callback` to events of `kind`.  Callbacks run on the
    /// delivery worker, never on the producer thread.
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&EngineEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.shared
            .subscribers
            .lock()
            .expect("subscriber registry lock poisoned")
            .subscribe(kind, callback)
    }

    /// Removes a subscription.  Returns `false` for unknown ids.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared
            .subscribers
            .lock()
            .expect("subscriber registry lock poisoned")
            .unsubscribe(id)
    }
}

/// Pump loop: consumes the raw-event channel on its dedicated thread and
/// feeds the engine.  Exits when the source closes the channel or the
/// engine is dropped.
fn pump_loop(
    weak: Weak<EngineShared>,
    source: Arc<dyn InputSource>,
    rx: std::sync::mpsc::Receiver<RawKeyEvent>,
) {
    for event in rx.iter() {
        let Some(shared) = weak.upgrade() else {
            break;
        };
        let engine = KeyboardEngine { shared };
        let now = Instant::now();

        // A probe failure is non-fatal: the engine keeps the previous
        // lock states for this notification.
        let locks = match source.lock_states() {
            Ok(locks) => Some(locks),
            Err(err) => {
                warn!(%err, "lock-key probe failed; keeping previous states");
                None
            }
        };

        match event {
            RawKeyEvent::KeyDown {
                key,
                modifiers,
                is_repeat,
            } => engine.notify_key_down(key, modifiers, is_repeat, locks, now),
            RawKeyEvent::KeyUp { key, modifiers } => {
                engine.notify_key_up(key, modifiers, locks, now)
            }
            RawKeyEvent::Text { text, modifiers } => engine.notify_text(&text, modifiers),
        }
    }
}
