//! Mock input source for tests and examples.
//!
//! Allows synthetic [`RawKeyEvent`]s to be injected without a host window
//! or OS hooks, and lets tests script the lock-key probe (including its
//! failure mode).

use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};

use turtlepad_keys::{KeyCode, LockStates, ModifierFlags};

use super::{CaptureError, InputSource, RawKeyEvent};

/// A mock implementation of [`InputSource`] driven by test code.
#[derive(Clone)]
pub struct MockInputSource {
    sender: Arc<Mutex<Option<Sender<RawKeyEvent>>>>,
    locks: Arc<Mutex<LockStates>>,
    fail_lock_probe: Arc<Mutex<bool>>,
}

impl MockInputSource {
    /// Creates a new mock input source.
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
            locks: Arc::new(Mutex::new(LockStates::default())),
            fail_lock_probe: Arc::new(Mutex::new(false)),
        }
    }

    /// Injects a synthetic event, as if the host had delivered it.
    ///
    /// Panics if `start()` has not been called or `stop()` already has;
    /// mis-sequenced test setup should fail loudly.
    pub fn inject(&self, event: RawKeyEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        match guard.as_ref() {
            Some(sender) => sender.send(event).expect("pump receiver dropped"),
            None => panic!("MockInputSource::inject called before start()"),
        }
    }

    /// Convenience: injects a non-repeat key-down.
    pub fn press(&self, key: KeyCode, modifiers: ModifierFlags) {
        self.inject(RawKeyEvent::KeyDown {
            key,
            modifiers,
            is_repeat: false,
        });
    }

    /// Convenience: injects a key-up.
    pub fn release(&self, key: KeyCode, modifiers: ModifierFlags) {
        self.inject(RawKeyEvent::KeyUp { key, modifiers });
    }

    /// Convenience: injects composed text.
    pub fn type_text(&self, text: &str) {
        self.inject(RawKeyEvent::Text {
            text: text.to_string(),
            modifiers: ModifierFlags::NONE,
        });
    }

    /// Sets the lock states the probe reports.
    pub fn set_lock_states(&self, locks: LockStates) {
        *self.locks.lock().expect("lock poisoned") = locks;
    }

    /// Makes subsequent probes fail, to exercise the non-fatal fallback.
    pub fn set_lock_probe_failing(&self, failing: bool) {
        *self.fail_lock_probe.lock().expect("lock poisoned") = failing;
    }
}

impl Default for MockInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<mpsc::Receiver<RawKeyEvent>, CaptureError> {
        let (tx, rx) = mpsc::channel();
        *self.sender.lock().expect("lock poisoned") = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Dropping the sender closes the channel; the pump thread exits.
        *self.sender.lock().expect("lock poisoned") = None;
    }

    fn lock_states(&self) -> Result<LockStates, CaptureError> {
        if *self.fail_lock_probe.lock().expect("lock poisoned") {
            return Err(CaptureError::LockStateUnavailable(
                "mock probe failure".to_string(),
            ));
        }
        Ok(*self.locks.lock().expect("lock poisoned"))
    }
}
