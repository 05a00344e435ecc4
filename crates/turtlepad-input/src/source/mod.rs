//! Input source adapters: where raw platform notifications come from.
//!
//! The engine does not talk to the OS.  A host (the Turtlepad window, a
//! test harness) implements [`InputSource`]: it translates whatever the
//! platform delivers — window-system key messages, toolkit events — into
//! the normalized [`RawKeyEvent`] vocabulary and pushes them into a
//! channel.  The engine consumes that channel on a dedicated pump thread,
//! so no engine work ever runs on the host's notification thread beyond a
//! channel send.
//!
//! # Contract
//!
//! - Events must be delivered in notification order.
//! - `is_repeat` is `true` only for OS auto-repeat of an already-held key.
//! - [`InputSource::lock_states`] is a synchronous probe callable at
//!   notification time; failures are non-fatal (the engine keeps the
//!   previous lock states).
//! - `stop()` must close the channel (drop the sender) so the pump thread
//!   can exit.

use std::sync::mpsc;

use thiserror::Error;
use turtlepad_keys::{KeyCode, LockStates, ModifierFlags};

pub mod mock;

/// A normalized raw input notification produced by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawKeyEvent {
    /// A key went down.
    KeyDown {
        key: KeyCode,
        modifiers: ModifierFlags,
        /// `true` for OS auto-repeat of a held key.
        is_repeat: bool,
    },
    /// A key was released.
    KeyUp {
        key: KeyCode,
        modifiers: ModifierFlags,
    },
    /// Composed text from the platform's text-input path.
    Text {
        text: String,
        modifiers: ModifierFlags,
    },
}

/// Error type for input source operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to attach to the host input stream: {0}")]
    AttachFailed(String),
    #[error("input source has already been stopped")]
    AlreadyStopped,
    #[error("lock-key state unavailable: {0}")]
    LockStateUnavailable(String),
}

/// Trait abstracting raw input event production.
///
/// Production implementations wrap the host toolkit; tests use
/// [`mock::MockInputSource`].
pub trait InputSource: Send + Sync {
    /// Starts the source and returns the receiver for its events.
    fn start(&self) -> Result<mpsc::Receiver<RawKeyEvent>, CaptureError>;

    /// Stops the source and releases its resources.  Must close the event
    /// channel.
    fn stop(&self);

    /// Synchronously probes the platform's lock-key states.
    fn lock_states(&self) -> Result<LockStates, CaptureError>;
}
