//! # turtlepad-input
//!
//! The keyboard input engine for Turtlepad, the educational coding
//! environment for children.
//!
//! Children's scripts interact with the keyboard in three different ways at
//! once, and this crate reconciles all three against a single, constantly
//! mutating set of held keys:
//!
//! - **Continuous polling** – `IsDown`-style queries from the script thread
//!   in a tight loop ("move the turtle while Right is held").
//! - **Edge consumption** – `WasPressed`-style single-shot flags that are
//!   cleared the moment they are read ("jump once per Space press").
//! - **Asynchronous events** – user callbacks for key-down/key-up/text
//!   input/shortcut-fired, delivered off the producer thread.
//!
//! # How it fits together
//!
//! Raw key notifications arrive on the host UI thread.  An adapter
//! implementing [`source::InputSource`] normalizes them and hands them to
//! the [`KeyboardEngine`], which updates its state store, runs the shortcut
//! matcher, and queues callback invocations for a dedicated consumer task:
//!
//! ```text
//! UI thread                engine                        consumer task
//! ─────────                ──────                        ─────────────
//! InputSource ──► KeyStateStore (down-set, edges,
//!                 repeat counts, text buffer, snapshot)
//!                      │
//!                      ▼
//!                 ShortcutTable (chords, sequences) ──► delivery queue ──► user
//!                                                                         callbacks
//!         script thread:  is_down / was_pressed / read_text / current_state
//! ```
//!
//! Two independent locks guard the state store and the shortcut table, and
//! they are never held at the same time: the matcher works on a *copy* of
//! the snapshot taken under the state lock.  No user callback ever runs
//! under either lock, so a slow or panicking subscriber cannot stall the UI
//! thread or a polling script.
//!
//! # Quick start
//!
//! ```rust
//! use std::time::Instant;
//! use turtlepad_input::{EngineConfig, KeyboardEngine};
//! use turtlepad_keys::{KeyCode, ModifierFlags};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let engine = KeyboardEngine::new(EngineConfig::default()).unwrap();
//!
//! engine.notify_key_down(
//!     KeyCode::KeyR,
//!     ModifierFlags::NONE,
//!     false,
//!     None,
//!     Instant::now(),
//! );
//! assert!(engine.is_down(KeyCode::KeyR));
//! assert!(engine.was_pressed(KeyCode::KeyR));
//! assert!(!engine.was_pressed(KeyCode::KeyR)); // edges are single-shot
//! # engine.shutdown().await;
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod source;

pub use config::{ConfigError, EngineConfig, InputTuning};
pub use engine::delivery::{EngineEvent, EventKind, SubscriptionId};
pub use engine::shortcuts::{ShortcutError, ShortcutId};
pub use engine::state::KeyboardSnapshot;
pub use engine::{EngineError, KeyboardEngine};
pub use source::{CaptureError, InputSource, RawKeyEvent};
