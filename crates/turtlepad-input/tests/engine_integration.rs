//! End-to-end tests driving the engine through a mock input source, the
//! way a real host binding would.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use turtlepad_input::source::mock::MockInputSource;
use turtlepad_input::{EngineConfig, EngineEvent, EventKind, KeyboardEngine};
use turtlepad_keys::{KeyCode, LockStates, ModifierFlags};

/// Polls `condition` until it holds or two seconds pass.  The pump runs on
/// its own thread, so tests wait for it instead of assuming immediacy.
fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

async fn bound_engine() -> (KeyboardEngine, MockInputSource) {
    let engine = KeyboardEngine::new(EngineConfig::default()).unwrap();
    let source = MockInputSource::new();
    engine.bind(Arc::new(source.clone())).await.unwrap();
    (engine, source)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bound_source_drives_polling_surface() {
    // Arrange
    let (engine, source) = bound_engine().await;

    // Act / Assert – a press shows up on the polling surface.
    source.press(KeyCode::ArrowRight, ModifierFlags::NONE);
    assert!(wait_until(|| engine.is_down(KeyCode::ArrowRight)));
    assert!(engine.was_pressed(KeyCode::ArrowRight));

    // Act / Assert – the matching release does too.
    source.release(KeyCode::ArrowRight, ModifierFlags::NONE);
    assert!(wait_until(|| engine.is_up(KeyCode::ArrowRight)));
    assert!(engine.was_released(KeyCode::ArrowRight));

    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_typed_text_reaches_buffer() {
    // Arrange
    let (engine, source) = bound_engine().await;

    // Act
    source.type_text("hi");
    source.type_text("!");
    assert!(wait_until(|| engine.last_text_input().as_deref() == Some("!")));

    // Assert – reading drains the buffer.
    assert_eq!(engine.read_text(), "hi!");
    assert_eq!(engine.read_text(), "");

    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_subscribers_see_events_in_fifo_order() {
    // Arrange
    let (engine, source) = bound_engine().await;

    let seen: Arc<Mutex<Vec<KeyCode>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        engine.subscribe(EventKind::KeyDown, move |event| {
            if let EngineEvent::KeyDown { key, .. } = event {
                seen.lock().unwrap().push(*key);
            }
        });
    }

    // Act
    source.press(KeyCode::KeyA, ModifierFlags::NONE);
    source.press(KeyCode::KeyB, ModifierFlags::NONE);
    source.press(KeyCode::KeyC, ModifierFlags::NONE);

    // Assert
    assert!(wait_until(|| seen.lock().unwrap().len() == 3));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![KeyCode::KeyA, KeyCode::KeyB, KeyCode::KeyC]
    );

    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_panicking_subscriber_does_not_poison_delivery() {
    // Arrange
    let (engine, source) = bound_engine().await;

    engine.subscribe(EventKind::KeyDown, |_| panic!("bad subscriber"));
    let count: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
    {
        let count = Arc::clone(&count);
        engine.subscribe(EventKind::KeyDown, move |_| {
            *count.lock().unwrap() += 1;
        });
    }

    // Act
    source.press(KeyCode::KeyA, ModifierFlags::NONE);
    source.press(KeyCode::KeyB, ModifierFlags::NONE);

    // Assert – the panic is contained per invocation; the later subscriber
    // and the later event both still go through.
    assert!(wait_until(|| *count.lock().unwrap() == 2));

    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rebind_resets_state_and_registrations() {
    // Arrange
    let (engine, source) = bound_engine().await;

    engine.register_shortcut("Ctrl+S".parse().unwrap()).unwrap();
    source.press(KeyCode::KeyA, ModifierFlags::NONE);
    assert!(wait_until(|| engine.is_down(KeyCode::KeyA)));
    assert_eq!(engine.shortcut_count(), 1);

    // Act
    let replacement = MockInputSource::new();
    engine.bind(Arc::new(replacement.clone())).await.unwrap();

    // Assert – state and registrations are gone.
    assert!(!engine.is_down(KeyCode::KeyA));
    assert_eq!(engine.shortcut_count(), 0);
    assert_eq!(engine.last_key_press(), None);

    // Assert – the fresh binding works.
    replacement.press(KeyCode::KeyB, ModifierFlags::NONE);
    assert!(wait_until(|| engine.is_down(KeyCode::KeyB)));

    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_stale_callbacks_after_rebind() {
    // Arrange
    let (engine, source) = bound_engine().await;

    let seen: Arc<Mutex<Vec<KeyCode>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        engine.subscribe(EventKind::KeyDown, move |event| {
            if let EngineEvent::KeyDown { key, .. } = event {
                seen.lock().unwrap().push(*key);
            }
        });
    }

    source.press(KeyCode::KeyA, ModifierFlags::NONE);
    assert!(wait_until(|| !seen.lock().unwrap().is_empty()));

    // Act – rebinding stops and drains the old binding before the new one
    // starts, so nothing from the old source can arrive afterwards.
    let replacement = MockInputSource::new();
    engine.bind(Arc::new(replacement.clone())).await.unwrap();
    replacement.press(KeyCode::KeyB, ModifierFlags::NONE);

    // Assert
    assert!(wait_until(|| seen.lock().unwrap().len() == 2));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(*seen.lock().unwrap(), vec![KeyCode::KeyA, KeyCode::KeyB]);

    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_lock_probe_keeps_previous_states() {
    // Arrange
    let (engine, source) = bound_engine().await;

    source.set_lock_states(LockStates {
        caps_lock: true,
        num_lock: false,
        scroll_lock: false,
    });
    source.press(KeyCode::KeyA, ModifierFlags::NONE);
    assert!(wait_until(|| engine.current_state().locks.caps_lock));

    // Act – the probe starts failing.
    source.set_lock_probe_failing(true);
    source.release(KeyCode::KeyA, ModifierFlags::NONE);
    source.press(KeyCode::KeyB, ModifierFlags::NONE);

    // Assert – notifications still apply and the last known lock states
    // stick.
    assert!(wait_until(|| engine.is_down(KeyCode::KeyB)));
    assert!(engine.current_state().locks.caps_lock);

    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shortcut_fires_from_bound_source() {
    // Arrange
    let (engine, source) = bound_engine().await;
    let id = engine.register_shortcut("Ctrl+R".parse().unwrap()).unwrap();

    let fired: Arc<Mutex<Vec<EngineEvent>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let fired = Arc::clone(&fired);
        engine.subscribe(EventKind::ShortcutFired, move |event| {
            fired.lock().unwrap().push(event.clone());
        });
    }

    // Act
    let ctrl = ModifierFlags(ModifierFlags::LEFT_CTRL);
    source.press(KeyCode::ControlLeft, ctrl);
    source.press(KeyCode::KeyR, ctrl);

    // Assert
    assert!(wait_until(|| fired.lock().unwrap().len() == 1));
    assert!(matches!(
        fired.lock().unwrap()[0],
        EngineEvent::ShortcutFired { id: got } if got == id
    ));

    // Assert – held chord never re-fires; release and re-press does.
    source.release(KeyCode::KeyR, ctrl);
    source.press(KeyCode::KeyR, ctrl);
    assert!(wait_until(|| fired.lock().unwrap().len() == 2));

    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_polling_never_observes_torn_snapshot() {
    // Arrange
    let engine = KeyboardEngine::new(EngineConfig::default()).unwrap();
    let ctrl = ModifierFlags(ModifierFlags::LEFT_CTRL);
    let done = Arc::new(std::sync::atomic::AtomicBool::new(false));

    // Act – hammer notifications from one thread while readers poll.
    let producer = {
        let engine = engine.clone();
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            for _ in 0..10_000 {
                let now = Instant::now();
                engine.notify_key_down(KeyCode::ControlLeft, ctrl, false, None, now);
                engine.notify_key_down(KeyCode::KeyA, ctrl, false, None, now);
                engine.notify_key_up(KeyCode::KeyA, ctrl, None, now);
                engine.notify_key_up(KeyCode::ControlLeft, ModifierFlags::NONE, None, now);
            }
            done.store(true, std::sync::atomic::Ordering::Release);
        })
    };

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let engine = engine.clone();
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                while !done.load(std::sync::atomic::Ordering::Acquire) {
                    // The snapshot is swapped wholesale, so the ctrl flag
                    // and the held set must always agree.
                    let snapshot = engine.current_state();
                    assert_eq!(
                        snapshot.modifiers.ctrl(),
                        snapshot.is_held(KeyCode::ControlLeft)
                    );
                    let _ = engine.was_pressed(KeyCode::KeyA);
                }
            })
        })
        .collect();

    producer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    // Assert – the full run finished without deadlock; final state is
    // all-up.
    assert!(engine.is_up(KeyCode::KeyA));
    engine.shutdown().await;
}
