//! Drives the engine with a scripted mock source and prints what a
//! Turtlepad script would observe.
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run --package turtlepad-input --example typing_demo
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use turtlepad_input::source::mock::MockInputSource;
use turtlepad_input::{EngineConfig, EngineEvent, EventKind, KeyboardEngine};
use turtlepad_keys::{KeyCode, ModifierFlags};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let engine = KeyboardEngine::new(EngineConfig::default())?;
    let source = MockInputSource::new();
    engine.bind(Arc::new(source.clone())).await?;

    engine.subscribe(EventKind::KeyDown, |event| {
        if let EngineEvent::KeyDown { key, is_repeat, .. } = event {
            println!("callback: key down {} (repeat: {is_repeat})", key.name());
        }
    });
    let run_shortcut = engine.register_shortcut("Ctrl+R".parse()?)?;
    engine.subscribe(EventKind::ShortcutFired, move |event| {
        if let EngineEvent::ShortcutFired { id } = event {
            if *id == run_shortcut {
                println!("callback: run shortcut fired!");
            }
        }
    });

    // A child holds Right to move the turtle, types a name, then hits
    // Ctrl+R to run their program.
    source.press(KeyCode::ArrowRight, ModifierFlags::NONE);
    tokio::time::sleep(Duration::from_millis(20)).await;
    println!("polling: turtle moves right? {}", engine.is_down(KeyCode::ArrowRight));
    source.release(KeyCode::ArrowRight, ModifierFlags::NONE);

    source.type_text("my turtle");
    tokio::time::sleep(Duration::from_millis(20)).await;
    println!("typed so far: {:?}", engine.read_text());

    let ctrl = ModifierFlags(ModifierFlags::LEFT_CTRL);
    source.press(KeyCode::ControlLeft, ctrl);
    source.press(KeyCode::KeyR, ctrl);
    source.release(KeyCode::KeyR, ctrl);
    source.release(KeyCode::ControlLeft, ModifierFlags::NONE);

    // current_key_press empties once the pulse window (80 ms) passes.
    tokio::time::sleep(Duration::from_millis(20)).await;
    println!("current key press: {:?}", engine.current_key_press().map(|k| k.name()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    println!("after the pulse window: {:?}", engine.current_key_press().map(|k| k.name()));
    println!("last key press ever: {:?}", engine.last_key_press().map(|k| k.name()));

    engine.shutdown().await;
    Ok(())
}
