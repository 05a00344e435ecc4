//! Event delivery: subscriber registry plus the single-consumer worker.
//!
//! User callbacks must never run on the thread that produced the raw
//! notification — that thread usually drives the host UI loop, and a slow or
//! crashing callback there would freeze the whole environment.  Producers
//! therefore enqueue [`EngineEvent`]s onto an unbounded channel and return
//! immediately; one dedicated consumer task drains the channel in FIFO order
//! and invokes the matching callbacks, catching and discarding any panic a
//! single callback raises before moving on to the next.
//!
//! Shutdown raises a stopping flag and pushes a sentinel through the same
//! channel: everything not yet executed is discarded, so callbacks cannot
//! fire after the engine rebinds or shuts down.  Callers that need the
//! opposite guarantee — everything published so far has been delivered —
//! use [`DeliveryWorker::flush`] instead.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{trace, warn};
use turtlepad_keys::{KeyCode, ModifierFlags};

use super::shortcuts::ShortcutId;

/// A notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A key went down (or auto-repeated, flagged by `is_repeat`).
    KeyDown {
        key: KeyCode,
        modifiers: ModifierFlags,
        is_repeat: bool,
    },
    /// A key was released.
    KeyUp {
        key: KeyCode,
        modifiers: ModifierFlags,
    },
    /// Composed text arrived.
    TextInput {
        text: String,
        modifiers: ModifierFlags,
    },
    /// A registered shortcut completed.
    ShortcutFired { id: ShortcutId },
}

/// Subscription filter, one per event variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    KeyDown,
    KeyUp,
    TextInput,
    ShortcutFired,
}

impl EngineEvent {
    /// The [`EventKind`] this event matches.
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::KeyDown { .. } => EventKind::KeyDown,
            EngineEvent::KeyUp { .. } => EventKind::KeyUp,
            EngineEvent::TextInput { .. } => EventKind::TextInput,
            EngineEvent::ShortcutFired { .. } => EventKind::ShortcutFired,
        }
    }
}

/// Token returned by `subscribe`, used to remove the callback again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

type Callback = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

/// Explicit observer list: callbacks are identified by monotonic ids so
/// removal never depends on function-pointer equality.
pub(crate) struct Subscribers {
    entries: Vec<(SubscriptionId, EventKind, Callback)>,
    next_id: u64,
}

impl Subscribers {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    pub(crate) fn subscribe(
        &mut self,
        kind: EventKind,
        callback: impl Fn(&EngineEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, kind, Arc::new(callback)));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(sid, _, _)| *sid != id);
        self.entries.len() != before
    }

    /// Clones out the callbacks matching `kind`, in subscription order.
    ///
    /// Cloning lets the consumer invoke them without holding the registry
    /// lock, so a callback may freely subscribe/unsubscribe.
    fn matching(&self, kind: EventKind) -> Vec<Callback> {
        self.entries
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, cb)| Arc::clone(cb))
            .collect()
    }
}

enum DeliveryItem {
    Event(EngineEvent),
    /// Acknowledged once everything queued ahead of it has been delivered.
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Handle to the single-consumer delivery worker.
pub(crate) struct DeliveryWorker {
    tx: mpsc::UnboundedSender<DeliveryItem>,
    task: JoinHandle<()>,
    stopping: Arc<AtomicBool>,
}

impl DeliveryWorker {
    /// Spawns the consumer task on `handle`.
    pub(crate) fn spawn(handle: &Handle, subscribers: Arc<Mutex<Subscribers>>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let stopping = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stopping);
        let task = handle.spawn(async move {
            let mut dropped = 0usize;
            while let Some(item) = rx.recv().await {
                match item {
                    DeliveryItem::Event(event) => {
                        // Once shutdown begins, queued events are discarded
                        // instead of executed.
                        if stop_flag.load(Ordering::Acquire) {
                            dropped += 1;
                            continue;
                        }
                        let callbacks = subscribers
                            .lock()
                            .expect("subscriber registry lock poisoned")
                            .matching(event.kind());
                        trace!(kind = ?event.kind(), fanout = callbacks.len(), "delivering event");
                        for callback in callbacks {
                            // One broken subscriber must not block the rest.
                            if panic::catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
                                warn!(kind = ?event.kind(), "event subscriber panicked; discarded");
                            }
                        }
                    }
                    DeliveryItem::Flush(ack) => {
                        let _ = ack.send(());
                    }
                    DeliveryItem::Shutdown => {
                        while let Ok(item) = rx.try_recv() {
                            match item {
                                DeliveryItem::Event(_) => dropped += 1,
                                DeliveryItem::Flush(ack) => {
                                    let _ = ack.send(());
                                }
                                DeliveryItem::Shutdown => {}
                            }
                        }
                        break;
                    }
                }
            }
            if dropped > 0 {
                trace!(dropped, "delivery queue discarded at shutdown");
            }
        });
        Self { tx, task, stopping }
    }

    /// Enqueues `event`; never blocks.  A send after shutdown is a no-op.
    pub(crate) fn publish(&self, event: EngineEvent) {
        let _ = self.tx.send(DeliveryItem::Event(event));
    }

    /// Requests a flush acknowledgement without awaiting it, so callers can
    /// release their locks before waiting.
    pub(crate) fn flush_request(&self) -> Option<oneshot::Receiver<()>> {
        let (ack, pending) = oneshot::channel();
        self.tx.send(DeliveryItem::Flush(ack)).ok().map(|_| pending)
    }

    /// Waits until every event published before this call has been
    /// delivered (or discarded by a concurrent shutdown).
    pub(crate) async fn flush(&self) {
        if let Some(pending) = self.flush_request() {
            let _ = pending.await;
        }
    }

    /// Stops the consumer, discarding anything still queued.  The flag and
    /// sentinel go out before the returned future is polled, so no event
    /// published after this call can execute; awaiting waits for the
    /// consumer to exit.
    pub(crate) fn shutdown(self) -> impl std::future::Future<Output = ()> {
        self.stopping.store(true, Ordering::Release);
        let _ = self.tx.send(DeliveryItem::Shutdown);
        async move {
            let _ = self.task.await;
        }
    }

    /// Hard-stops the consumer without waiting (engine drop path).
    pub(crate) fn abort(&self) {
        self.stopping.store(true, Ordering::Release);
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker_with_log() -> (DeliveryWorker, Arc<Mutex<Subscribers>>, Arc<Mutex<Vec<EngineEvent>>>) {
        let subscribers = Arc::new(Mutex::new(Subscribers::new()));
        let log: Arc<Mutex<Vec<EngineEvent>>> = Arc::new(Mutex::new(Vec::new()));

        for kind in [
            EventKind::KeyDown,
            EventKind::KeyUp,
            EventKind::TextInput,
            EventKind::ShortcutFired,
        ] {
            let log = Arc::clone(&log);
            subscribers
                .lock()
                .unwrap()
                .subscribe(kind, move |event| log.lock().unwrap().push(event.clone()));
        }

        let worker = DeliveryWorker::spawn(&Handle::current(), Arc::clone(&subscribers));
        (worker, subscribers, log)
    }

    fn key_down(key: KeyCode) -> EngineEvent {
        EngineEvent::KeyDown {
            key,
            modifiers: ModifierFlags::NONE,
            is_repeat: false,
        }
    }

    #[tokio::test]
    async fn test_events_delivered_in_fifo_order_across_kinds() {
        // Arrange
        let (worker, _subs, log) = worker_with_log();
        let events = vec![
            key_down(KeyCode::KeyA),
            EngineEvent::TextInput {
                text: "a".to_string(),
                modifiers: ModifierFlags::NONE,
            },
            EngineEvent::KeyUp {
                key: KeyCode::KeyA,
                modifiers: ModifierFlags::NONE,
            },
            EngineEvent::ShortcutFired { id: ShortcutId(1) },
        ];

        // Act
        for event in &events {
            worker.publish(event.clone());
        }
        worker.flush().await;

        // Assert
        assert_eq!(*log.lock().unwrap(), events);
        worker.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_discards_undelivered_backlog() {
        // Arrange – a gate subscriber parks the consumer so later events
        // are guaranteed to still be queued when shutdown begins.
        let subscribers = Arc::new(Mutex::new(Subscribers::new()));
        let log: Arc<Mutex<Vec<EngineEvent>>> = Arc::new(Mutex::new(Vec::new()));
        {
            let log = Arc::clone(&log);
            subscribers
                .lock()
                .unwrap()
                .subscribe(EventKind::KeyDown, move |event| {
                    log.lock().unwrap().push(event.clone())
                });
        }
        let (entered_tx, entered_rx) = std::sync::mpsc::channel::<()>();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let entered_tx = Mutex::new(entered_tx);
        let release_rx = Mutex::new(release_rx);
        subscribers
            .lock()
            .unwrap()
            .subscribe(EventKind::TextInput, move |_| {
                entered_tx.lock().unwrap().send(()).unwrap();
                release_rx.lock().unwrap().recv().unwrap();
            });
        let worker = DeliveryWorker::spawn(&Handle::current(), Arc::clone(&subscribers));

        worker.publish(EngineEvent::TextInput {
            text: "gate".to_string(),
            modifiers: ModifierFlags::NONE,
        });
        entered_rx.recv().unwrap();
        worker.publish(key_down(KeyCode::KeyB));
        worker.publish(key_down(KeyCode::KeyC));

        // Act – the stop flag and sentinel go out while the consumer is
        // still parked, then the gate opens.
        let finished = worker.shutdown();
        release_tx.send(()).unwrap();
        finished.await;

        // Assert – the queued events were discarded, not executed
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_subscriber_does_not_block_others() {
        // Arrange
        let subscribers = Arc::new(Mutex::new(Subscribers::new()));
        let log: Arc<Mutex<Vec<KeyCode>>> = Arc::new(Mutex::new(Vec::new()));
        subscribers
            .lock()
            .unwrap()
            .subscribe(EventKind::KeyDown, |_| panic!("broken subscriber"));
        {
            let log = Arc::clone(&log);
            subscribers.lock().unwrap().subscribe(EventKind::KeyDown, move |event| {
                if let EngineEvent::KeyDown { key, .. } = event {
                    log.lock().unwrap().push(*key);
                }
            });
        }
        let worker = DeliveryWorker::spawn(&Handle::current(), Arc::clone(&subscribers));

        // Act
        worker.publish(key_down(KeyCode::KeyA));
        worker.publish(key_down(KeyCode::KeyB));
        worker.flush().await;

        // Assert – the panic is contained per invocation
        assert_eq!(*log.lock().unwrap(), vec![KeyCode::KeyA, KeyCode::KeyB]);
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_kind_filter() {
        // Arrange
        let subscribers = Arc::new(Mutex::new(Subscribers::new()));
        let ups: Arc<Mutex<Vec<EngineEvent>>> = Arc::new(Mutex::new(Vec::new()));
        {
            let ups = Arc::clone(&ups);
            subscribers
                .lock()
                .unwrap()
                .subscribe(EventKind::KeyUp, move |e| ups.lock().unwrap().push(e.clone()));
        }
        let worker = DeliveryWorker::spawn(&Handle::current(), Arc::clone(&subscribers));

        // Act
        worker.publish(key_down(KeyCode::KeyA));
        worker.publish(EngineEvent::KeyUp {
            key: KeyCode::KeyA,
            modifiers: ModifierFlags::NONE,
        });
        worker.flush().await;

        // Assert
        let ups = ups.lock().unwrap();
        assert_eq!(ups.len(), 1);
        assert_eq!(ups[0].kind(), EventKind::KeyUp);
        drop(ups);
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        // Arrange
        let (worker, subscribers, log) = worker_with_log();
        worker.publish(key_down(KeyCode::KeyA));
        worker.flush().await;

        // Act
        let ids: Vec<SubscriptionId> = {
            let subs = subscribers.lock().unwrap();
            subs.entries.iter().map(|(id, _, _)| *id).collect()
        };
        for id in ids {
            assert!(subscribers.lock().unwrap().unsubscribe(id));
        }
        worker.publish(key_down(KeyCode::KeyB));
        worker.flush().await;

        // Assert – the first event arrived, the post-unsubscribe one did not
        assert_eq!(*log.lock().unwrap(), vec![key_down(KeyCode::KeyA)]);
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_subscribe_ids_are_unique() {
        // Arrange
        let mut subs = Subscribers::new();

        // Act
        let a = subs.subscribe(EventKind::KeyDown, |_| {});
        let b = subs.subscribe(EventKind::KeyDown, |_| {});

        // Assert
        assert_ne!(a, b);
        assert!(subs.unsubscribe(a));
        assert!(!subs.unsubscribe(a));
    }
}
