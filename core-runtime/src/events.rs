//! # Event Bus
//!
//! In-process publish/subscribe router for cancellable, typed events.
//!
//! ## Overview
//!
//! Interception handlers turn host activity (a native unary call, a broadcast
//! delivered to one of the host's receivers) into an [`Event`] and
//! [`post`](EventBus::post) it. Feature code subscribes by event type and may
//! mutate the event or cancel it. Once every subscriber has run, the publisher
//! reads the event back to decide what the host should do next.
//!
//! ```text
//!  interception handler          EventBus                 subscribers
//!  ────────────────────   post   ────────   in order   ───────────────
//!  UnaryCallEvent ────────────────> │ ──────────────────> #1 (observe)
//!                                   │ ──────────────────> #2 (cancel)
//!                                   │ ──────────────────> #3 (still runs)
//!  <──────── same event, canceled ──┘
//! ```
//!
//! ## Contract
//!
//! - Subscribers of one event type run synchronously, in registration order.
//! - A canceled event still reaches every later subscriber; cancellation only
//!   tells the publisher to suppress its own default behavior.
//! - Posting to a type with no subscribers returns the event untouched.
//! - Subscriptions live for the rest of the process.
//! - Events posted from different threads may be dispatched concurrently;
//!   a single event is never dispatched concurrently with itself.
//!
//! ## Usage
//!
//! ```rust
//! use bytes::Bytes;
//! use core_runtime::events::{Event, EventBus, UnaryCallEvent};
//!
//! let bus = EventBus::new();
//! bus.subscribe(|event: &mut UnaryCallEvent| {
//!     if event.uri.ends_with("/Track") {
//!         event.cancel();
//!     }
//! });
//!
//! let event = bus.post(UnaryCallEvent::new("/messaging/Track", Bytes::new()));
//! assert!(event.is_canceled());
//! ```

use bytes::Bytes;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Discriminant of the event types known to the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Intercepted native unary call
    UnaryCall,
    /// Broadcast delivered to a host receiver
    BroadcastReceive,
    /// A foreground entry point finished creating
    ForegroundCreated,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::UnaryCall => "unary_call",
            EventKind::BroadcastReceive => "broadcast_receive",
            EventKind::ForegroundCreated => "foreground_created",
        }
    }
}

/// A cancellable event.
pub trait Event: Any + Send {
    fn kind(&self) -> EventKind;

    fn is_canceled(&self) -> bool;

    fn set_canceled(&mut self, canceled: bool);

    fn cancel(&mut self) {
        self.set_canceled(true);
    }
}

/// An intercepted native unary call.
///
/// Subscribers may replace `buffer`. When the event comes back canceled the
/// real call is skipped and `buffer` is returned to the host instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryCallEvent {
    pub uri: String,
    pub buffer: Bytes,
    canceled: bool,
}

impl UnaryCallEvent {
    pub fn new(uri: impl Into<String>, buffer: Bytes) -> Self {
        Self {
            uri: uri.into(),
            buffer,
            canceled: false,
        }
    }
}

impl Event for UnaryCallEvent {
    fn kind(&self) -> EventKind {
        EventKind::UnaryCall
    }

    fn is_canceled(&self) -> bool {
        self.canceled
    }

    fn set_canceled(&mut self, canceled: bool) {
        self.canceled = canceled;
    }
}

/// A broadcast delivered to one of the host's receivers.
///
/// Canceling suppresses the host's own handling of the broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastReceiveEvent {
    pub action: String,
    pub extras: HashMap<String, String>,
    canceled: bool,
}

impl BroadcastReceiveEvent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            extras: HashMap::new(),
            canceled: false,
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }
}

impl Event for BroadcastReceiveEvent {
    fn kind(&self) -> EventKind {
        EventKind::BroadcastReceive
    }

    fn is_canceled(&self) -> bool {
        self.canceled
    }

    fn set_canceled(&mut self, canceled: bool) {
        self.canceled = canceled;
    }
}

/// A foreground entry point finished creating and features were notified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundCreatedEvent {
    pub entry_id: u64,
    canceled: bool,
}

impl ForegroundCreatedEvent {
    pub fn new(entry_id: u64) -> Self {
        Self {
            entry_id,
            canceled: false,
        }
    }
}

impl Event for ForegroundCreatedEvent {
    fn kind(&self) -> EventKind {
        EventKind::ForegroundCreated
    }

    fn is_canceled(&self) -> bool {
        self.canceled
    }

    fn set_canceled(&mut self, canceled: bool) {
        self.canceled = canceled;
    }
}

type ErasedHandler = Arc<dyn Fn(&mut dyn Any) + Send + Sync>;

/// Typed, cancellable publish/subscribe router.
///
/// Cheap to clone; clones share subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<HashMap<TypeId, Vec<ErasedHandler>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events of type `E`.
    pub fn subscribe<E, F>(&self, handler: F)
    where
        E: Event,
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        let erased: ErasedHandler = Arc::new(move |event: &mut dyn Any| {
            if let Some(event) = event.downcast_mut::<E>() {
                handler(event);
            }
        });
        self.subscribers
            .write()
            .entry(TypeId::of::<E>())
            .or_default()
            .push(erased);
    }

    /// Runs every subscriber of `E` in registration order and hands the
    /// event back.
    pub fn post<E: Event>(&self, mut event: E) -> E {
        // Snapshot so handlers may subscribe while we dispatch.
        let handlers = self
            .subscribers
            .read()
            .get(&TypeId::of::<E>())
            .cloned()
            .unwrap_or_default();

        for handler in &handlers {
            handler(&mut event);
        }

        trace!(
            kind = event.kind().as_str(),
            subscribers = handlers.len(),
            canceled = event.is_canceled(),
            "Event posted"
        );
        event
    }

    /// Number of subscribers registered for `E`.
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.subscribers
            .read()
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total: usize = self.subscribers.read().values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("subscriber_count", &total)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_post_without_subscribers_returns_event_untouched() {
        let bus = EventBus::new();
        let event = UnaryCallEvent::new("/a", Bytes::from_static(b"req"));
        let posted = bus.post(event.clone());
        assert_eq!(posted, event);
        assert!(!posted.is_canceled());
    }

    #[test]
    fn test_subscribers_run_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = Arc::clone(&order);
            bus.subscribe(move |_: &mut BroadcastReceiveEvent| order.lock().push(i));
        }

        bus.post(BroadcastReceiveEvent::new("x"));
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_cancel_by_second_subscriber_still_runs_third() {
        let bus = EventBus::new();
        let third_saw_canceled = Arc::new(Mutex::new(None));

        bus.subscribe(|_: &mut UnaryCallEvent| {});
        bus.subscribe(|event: &mut UnaryCallEvent| event.cancel());
        let seen = Arc::clone(&third_saw_canceled);
        bus.subscribe(move |event: &mut UnaryCallEvent| {
            *seen.lock() = Some(event.is_canceled());
        });

        let posted = bus.post(UnaryCallEvent::new("/b", Bytes::new()));
        assert!(posted.is_canceled());
        assert_eq!(*third_saw_canceled.lock(), Some(true));
    }

    #[test]
    fn test_subscriber_can_replace_buffer() {
        let bus = EventBus::new();
        bus.subscribe(|event: &mut UnaryCallEvent| {
            event.buffer = Bytes::from_static(b"patched");
        });

        let posted = bus.post(UnaryCallEvent::new("/c", Bytes::from_static(b"orig")));
        assert_eq!(posted.buffer, Bytes::from_static(b"patched"));
        assert!(!posted.is_canceled());
    }

    #[test]
    fn test_events_are_routed_by_type() {
        let bus = EventBus::new();
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        bus.subscribe(move |_: &mut BroadcastReceiveEvent| *counter.lock() += 1);

        bus.post(UnaryCallEvent::new("/d", Bytes::new()));
        assert_eq!(*hits.lock(), 0);
        bus.post(BroadcastReceiveEvent::new("action"));
        assert_eq!(*hits.lock(), 1);

        assert_eq!(bus.subscriber_count::<BroadcastReceiveEvent>(), 1);
        assert_eq!(bus.subscriber_count::<UnaryCallEvent>(), 0);
    }

    #[test]
    fn test_subscribe_during_dispatch_does_not_deadlock() {
        let bus = EventBus::new();
        let inner = bus.clone();
        bus.subscribe(move |_: &mut ForegroundCreatedEvent| {
            inner.subscribe(|_: &mut ForegroundCreatedEvent| {});
        });

        bus.post(ForegroundCreatedEvent::new(1));
        assert_eq!(bus.subscriber_count::<ForegroundCreatedEvent>(), 2);
    }

    #[test]
    fn test_concurrent_posts_from_threads() {
        let bus = EventBus::new();
        let hits = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&hits);
        bus.subscribe(move |_: &mut UnaryCallEvent| *counter.lock() += 1);

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let bus = bus.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        bus.post(UnaryCallEvent::new("/e", Bytes::new()));
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }
        assert_eq!(*hits.lock(), 100);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(
            BroadcastReceiveEvent::new("a").kind().as_str(),
            "broadcast_receive"
        );
    }
}
